use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

/// Ingests every uploaded file. Each upload is written to a scratch directory
/// under its original name so the extension picks the loader.
pub async fn upload_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;

    let scratch = tempfile::tempdir().map_err(ApiError::internal)?;
    let mut reports = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field
            .file_name()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
        else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", file_name, e)))?;
        let path = scratch.path().join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(ApiError::internal)?;

        let report = state.chat.ingest(&path).await?;
        let _ = tokio::fs::remove_file(&path).await;
        reports.push(report);
    }

    if reports.is_empty() {
        return Err(ApiError::BadRequest("No files were uploaded".to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "documents": reports,
        "count": state.chat.document_count().await?,
    })))
}

pub async fn document_count(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(json!({ "count": state.chat.document_count().await? })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    use crate::llm::testing::ScriptedProvider;
    use crate::server::handlers::test_support::{authed, body_json};
    use crate::state::tests::test_state;

    const BOUNDARY: &str = "chatiris-test-boundary";

    async fn multipart(files: &[(&str, &str)]) -> Multipart {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{n}\"\r\nContent-Type: application/octet-stream\r\n\r\n{c}\r\n",
                b = BOUNDARY,
                n = name,
                c = content
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));

        let request = Request::builder()
            .method("POST")
            .uri("/api/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn uploads_are_ingested_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let upload = multipart(&[
            ("facts.txt", "Screening can prevent cancer."),
            ("guide.md", "# Prep\nFollow the diet sheet."),
        ])
        .await;
        let body = body_json(
            upload_documents(State(state.clone()), authed(), upload)
                .await
                .unwrap()
                .into_response(),
        )
        .await;

        assert_eq!(body["documents"][0]["source"], "facts.txt");
        assert_eq!(body["documents"][1]["inserted"], 1);
        assert_eq!(body["count"], 2);

        let count = body_json(
            document_count(State(state), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(count["count"], 2);
    }

    #[tokio::test]
    async fn pdf_upload_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let upload = multipart(&[("leaflet.pdf", "%PDF-1.4")]).await;
        let result = upload_documents(State(state), authed(), upload).await;

        assert!(matches!(result, Err(ApiError::UnsupportedDocument(_))));
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let upload = multipart(&[]).await;
        let result = upload_documents(State(state), authed(), upload).await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
