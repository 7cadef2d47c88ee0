use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;

    let llm_reachable = match state.llm.health_check().await {
        Ok(ok) => ok,
        Err(err) => {
            tracing::warn!("LLM health check failed: {}", err);
            false
        }
    };
    let documents = state.chat.document_count().await?;
    let rounds = state.chat.scores().await.len();
    let turns = state.chat.turns().await;

    Ok(Json(json!({
        "llm_provider": state.llm.name(),
        "llm_reachable": llm_reachable,
        "chat_model": state.settings.chat_agent.model,
        "score_model": state.settings.score_agent.model,
        "documents": documents,
        "score_rounds": rounds,
        "turns": turns,
        "beliefs": state.chat.beliefs().len(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::server::handlers::test_support::{authed, body_json};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn status_requires_key_and_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let denied = get_status(State(state.clone()), HeaderMap::new()).await;
        assert!(matches!(denied, Err(ApiError::Unauthorized)));

        let response = get_status(State(state), authed())
            .await
            .unwrap()
            .into_response();
        let body = body_json(response).await;

        assert_eq!(body["llm_provider"], "scripted");
        assert_eq!(body["llm_reachable"], true);
        assert_eq!(body["documents"], 0);
        assert_eq!(body["turns"], 0);
        assert_eq!(body["beliefs"], 14);
    }

    #[tokio::test]
    async fn health_needs_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let body = body_json(health(State(state)).await.into_response()).await;
        assert_eq!(body["status"], "ok");
    }
}
