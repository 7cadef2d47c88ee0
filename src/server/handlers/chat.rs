use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub message: String,
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(json!({ "messages": state.chat.messages().await })))
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let turn = state.chat.ask(&payload.message).await?;
    Ok(Json(turn))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    state.chat.reset().await?;
    Ok(Json(json!({
        "status": "success",
        "messages": state.chat.messages().await,
    })))
}

pub async fn list_faq(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(json!({ "faq": state.chat.faq() })))
}

pub async fn ask_faq(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let turn = state.chat.ask_faq(&key).await?;
    Ok(Json(turn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::ChatCompletion;
    use crate::pipeline::process::tests::scores;
    use crate::server::handlers::test_support::{authed, body_json};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn post_message_returns_reply_and_visible_history() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push(scores(r#"{"tendency_to_deny": 1}"#))
            .push(ChatCompletion::text("Screening finds problems early."));
        let state = test_state(&dir, provider).await;

        let response = post_message(
            State(state.clone()),
            authed(),
            Json(ChatPayload {
                message: "I feel fine, why bother?".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        let body = body_json(response).await;

        assert_eq!(body["reply"], "Screening finds problems early.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["scores"]["tendency_to_deny"], 1);

        let messages = body_json(
            get_messages(State(state), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(messages["messages"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_message_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let result = post_message(
            State(state),
            authed(),
            Json(ChatPayload {
                message: " ".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn faq_listing_and_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        let body = body_json(
            list_faq(State(state.clone()), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(body["faq"][1]["key"], "faq_procedure");

        let missing = ask_faq(State(state), authed(), Path("nope".to_string())).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn reset_returns_fresh_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push(ChatCompletion::default())
            .push(ChatCompletion::text("Hi!"));
        let state = test_state(&dir, provider).await;
        state.chat.ask("hello").await.unwrap();

        let body = body_json(
            reset(State(state), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;

        assert_eq!(body["status"], "success");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }
}
