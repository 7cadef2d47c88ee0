//! Health belief monitoring endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

pub async fn get_scores(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(json!({ "scores": state.chat.scores().await })))
}

pub async fn get_beliefs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(json!(state.chat.beliefs())))
}

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(state.chat.category_report().await))
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
    async fn scores_and_report_follow_the_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push(scores(r#"{"increase_cure": 1, "increase_lifespan": 1}"#))
            .push(ChatCompletion::text("Yes, early detection helps."));
        let state = test_state(&dir, provider).await;
        state.chat.ask("Can screening cure cancer early?").await.unwrap();

        let scores = body_json(
            get_scores(State(state.clone()), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(scores["scores"].as_array().unwrap().len(), 1);
        assert_eq!(scores["scores"][0]["increase_cure"], 1);
        assert_eq!(scores["scores"][0]["gain_control"], 0);

        let report = body_json(
            get_report(State(state.clone()), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(report["rounds"], 1);
        assert_eq!(report["categories"][0]["name"], "incentive");
        assert_eq!(report["categories"][0]["averages"][0], 0.5);

        let beliefs = body_json(
            get_beliefs(State(state), authed())
                .await
                .unwrap()
                .into_response(),
        )
        .await;
        assert_eq!(beliefs["beliefs"].as_array().unwrap().len(), 14);
        assert_eq!(beliefs["categories"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn admin_routes_require_the_session_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(ScriptedProvider::new())).await;

        assert!(matches!(
            get_scores(State(state.clone()), HeaderMap::new()).await,
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            get_report(State(state), HeaderMap::new()).await,
            Err(ApiError::Unauthorized)
        ));
    }
}
