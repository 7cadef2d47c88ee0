use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::defaults::default_local_origins;
use crate::core::security::API_KEY_HEADER;
use crate::server::handlers::{admin, agent, chat, config, documents, health};
use crate::state::AppState;

/// Creates the application router with CORS and request tracing.
///
/// Every `/api` route except `/health` checks the session key.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/chat", post(chat::post_message))
        .route("/api/chat/messages", get(chat::get_messages))
        .route("/api/chat/reset", post(chat::reset))
        .route("/api/faq", get(chat::list_faq))
        .route("/api/faq/:key", post(chat::ask_faq))
        .route("/api/documents", post(documents::upload_documents))
        .route("/api/documents/count", get(documents::document_count))
        .route(
            "/api/agent/system-prompt",
            get(agent::get_system_prompt).put(agent::put_system_prompt),
        )
        .route("/api/admin/scores", get(admin::get_scores))
        .route("/api/admin/beliefs", get(admin::get_beliefs))
        .route("/api/admin/report", get(admin::get_report))
        .route(
            "/api/config",
            get(config::get_config)
                .post(config::update_config)
                .patch(config::patch_config),
        )
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let configured = &state.settings.server.cors_allowed_origins;
    let origins = if configured.is_empty() {
        default_local_origins()
    } else {
        configured.clone()
    };

    let allowed = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
}
