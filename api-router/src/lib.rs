use api_state::ApiState;
use axum::{
    extract::FromRef,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use routes::{chat::chat, health::health_check};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub mod api_state;
pub mod context;
mod routes;

/// Router for the chat-facing API.
pub fn api_routes<S>(state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health_check))
        .layer(cors_layer(&state.config.allowed_origins))
}

/// CORS for the configured frontend origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
