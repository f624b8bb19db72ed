use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.service.cors_origins);

    Router::new()
        // Health check
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        // Client configuration
        .route("/api/languages", get(handlers::get_languages))
        .route("/api/config", get(handlers::get_audio_config))
        // Latency test control
        .route("/api/test/start", post(handlers::start_test))
        .route("/api/test/stop", post(handlers::stop_test))
        .route("/api/test/export", get(handlers::export_test))
        // WebSockets
        .route("/ws/metrics", get(ws::metrics_socket))
        .route("/ws/translate", get(ws::translate_socket))
        .layer(cors)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
