use super::state::AppState;
use crate::timing::TimingEvent;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub backend: String,
    pub service_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfigResponse {
    pub sample_rate: u32,
    pub chunk_size: usize,
    pub channels: u16,
}

#[derive(Debug, Serialize)]
pub struct TestStatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub events: Vec<TimingEvent>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / and GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.service();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            service: state.config.service.name.clone(),
            backend: service.name().to_string(),
            service_connected: service.is_connected(),
        }),
    )
}

/// GET /api/languages
/// Target languages the client may pick
pub async fn get_languages(State(state): State<AppState>) -> impl IntoResponse {
    let languages = state
        .config
        .languages
        .iter()
        .map(|l| LanguageInfo {
            code: l.code.clone(),
            name: l.name.clone(),
            available: l.available,
        })
        .collect();

    Json(LanguagesResponse { languages })
}

/// GET /api/config
/// Audio format the client must capture in
pub async fn get_audio_config(State(state): State<AppState>) -> impl IntoResponse {
    let audio = &state.config.audio;
    Json(AudioConfigResponse {
        sample_rate: audio.sample_rate,
        chunk_size: audio.chunk_size,
        channels: audio.channels,
    })
}

/// POST /api/test/start
/// Start a latency measurement test, clearing previous events
pub async fn start_test(State(state): State<AppState>) -> impl IntoResponse {
    state.timing.start_test();
    info!("Latency test started via API");
    Json(TestStatusResponse {
        status: "started".to_string(),
    })
}

/// POST /api/test/stop
pub async fn stop_test(State(state): State<AppState>) -> impl IntoResponse {
    state.timing.stop_test();
    info!("Latency test stopped via API");
    Json(TestStatusResponse {
        status: "stopped".to_string(),
    })
}

/// GET /api/test/export
/// All events from the current or last test
pub async fn export_test(State(state): State<AppState>) -> impl IntoResponse {
    Json(ExportResponse {
        events: state.timing.export(),
    })
}
