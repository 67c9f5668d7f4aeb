// src/web/handlers/system_handlers.rs
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use crate::presentation::{render_page, PageState};
use crate::web::types::{AppState, HealthResponse};

pub async fn index_handler(state: &State<AppState>) -> RawHtml<String> {
    RawHtml(render_page(&PageState::default(), state.dev_mode))
}

pub async fn health_handler(state: &State<AppState>) -> Json<HealthResponse> {
    info!("Health check");
    Json(HealthResponse {
        status: "ok",
        environment: state.environment.clone(),
        mode: if state.dev_mode { "development" } else { "production" },
        provider: state.analyzer.provider_name(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
