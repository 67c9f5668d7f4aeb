// src/web/handlers/sample_handlers.rs
//! Development-only sample screenshots

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, warn};

use crate::samples::SampleStore;
use crate::web::types::{AppState, ImageResponse};

pub async fn list_samples_handler(state: &State<AppState>) -> Result<Json<Vec<String>>, Status> {
    state.samples.list().await.map(Json).map_err(|e| {
        error!("Failed to list test images: {:#}", e);
        Status::InternalServerError
    })
}

pub async fn get_sample_handler(
    name: String,
    state: &State<AppState>,
) -> Result<ImageResponse, (Status, &'static str)> {
    match state.samples.read(&name).await {
        Ok(Some(data)) => Ok(ImageResponse {
            data,
            content_type: SampleStore::content_type(&name),
            filename: name,
        }),
        Ok(None) => {
            warn!("Test image not found: {}", name);
            Err((Status::NotFound, "File not found"))
        }
        Err(e) => {
            error!("Failed to read test image {}: {:#}", name, e);
            Err((Status::InternalServerError, "Failed to read file"))
        }
    }
}
