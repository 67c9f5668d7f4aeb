// src/web/handlers/compose_handlers.rs
use rocket::form::Form;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use super::read_temp_file;
use crate::web::types::{api_error, ApiError, AppState, ComposeForm, ComposeResponse};

pub async fn compose_handler(
    mut upload: Form<ComposeForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<ComposeResponse>, ApiError> {
    if upload.images.is_empty() {
        return Err(api_error(Status::BadRequest, "No images uploaded"));
    }

    let mut uploads = Vec::with_capacity(upload.images.len());
    for file in upload.images.iter_mut() {
        let bytes = read_temp_file(file).await.map_err(|e| {
            error!("Failed to read uploaded image: {:#}", e);
            api_error(Status::InternalServerError, "Failed to read uploaded image")
        })?;
        uploads.push(bytes);
    }

    let compositor = state.compositor;
    let strip = tokio::task::spawn_blocking(move || compositor.process(&uploads))
        .await
        .map_err(|e| {
            error!("Compositor task failed: {}", e);
            api_error(Status::InternalServerError, "Error composing images")
        })?
        .map_err(|e| {
            error!("Error composing images: {:#}", e);
            api_error(Status::InternalServerError, format!("{:#}", e))
        })?;

    info!(
        "Composed {} images into {}x{} strip ({} bytes)",
        strip.count,
        strip.width,
        strip.height,
        strip.jpeg.len()
    );

    Ok(Json(ComposeResponse {
        image: strip.to_data_uri(),
        width: strip.width,
        height: strip.height,
        count: strip.count,
    }))
}
