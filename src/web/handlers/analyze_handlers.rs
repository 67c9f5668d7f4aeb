// src/web/handlers/analyze_handlers.rs
//! Analyze endpoints: one strip image in, the model's assessment out

use anyhow::Result;
use rocket::form::{self, Form};
use rocket::http::{ContentType, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::State;
use tracing::{error, info, info_span, Instrument};

use super::{read_temp_file, upload_mime};
use crate::presentation::render_result;
use crate::profile_analysis::{AnalysisError, AnalysisResult};
use crate::web::types::{
    api_error, AnalyzeRequest, AnalyzeResponse, AnalyzeUploadForm, ApiError, AppState,
    RenderRequest,
};

/// Every analysis failure reaches the caller as this one message
pub const ANALYZE_ERROR: &str = "Error processing image";

fn collapse(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<AnalysisError>() {
        Some(analysis) => error!(
            error_code = analysis.kind.code(),
            "Error processing image: {}", analysis.message
        ),
        None => error!("Error processing image: {:#}", err),
    }
    api_error(Status::InternalServerError, ANALYZE_ERROR)
}

fn respond(outcome: Result<AnalysisResult>) -> Result<Json<AnalyzeResponse>, ApiError> {
    outcome
        .map(|result| Json(AnalyzeResponse { result }))
        .map_err(collapse)
}

pub async fn analyze_json_handler(
    request: Result<Json<AnalyzeRequest>, JsonError<'_>>,
    state: &State<AppState>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("analyze", %request_id, source = "json");

    async {
        let request = match request {
            Ok(request) => request,
            Err(JsonError::Io(e)) => {
                return Err(collapse(anyhow::anyhow!("Failed to read request body: {}", e)))
            }
            Err(JsonError::Parse(_, e)) => {
                return Err(collapse(anyhow::anyhow!("Invalid request body: {}", e)))
            }
        };

        let outcome = match request.image.as_deref() {
            Some(image) if !image.trim().is_empty() => {
                info!("Analyzing data URI image ({} chars)", image.len());
                state.analyzer.analyze_data_uri(image).await
            }
            _ => Err(anyhow::anyhow!("Request has no image")),
        };
        respond(outcome)
    }
    .instrument(span)
    .await
}

pub async fn analyze_upload_handler(
    upload: Result<Form<AnalyzeUploadForm<'_>>, form::Errors<'_>>,
    state: &State<AppState>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("analyze", %request_id, source = "multipart");

    async {
        let mut upload = match upload {
            Ok(upload) => upload,
            Err(errors) => return Err(collapse(anyhow::anyhow!("Invalid upload form: {}", errors))),
        };

        let outcome = match read_temp_file(&mut upload.image).await {
            Ok(bytes) => {
                let mime = upload_mime(&upload.image, &bytes);
                info!("Analyzing uploaded image ({} bytes, {})", bytes.len(), mime);
                state.analyzer.analyze_bytes(&mime, &bytes).await
            }
            Err(e) => Err(e),
        };
        respond(outcome)
    }
    .instrument(span)
    .await
}

/// Analyze request that is neither JSON nor multipart
pub fn analyze_unsupported_handler(content_type: Option<&ContentType>) -> ApiError {
    let content_type = content_type
        .map(|ct| ct.to_string())
        .unwrap_or_else(|| "none".to_string());
    collapse(anyhow::anyhow!("Unsupported content type: {}", content_type))
}

/// HTML fragment for a result the page already holds. Never calls the model.
pub async fn render_result_handler(request: Json<RenderRequest>) -> Result<RawHtml<String>, ApiError> {
    let object = match request.into_inner().result {
        rocket::serde::json::Value::Object(object) => object,
        _ => return Err(api_error(Status::UnprocessableEntity, "Result must be an object")),
    };

    AnalysisResult::from_object(object)
        .map(|result| RawHtml(render_result(&result)))
        .map_err(|e| api_error(Status::UnprocessableEntity, e.message))
}
