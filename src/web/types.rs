// src/web/types.rs

use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::compositor::Compositor;
use crate::profile_analysis::{AnalysisResult, Analyzer};
use crate::samples::SampleStore;

/// Everything the routes share, managed by Rocket
pub struct AppState {
    pub analyzer: Analyzer,
    pub compositor: Compositor,
    pub samples: SampleStore,
    pub dev_mode: bool,
    pub environment: String,
}

pub struct ImageResponse {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for ImageResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let content_type =
            ContentType::parse_flexible(&self.content_type).unwrap_or(ContentType::Binary);

        Response::build()
            .header(content_type)
            .raw_header(
                "Content-Disposition",
                format!("inline; filename=\"{}\"", self.filename.replace('"', "")),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub type ApiError = (Status, Json<ErrorResponse>);

pub fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeRequest {
    pub image: Option<String>,
}

#[derive(FromForm)]
pub struct AnalyzeUploadForm<'f> {
    pub image: TempFile<'f>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeResponse {
    pub result: AnalysisResult,
}

#[derive(FromForm)]
pub struct ComposeForm<'f> {
    pub images: Vec<TempFile<'f>>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ComposeResponse {
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RenderRequest {
    pub result: rocket::serde::json::Value,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub mode: &'static str,
    pub provider: &'static str,
    pub timestamp: String,
}
