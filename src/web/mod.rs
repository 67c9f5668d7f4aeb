// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::form::{self, Form};
use rocket::http::{ContentType, Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::compositor::Compositor;
use crate::core::config_manager::ServerSettings;
use crate::core::{ConfigManager, Prompt};
use crate::profile_analysis::{Analyzer, CannedProvider, CompletionProvider, VisionClient};
use crate::samples::SampleStore;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[get("/")]
pub async fn index(state: &State<AppState>) -> RawHtml<String> {
    handlers::index_handler(state).await
}

// Analyze body failures are handled in the handlers so they share the one analyze error
#[post("/analyze", format = "json", data = "<request>")]
pub async fn analyze_json(
    request: Result<Json<AnalyzeRequest>, JsonError<'_>>,
    state: &State<AppState>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    handlers::analyze_json_handler(request, state).await
}

#[post("/analyze", format = "multipart/form-data", data = "<upload>", rank = 2)]
pub async fn analyze_upload(
    upload: Result<Form<AnalyzeUploadForm<'_>>, form::Errors<'_>>,
    state: &State<AppState>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    handlers::analyze_upload_handler(upload, state).await
}

#[post("/analyze", rank = 3)]
pub async fn analyze_unsupported(content_type: Option<&ContentType>) -> ApiError {
    handlers::analyze_unsupported_handler(content_type)
}

#[post("/compose", format = "multipart/form-data", data = "<upload>")]
pub async fn compose(
    upload: Form<ComposeForm<'_>>,
    state: &State<AppState>,
) -> Result<Json<ComposeResponse>, ApiError> {
    handlers::compose_handler(upload, state).await
}

#[post("/render", format = "json", data = "<request>")]
pub async fn render(request: Json<RenderRequest>) -> Result<RawHtml<String>, ApiError> {
    handlers::render_result_handler(request).await
}

#[get("/test-images")]
pub async fn list_test_images(state: &State<AppState>) -> Result<Json<Vec<String>>, Status> {
    handlers::list_samples_handler(state).await
}

#[get("/test-images/<name>")]
pub async fn get_test_image(
    name: String,
    state: &State<AppState>,
) -> Result<ImageResponse, (Status, &'static str)> {
    handlers::get_sample_handler(name, state).await
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> Json<HealthResponse> {
    handlers::health_handler(state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request format"))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Not found"))
}

#[rocket::catch(413)]
pub fn payload_too_large() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Upload too large"))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Invalid request body"))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new("Internal server error"))
}

/// Rocket figment with the configured address, port and body limits
pub fn rocket_figment(settings: &ServerSettings) -> Figment {
    let limit = settings.upload_limit_mib.mebibytes();
    let limits = Limits::default()
        .limit("json", limit)
        .limit("form", limit)
        .limit("data-form", limit)
        .limit("file", limit)
        .limit("bytes", limit);

    rocket::Config::figment()
        .merge(("address", settings.address.clone()))
        .merge(("port", settings.port))
        .merge(("limits", limits))
}

pub fn build_rocket(app: AppState, figment: Figment) -> Rocket<Build> {
    let mut api_routes = routes![
        analyze_json,
        analyze_upload,
        analyze_unsupported,
        compose,
        render,
        health,
        options
    ];
    if app.dev_mode {
        api_routes.extend(routes![list_test_images, get_test_image]);
    }

    rocket::custom(figment)
        .attach(Cors)
        .manage(app)
        .register("/", catchers![
            bad_request,
            not_found,
            payload_too_large,
            unprocessable,
            internal_error
        ])
        .mount("/", routes![index])
        .mount("/api", api_routes)
}

/// Provider for the configured mode: the fixed sample in development, the hosted model otherwise
pub fn build_provider(config: &ConfigManager) -> Result<Arc<dyn CompletionProvider>> {
    if config.dev_mode {
        warn!("Development mode: analysis returns the fixed sample result");
        Ok(Arc::new(CannedProvider))
    } else {
        Ok(Arc::new(VisionClient::new(&config.service)?))
    }
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let prompt = Prompt::load(&config.environment.prompt_path).await?;
    let provider = build_provider(&config)?;

    let app = AppState {
        analyzer: Analyzer::new(provider, prompt),
        compositor: Compositor::new().with_max_canvas_pixels(config.server.max_canvas_pixels),
        samples: SampleStore::new(config.environment.test_images_path.clone()),
        dev_mode: config.dev_mode,
        environment: config.environment.name.clone(),
    };

    info!("Starting Red Flag Check server");
    info!("Environment: {}", config.environment.name);
    info!("Prompt: {}", config.environment.prompt_path.display());
    info!("Test images: {}", config.environment.test_images_path.display());
    info!("Model: {} at {}", config.service.model, config.service.base_url);
    info!(
        "Server: http://{}:{}",
        config.server.address, config.server.port
    );

    let figment = rocket_figment(&config.server);
    if let Err(e) = build_rocket(app, figment).launch().await {
        error!("Server failed: {}", e);
        anyhow::bail!("Server failed: {}", e);
    }

    Ok(())
}
