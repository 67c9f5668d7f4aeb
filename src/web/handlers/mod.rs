pub mod analyze_handlers;
pub mod compose_handlers;
pub mod sample_handlers;
pub mod system_handlers;

pub use analyze_handlers::*;
pub use compose_handlers::*;
pub use sample_handlers::*;
pub use system_handlers::*;

use anyhow::{Context, Result};
use rocket::fs::TempFile;

/// Pull the bytes of an uploaded file, whether Rocket buffered it or spilled it to disk
pub(crate) async fn read_temp_file(file: &mut TempFile<'_>) -> Result<Vec<u8>> {
    let temp_path = std::env::temp_dir().join(format!("redflag_upload_{}", uuid::Uuid::new_v4()));

    file.persist_to(&temp_path)
        .await
        .context("Failed to save uploaded file")?;

    let bytes = tokio::fs::read(&temp_path)
        .await
        .context("Failed to read uploaded file");
    let _ = tokio::fs::remove_file(&temp_path).await;
    bytes
}

/// Declared content type of an upload, or one sniffed from its bytes
pub(crate) fn upload_mime(file: &TempFile<'_>, bytes: &[u8]) -> String {
    let declared = file
        .content_type()
        .filter(|ct| ct.top().as_str().eq_ignore_ascii_case("image"))
        .map(|ct| format!("{}/{}", ct.top().as_str(), ct.sub().as_str()).to_lowercase());

    declared
        .or_else(|| {
            image::guess_format(bytes)
                .ok()
                .map(|format| format.to_mime_type().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
