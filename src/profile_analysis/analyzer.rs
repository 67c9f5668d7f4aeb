// src/profile_analysis/analyzer.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{parse_reply, AnalysisResult, CompletionProvider};
use crate::core::Prompt;
use crate::data_uri::DataUri;

/// Sends one strip image with the fixed prompt and validates the reply.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn CompletionProvider>,
    prompt: Prompt,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn CompletionProvider>, prompt: Prompt) -> Self {
        Self { provider, prompt }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Analyze an image given as a data URI. One provider call, no retry.
    pub async fn analyze_data_uri(&self, image: &str) -> Result<AnalysisResult> {
        let parsed = DataUri::parse(image).context("Image is not a valid data URI")?;
        if !parsed.is_image() {
            warn!("Analyzing data URI with non-image type {}", parsed.mime);
        }

        let reply = self
            .provider
            .complete(self.prompt.as_str(), image.trim())
            .await
            .with_context(|| format!("{} provider call failed", self.provider.name()))?;

        debug!("Raw result: {}", reply);

        let result = parse_reply(&reply)?;
        info!(
            "Parsed result: score={} red_flags={} green_flags={}",
            result.score_text(),
            result.red_flags().len(),
            result.green_flags().len()
        );
        Ok(result)
    }

    /// Analyze raw image bytes, e.g. a multipart upload or a file on disk
    pub async fn analyze_bytes(&self, mime: &str, bytes: &[u8]) -> Result<AnalysisResult> {
        if bytes.is_empty() {
            anyhow::bail!("Image is empty");
        }
        self.analyze_data_uri(&DataUri::encode(mime, bytes)).await
    }
}
