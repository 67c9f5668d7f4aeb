// src/profile_analysis/vision_client.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::core::config_manager::ServiceConfig;

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";

/// Something that can answer a prompt about one image with free text.
#[rocket::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, image_data_uri: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API with image input
pub struct VisionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl VisionClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, image_data_uri: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_uri,
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        }
    }
}

#[rocket::async_trait]
impl CompletionProvider for VisionClient {
    async fn complete(&self, prompt: &str, image_data_uri: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT);
        let body = self.request_body(prompt, image_data_uri);

        info!(
            "Sending image ({} chars) to {} model {}",
            image_data_uri.len(),
            url,
            self.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to vision model API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Vision model API error {}: {}", status, error_text);
            anyhow::bail!("Vision model API returned error {}: {}", status, error_text);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse vision model API response")?;

        first_choice_content(chat)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn first_choice_content(chat: ChatResponse) -> Result<String> {
    chat.choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Vision model API returned no choices"))?
        .message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("Vision model API returned an empty message"))
}

/// Answers every request with the fixed development assessment, fenced like a model reply.
pub struct CannedProvider;

#[rocket::async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete(&self, _prompt: &str, _image_data_uri: &str) -> Result<String> {
        let body = serde_json::to_string_pretty(&super::sample_result())
            .context("Failed to serialize sample result")?;
        Ok(format!("```json\n{}\n```", body))
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}
