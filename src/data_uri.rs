// src/data_uri.rs
//! `data:<mime>;base64,<payload>` encoding used between the page, the server and the model API

use anyhow::{Context, Result};
use base64::Engine;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Parse a base64 data URI. Only the base64 encoding is accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| anyhow::anyhow!("Not a data URI"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Data URI has no payload separator"))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            anyhow::bail!("Data URI is not base64 encoded");
        }

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("Invalid base64 payload in data URI")?;

        let mime = if mime.is_empty() {
            "application/octet-stream"
        } else {
            mime
        };

        Ok(Self::new(mime.to_lowercase(), bytes))
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        format!("data:{};base64,{}", mime, b64)
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.mime, &self.bytes))
    }
}
