// src/core/prompt.rs
use anyhow::Result;
use std::path::Path;

use crate::app_log;
use crate::core::FsOps;

/// Instruction text sent alongside every strip image.
#[derive(Debug, Clone)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            anyhow::bail!("Prompt text is empty");
        }
        Ok(Self { text })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = FsOps::read_file_safe(path).await?;
        let prompt = Self::new(text)
            .map_err(|e| anyhow::anyhow!("{}: {}", e, path.display()))?;
        app_log!(info, "Loaded prompt from {} ({} chars)", path.display(), prompt.text.len());
        Ok(prompt)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(Prompt::new("  \n").is_err());
        assert_eq!(Prompt::new("Rate this").unwrap().as_str(), "Rate this");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let path = std::env::temp_dir().join(format!("redflag_prompt_{}.txt", uuid::Uuid::new_v4()));
        assert!(Prompt::load(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("redflag_prompt_{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "Return JSON only.").await.unwrap();

        let prompt = Prompt::load(&path).await.unwrap();
        assert_eq!(prompt.as_str(), "Return JSON only.");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
