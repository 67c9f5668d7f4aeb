// src/core/config_manager.rs
//! Unified configuration management: optional config.yaml plus environment overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPLOAD_LIMIT_MIB: u64 = 20;
pub const DEFAULT_MAX_CANVAS_PIXELS: u64 = crate::compositor::MAX_CANVAS_PIXELS;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub service: ServiceConfig,
    pub server: ServerSettings,
    pub dev_mode: bool,
}

#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub name: String,
    pub prompt_path: PathBuf,
    pub test_images_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub address: String,
    pub port: u16,
    pub upload_limit_mib: u64,
    pub max_canvas_pixels: u64,
}

/// One environment section of config.yaml. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub prompt_path: Option<PathBuf>,
    pub test_images_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub upload_limit_mib: Option<u64>,
    pub max_canvas_pixels: Option<u64>,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: FileConfig,
    production: FileConfig,
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        let environment = Self::environment_name(|key| std::env::var(key).ok());
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("REDFLAG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.yaml"));
        let file = Self::load_file(&config_path, &environment)?;
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;

        Self::from_sources(&environment, file, |key| std::env::var(key).ok(), &base_dir)
    }

    fn environment_name(env: impl Fn(&str) -> Option<String>) -> String {
        env("REDFLAG_ENV")
            .or_else(|| env("ENVIRONMENT"))
            .unwrap_or_else(|| "local".to_string())
    }

    fn load_file(path: &Path, environment: &str) -> Result<FileConfig> {
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    /// Merge a config file section with environment variables. Environment wins.
    pub fn from_sources(
        environment: &str,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        base_dir: &Path,
    ) -> Result<Self> {
        let dev_mode = match env("REDFLAG_DEV_MODE") {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("REDFLAG_DEV_MODE must be a boolean, got '{}'", value))?,
            None => file.dev_mode.unwrap_or(false),
        };

        let prompt_path = env("PROMPT_PATH")
            .map(PathBuf::from)
            .or(file.prompt_path)
            .unwrap_or_else(|| PathBuf::from("prompt.txt"));
        let test_images_path = env("TEST_IMAGES_PATH")
            .map(PathBuf::from)
            .or(file.test_images_path)
            .unwrap_or_else(|| PathBuf::from("testImages"));

        let port = match env("ROCKET_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("ROCKET_PORT must be a valid port number, got '{}'", value))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let api_key = env("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        if api_key.is_none() && !dev_mode {
            anyhow::bail!("OPENAI_API_KEY environment variable not set (required outside development mode)");
        }

        Ok(Self {
            environment: EnvironmentConfig {
                name: environment.to_string(),
                prompt_path: FsOps::normalize_path(base_dir, &prompt_path),
                test_images_path: FsOps::normalize_path(base_dir, &test_images_path),
            },
            service: ServiceConfig {
                api_key,
                base_url: env("OPENAI_BASE_URL")
                    .or(file.base_url)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: env("OPENAI_MODEL")
                    .or(file.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens: file.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                timeout_seconds: file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            server: ServerSettings {
                address: env("ROCKET_ADDRESS")
                    .or(file.address)
                    .unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
                upload_limit_mib: file.upload_limit_mib.unwrap_or(DEFAULT_UPLOAD_LIMIT_MIB),
                max_canvas_pixels: file.max_canvas_pixels.unwrap_or(DEFAULT_MAX_CANVAS_PIXELS),
            },
            dev_mode,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = ConfigManager::from_sources(
            "local",
            FileConfig::default(),
            env_of(&[("OPENAI_API_KEY", "sk-test")]),
            Path::new("/srv/app"),
        )
        .unwrap();

        assert_eq!(config.service.model, "gpt-4o");
        assert_eq!(config.service.max_tokens, 1000);
        assert_eq!(config.service.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.max_canvas_pixels, DEFAULT_MAX_CANVAS_PIXELS);
        assert_eq!(config.environment.prompt_path, PathBuf::from("/srv/app/prompt.txt"));
        assert_eq!(
            config.environment.test_images_path,
            PathBuf::from("/srv/app/testImages")
        );
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_missing_api_key_outside_dev_mode() {
        let result = ConfigManager::from_sources(
            "production",
            FileConfig::default(),
            env_of(&[]),
            Path::new("/srv/app"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dev_mode_does_not_need_api_key() {
        let config = ConfigManager::from_sources(
            "local",
            FileConfig::default(),
            env_of(&[("REDFLAG_DEV_MODE", "true")]),
            Path::new("/srv/app"),
        )
        .unwrap();
        assert!(config.dev_mode);
        assert!(config.service.api_key.is_none());
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = FileConfig {
            model: Some("gpt-4o-mini".to_string()),
            port: Some(9000),
            prompt_path: Some(PathBuf::from("/etc/redflag/prompt.txt")),
            ..FileConfig::default()
        };
        let config = ConfigManager::from_sources(
            "local",
            file,
            env_of(&[("OPENAI_API_KEY", "sk-test"), ("ROCKET_PORT", "8123")]),
            Path::new("/srv/app"),
        )
        .unwrap();

        assert_eq!(config.service.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 8123);
        assert_eq!(
            config.environment.prompt_path,
            PathBuf::from("/etc/redflag/prompt.txt")
        );
    }

    #[test]
    fn test_invalid_port() {
        let result = ConfigManager::from_sources(
            "local",
            FileConfig::default(),
            env_of(&[("OPENAI_API_KEY", "sk-test"), ("ROCKET_PORT", "http")]),
            Path::new("/srv/app"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_name() {
        assert_eq!(ConfigManager::environment_name(env_of(&[])), "local");
        assert_eq!(
            ConfigManager::environment_name(env_of(&[("ENVIRONMENT", "production")])),
            "production"
        );
        assert_eq!(
            ConfigManager::environment_name(env_of(&[
                ("REDFLAG_ENV", "staging"),
                ("ENVIRONMENT", "production")
            ])),
            "staging"
        );
    }

    #[test]
    fn test_yaml_sections() {
        let yaml = r#"
local:
  dev_mode: true
  test_images_path: fixtures
production:
  model: gpt-4o
  port: 80
"#;
        let file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.local.dev_mode, Some(true));
        assert_eq!(file.local.test_images_path, Some(PathBuf::from("fixtures")));
        assert_eq!(file.production.port, Some(80));
        assert!(file.production.dev_mode.is_none());
    }
}
