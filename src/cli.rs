// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::app_log;
use crate::compositor::{Compositor, StripImage};
use crate::core::{ConfigManager, FsOps, Prompt};
use crate::profile_analysis::Analyzer;
use crate::samples::SampleStore;
use crate::web::{build_provider, start_web_server};

#[derive(Parser)]
#[command(name = "redflag-check")]
#[command(about = "Compose dating-profile screenshots and check them for red flags")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the web server (default)
    Serve,
    /// Compose screenshots into one strip image
    Compose {
        #[arg(required_unless_present = "samples_dir")]
        files: Vec<PathBuf>,
        /// Append every sample screenshot found in this directory
        #[arg(long)]
        samples_dir: Option<PathBuf>,
        #[arg(short, long, default_value = "strip.jpg")]
        output: PathBuf,
    },
    /// Send an image to the configured model and print the assessment
    Analyze {
        image: PathBuf,
        /// Compose these extra screenshots with IMAGE before analyzing
        #[arg(long = "with")]
        extra: Vec<PathBuf>,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = ConfigManager::load()?;
            start_web_server(config).await
        }
        Command::Compose {
            files,
            samples_dir,
            output,
        } => {
            let mut uploads = read_files(&files).await?;
            if let Some(dir) = samples_dir {
                let samples = SampleStore::new(dir).load_all().await?;
                app_log!(info, "Loaded {} sample screenshots", samples.len());
                uploads.extend(samples.into_iter().map(|(_, bytes)| bytes));
            }
            let strip = compose_uploads(uploads).await?;
            FsOps::write_bytes(&output, &strip.jpeg).await?;
            println!(
                "Composed {} images into {} ({}x{}, {} bytes)",
                strip.count,
                output.display(),
                strip.width,
                strip.height,
                strip.jpeg.len()
            );
            Ok(())
        }
        Command::Analyze { image, extra, json } => {
            let config = ConfigManager::load()?;
            let prompt = Prompt::load(&config.environment.prompt_path).await?;
            let analyzer = Analyzer::new(build_provider(&config)?, prompt);

            let (mime, bytes) = if extra.is_empty() {
                let bytes = FsOps::read_bytes(&image).await?;
                let format = image::guess_format(&bytes)
                    .with_context(|| format!("Unrecognized image format: {}", image.display()))?;
                (format.to_mime_type().to_string(), bytes)
            } else {
                let mut files = vec![image];
                files.extend(extra);
                let strip = compose_uploads(read_files(&files).await?).await?;
                app_log!(info, "Composed {}x{} strip from {} images", strip.width, strip.height, strip.count);
                ("image/jpeg".to_string(), strip.jpeg)
            };

            let result = analyzer.analyze_bytes(&mime, &bytes).await?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).context("Failed to serialize result")?
                );
            } else {
                println!("Red Flag Score: {}", result.score_text());
                println!("\nRed Flags:");
                for flag in result.red_flags() {
                    println!("  - {}", flag);
                }
                println!("\nGreen Flags:");
                for flag in result.green_flags() {
                    println!("  - {}", flag);
                }
            }
            Ok(())
        }
    }
}

async fn read_files(files: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        uploads.push(FsOps::read_bytes(path).await?);
    }
    Ok(uploads)
}

async fn compose_uploads(uploads: Vec<Vec<u8>>) -> Result<StripImage> {
    tokio::task::spawn_blocking(move || Compositor::new().process(&uploads))
        .await
        .context("Compositor task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::parse_from(["redflag-check"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_compose_arguments() {
        let cli = Cli::parse_from(["redflag-check", "compose", "a.png", "b.png", "-o", "out.jpg"]);
        match cli.command {
            Some(Command::Compose {
                files,
                samples_dir,
                output,
            }) => {
                assert_eq!(files, vec![PathBuf::from("a.png"), PathBuf::from("b.png")]);
                assert_eq!(output, PathBuf::from("out.jpg"));
                assert!(samples_dir.is_none());
            }
            _ => panic!("expected compose"),
        }
    }

    #[test]
    fn test_compose_requires_files_or_samples() {
        assert!(Cli::try_parse_from(["redflag-check", "compose"]).is_err());
        assert!(Cli::try_parse_from(["redflag-check", "compose", "--samples-dir", "testImages"]).is_ok());
    }

    #[test]
    fn test_analyze_arguments() {
        let cli = Cli::parse_from([
            "redflag-check",
            "analyze",
            "one.png",
            "--with",
            "two.png",
            "--json",
        ]);
        match cli.command {
            Some(Command::Analyze { image, extra, json }) => {
                assert_eq!(image, PathBuf::from("one.png"));
                assert_eq!(extra, vec![PathBuf::from("two.png")]);
                assert!(json);
            }
            _ => panic!("expected analyze"),
        }
    }
}
