// src/core/mod.rs
//! Core services shared by the web server and the CLI

pub mod config_manager;
pub mod fs_ops;
pub mod prompt;

pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use prompt::Prompt;
