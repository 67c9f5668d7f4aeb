// src/lib.rs
//! Red flag check: composes profile screenshots into one strip image and
//! asks a hosted vision model for a red/green flag assessment.

pub mod cli;
pub mod compositor;
pub mod core;
pub mod data_uri;
pub mod presentation;
pub mod profile_analysis;
pub mod samples;
pub mod web;

pub use compositor::{Compositor, StripImage};
pub use data_uri::DataUri;
pub use profile_analysis::{AnalysisResult, Analyzer};
pub use web::{build_rocket, start_web_server};

/// Crate-wide logging shorthand, forwards to the matching `tracing` macro.
///
/// `app_log!(info, "Server: {}", addr)` is `tracing::info!("Server: {}", addr)`.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_app_log_call_shapes() {
        app_log!(info, "plain message");
        app_log!(debug, "formatted {} of {}", 1, 2);
        app_log!(error, error_code = "REPLY_NO_JSON", "with field {}", "value");
    }
}
