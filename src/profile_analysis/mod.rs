// src/profile_analysis/mod.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod analyzer;
pub mod reply_parser;
pub mod vision_client;

pub use analyzer::Analyzer;
pub use reply_parser::{extract_json_block, parse_reply, AnalysisError, AnalysisErrorKind};
pub use vision_client::{CannedProvider, CompletionProvider, VisionClient};

/// Keys accepted for the numeric score. Older replies use `score`.
pub const SCORE_FIELDS: [&str; 2] = ["red_flag_score", "score"];
pub const RED_FLAGS_FIELD: &str = "red_flags";
pub const GREEN_FLAGS_FIELD: &str = "green_flags";

/// The model's assessment, kept exactly as the model produced it.
///
/// Only the presence of a score key and both flag lists is checked; values are
/// not range checked and extra keys are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(Map<String, Value>);

impl AnalysisResult {
    pub fn from_object(object: Map<String, Value>) -> Result<Self, AnalysisError> {
        if let Some(missing) = Self::missing_field(&object) {
            return Err(AnalysisError::new(
                AnalysisErrorKind::MissingField,
                format!("Invalid result structure from model: missing '{}'", missing),
            ));
        }
        Ok(Self(object))
    }

    fn missing_field(object: &Map<String, Value>) -> Option<&'static str> {
        if !SCORE_FIELDS.iter().any(|key| object.contains_key(*key)) {
            return Some(SCORE_FIELDS[0]);
        }
        [RED_FLAGS_FIELD, GREEN_FLAGS_FIELD]
            .into_iter()
            .find(|key| !object.contains_key(*key))
    }

    pub fn score(&self) -> Option<f64> {
        SCORE_FIELDS
            .iter()
            .find_map(|key| self.0.get(*key))
            .and_then(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
    }

    /// Score as the model wrote it, for display
    pub fn score_text(&self) -> String {
        match SCORE_FIELDS.iter().find_map(|key| self.0.get(*key)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "n/a".to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn red_flags(&self) -> Vec<String> {
        self.string_list(RED_FLAGS_FIELD)
    }

    pub fn green_flags(&self) -> Vec<String> {
        self.string_list(GREEN_FLAGS_FIELD)
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Fixed assessment returned in development mode instead of calling the model.
pub fn sample_result() -> AnalysisResult {
    let value = serde_json::json!({
        "red_flag_score": 55,
        "red_flags": [
            "Overly idealized expectations: 'I'm looking for an open-minded cutie to tie up'",
            "Inflexibility: None observed",
            "Control or manipulation: Potential hint in statement about 'tie up'",
            "Disrespect for boundaries: None observed",
            "Lack of direction: None observed",
            "Preference for privacy: None observed",
            "Self-victimization: None observed",
            "Unresolved past issues: None observed",
            "Insecurity: None observed",
            "Emotional unavailability: None observed",
            "Negative or hostile traits: None observed",
            "Lack of accountability: None observed",
            "Risky behaviors: None observed",
            "Overly sexual content: 'I'm looking for an open-minded cutie to tie up'",
            "Superficiality: Focus on achievements and social scenarios",
            "Misrepresentation: None observed (e.g., photos appear genuine)"
        ],
        "green_flags": [
            "Engaging in various hobbies and interests",
            "Education and career achievements",
            "Appears sociable and outgoing"
        ]
    });

    AnalysisResult(value.as_object().cloned().unwrap_or_default())
}
