// src/profile_analysis/reply_parser.rs
//! Pulls the JSON assessment out of the model's free-text reply

use serde_json::Value;
use std::fmt;

use super::AnalysisResult;

const FENCE: &str = "```";

#[derive(Debug, Clone)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    NoJsonBlock,
    InvalidJson,
    NotAnObject,
    MissingField,
}

impl AnalysisErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoJsonBlock => "REPLY_NO_JSON",
            Self::InvalidJson => "REPLY_INVALID_JSON",
            Self::NotAnObject => "REPLY_NOT_OBJECT",
            Self::MissingField => "REPLY_MISSING_FIELD",
        }
    }
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for AnalysisError {}

/// Locate the JSON text inside a reply.
///
/// A fenced block wins (the language tag after the opening fence is skipped);
/// otherwise the span from the first `{` to the last `}` is used.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    let reply = reply.trim();

    if let Some(start) = reply.find(FENCE) {
        let after_fence = &reply[start + FENCE.len()..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
        let body = &after_fence[body_start..];
        let body = match body.find(FENCE) {
            Some(end) => &body[..end],
            None => body,
        };
        let body = body.trim();
        if !body.is_empty() {
            return Some(body);
        }
    }

    let open = reply.find('{')?;
    let close = reply.rfind('}')?;
    if close < open {
        return None;
    }
    Some(&reply[open..=close])
}

/// Extract, parse and presence-check the assessment in a model reply
pub fn parse_reply(reply: &str) -> Result<AnalysisResult, AnalysisError> {
    let block = extract_json_block(reply).ok_or_else(|| {
        AnalysisError::new(
            AnalysisErrorKind::NoJsonBlock,
            "Model reply does not contain a JSON block",
        )
    })?;

    let value: Value = serde_json::from_str(block).map_err(|e| {
        AnalysisError::new(
            AnalysisErrorKind::InvalidJson,
            format!("Model reply JSON could not be parsed: {}", e),
        )
    })?;

    match value {
        Value::Object(object) => AnalysisResult::from_object(object),
        other => Err(AnalysisError::new(
            AnalysisErrorKind::NotAnObject,
            format!("Model reply JSON is not an object: {}", type_name(&other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FENCED: &str = "```json\n{\"red_flag_score\": 42, \"red_flags\": [\"Vague bio\"], \"green_flags\": [\"Hobbies\"]}\n```";

    #[test]
    fn test_fenced_reply_returned_unchanged() {
        let result = parse_reply(FENCED).unwrap();
        assert_eq!(
            result.into_value(),
            json!({"red_flag_score": 42, "red_flags": ["Vague bio"], "green_flags": ["Hobbies"]})
        );
    }

    #[test]
    fn test_plain_json_reply() {
        let result = parse_reply(r#"{"score": 5, "red_flags": [], "green_flags": []}"#).unwrap();
        assert_eq!(result.score(), Some(5.0));
    }

    #[test]
    fn test_prose_around_fenced_block() {
        let reply = format!("Here is the analysis:\n\n{}\n\nLet me know if you need more.", FENCED);
        let result = parse_reply(&reply).unwrap();
        assert_eq!(result.red_flags(), vec!["Vague bio"]);
    }

    #[test]
    fn test_prose_around_bare_object() {
        let reply = r#"Sure! {"score": 1, "red_flags": ["x"], "green_flags": []} Hope this helps."#;
        assert_eq!(
            extract_json_block(reply),
            Some(r#"{"score": 1, "red_flags": ["x"], "green_flags": []}"#)
        );
    }

    #[test]
    fn test_fence_without_language_tag() {
        let reply = "```\n{\"score\": 2, \"red_flags\": [], \"green_flags\": []}\n```";
        assert!(parse_reply(reply).is_ok());
    }

    #[test]
    fn test_no_json_block() {
        let err = parse_reply("I'm sorry, I can't help with that.").unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::NoJsonBlock);
        assert_eq!(err.kind.code(), "REPLY_NO_JSON");
    }

    #[test]
    fn test_truncated_json() {
        let err = parse_reply("```json\n{\"red_flag_score\": 42, \"red_flags\": [\"a\"\n```").unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::InvalidJson);
    }

    #[test]
    fn test_array_is_not_an_object() {
        let err = parse_reply("```json\n[1, 2, 3]\n```").unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::NotAnObject);
    }

    #[test]
    fn test_missing_required_key() {
        let err = parse_reply("```json\n{\"red_flag_score\": 42, \"red_flags\": []}\n```").unwrap_err();
        assert_eq!(err.kind, AnalysisErrorKind::MissingField);
        assert!(err.to_string().contains("green_flags"));
    }
}
