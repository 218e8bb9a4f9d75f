use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::errors::{WebAskError, WebAskResult};

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n?```").unwrap();
}

/// Body of the first ```json fenced block in `text`
pub fn find_json_block(text: &str) -> Option<&str> {
    JSON_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse the first ```json fenced block of a model reply.
///
/// A missing fence or invalid JSON is a `MalformedOutput` carrying the reply.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> WebAskResult<T> {
    let block = find_json_block(text).ok_or_else(|| {
        error!("No fenced json block in model reply:\n{}", text);
        WebAskError::MalformedOutput {
            reason: "reply does not contain a ```json fenced block".to_string(),
            raw: text.to_string(),
        }
    })?;

    serde_json::from_str(block).map_err(|e| {
        error!("Invalid json block in model reply:\n{}", text);
        WebAskError::MalformedOutput {
            reason: format!("invalid JSON in fenced block: {}", e),
            raw: text.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_extracts_first_block() {
        let text = "Here you go:\n```json\n[1, 2]\n```\nand also\n```json\n[3]\n```";
        let value: Vec<u32> = extract_json(text).unwrap();
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn test_missing_fence_is_malformed() {
        let err = extract_json::<Value>("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, WebAskError::MalformedOutput { ref raw, .. } if raw == "[1, 2, 3]"));
    }

    #[test]
    fn test_other_language_fence_is_not_json() {
        assert!(find_json_block("```js\n[1]\n```").is_none());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = extract_json::<Value>("```json\n[{\"title\": }]\n```").unwrap_err();
        match err {
            WebAskError::MalformedOutput { reason, .. } => assert!(reason.contains("invalid JSON")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multiline_block() {
        let text = "```json\n{\n  \"a\": 1\n}\n```";
        assert_eq!(find_json_block(text), Some("{\n  \"a\": 1\n}"));
    }
}
