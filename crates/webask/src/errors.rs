use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WebAskError {
    #[error("Total tokens ({counted}) exceeds the maximum tokens allowed ({limit})")]
    TokenBudgetExceeded { counted: usize, limit: usize },

    #[error("No tokenizer is known for model: {0}")]
    ModelNotSupported(String),

    #[error("Remote completion call failed: {0}")]
    RemoteCallFailed(String),

    /// The model ignored a required textual convention. `raw` holds the full reply.
    #[error("Malformed model output: {reason}")]
    MalformedOutput { reason: String, raw: String },

    #[error("Failed to render {url}: {message}")]
    Render { url: String, message: String },

    #[error("Prompt template error: {0}")]
    Prompt(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebAskError {
    /// The raw model text attached to the error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            WebAskError::MalformedOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type WebAskResult<T> = Result<T, WebAskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_error_message() {
        let err = WebAskError::TokenBudgetExceeded {
            counted: 1200,
            limit: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Total tokens (1200) exceeds the maximum tokens allowed (1000)"
        );
    }

    #[test]
    fn test_raw_output_only_for_malformed() {
        let err = WebAskError::MalformedOutput {
            reason: "no fence".to_string(),
            raw: "plain text".to_string(),
        };
        assert_eq!(err.raw_output(), Some("plain text"));
        assert!(WebAskError::RemoteCallFailed("boom".into())
            .raw_output()
            .is_none());
    }
}
