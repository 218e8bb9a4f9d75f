use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::errors::{WebAskError, WebAskResult};
use crate::models::message::Message;

/// Tokens spent on the role and message structure
const ROLE_TOKENS: usize = 1;
/// <|im_start|>, <|im_sep|>, <|im_end|>
const SPECIAL_TOKENS: usize = 3;
/// Tokens used to prime the assistant reply
const FINAL_ASSISTANT_TOKENS: usize = 3;

/// Counts the input cost of a conversation with the tokenizer of a model.
///
/// Tokenizers are loaded lazily and kept for the lifetime of the counter.
#[derive(Default)]
pub struct TokenCounter {
    tokenizers: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokenizer_for(&self, model: &str) -> WebAskResult<Arc<CoreBPE>> {
        let mut tokenizers = self
            .tokenizers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(bpe) = tokenizers.get(model) {
            return Ok(Arc::clone(bpe));
        }

        let bpe = get_bpe_from_model(model)
            .map(Arc::new)
            .map_err(|_| WebAskError::ModelNotSupported(model.to_string()))?;
        tokenizers.insert(model.to_string(), Arc::clone(&bpe));
        Ok(bpe)
    }

    pub fn count_text(&self, text: &str, model: &str) -> WebAskResult<usize> {
        let bpe = self.tokenizer_for(model)?;
        Ok(bpe.encode_with_special_tokens(text).len())
    }

    /// Token cost of sending `messages` to `model`
    pub fn count(&self, model: &str, messages: &[Message]) -> WebAskResult<usize> {
        let bpe = self.tokenizer_for(model)?;
        let per_message: usize = messages
            .iter()
            .map(|m| bpe.encode_with_special_tokens(&m.content).len() + ROLE_TOKENS + SPECIAL_TOKENS)
            .sum();
        Ok(per_message + FINAL_ASSISTANT_TOKENS)
    }
}
