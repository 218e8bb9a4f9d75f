use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::errors::WebAskResult;
use crate::models::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::providers::base::Provider;

/// A mock provider that returns pre-configured replies and records requests
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<Vec<(String, TokenUsage)>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of reply texts
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self::with_usage(
            replies
                .into_iter()
                .map(|r| (r.into(), TokenUsage::default()))
                .collect(),
        )
    }

    pub fn with_usage(replies: Vec<(String, TokenUsage)>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> WebAskResult<CompletionResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut replies = self.replies.lock().unwrap();
        let (message, tokens) = if replies.is_empty() {
            // Return empty response if no more pre-configured replies
            (String::new(), TokenUsage::default())
        } else {
            replies.remove(0)
        };
        Ok(CompletionResponse {
            model: request.model.clone(),
            message,
            tokens,
        })
    }
}
