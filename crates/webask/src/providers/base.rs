use async_trait::async_trait;

use crate::errors::WebAskResult;
use crate::models::completion::{CompletionRequest, CompletionResponse};

/// Base trait for chat completion endpoints
///
/// Implementations issue exactly one remote call per `complete` and never
/// retry. Budget checks and rate limiting happen before a provider is reached.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> WebAskResult<CompletionResponse>;
}
