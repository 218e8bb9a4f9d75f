use tracing::{debug, info};

use crate::errors::{WebAskError, WebAskResult};
use crate::models::completion::{CompletionRequest, CompletionResponse, StageConfig};
use crate::models::message::Message;
use crate::providers::base::Provider;
use crate::rate_limiter::{RateLimiter, RateLimits};
use crate::token_counter::TokenCounter;

/// Accounting of every call made through one `Completions` client
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Model of the most recent call
    pub model: Option<String>,
    pub used_tokens: u64,
    pub responses: Vec<CompletionResponse>,
}

/// Completion client: budget check, rate limiting, one remote call, usage
/// accounting.
///
/// Calls take `&mut self`, so a single client never has two requests in
/// flight and the rate window and token total need no locking.
pub struct Completions {
    provider: Box<dyn Provider>,
    counter: TokenCounter,
    limiter: RateLimiter,
    active: StageConfig,
    session: Session,
}

impl Completions {
    pub fn new(provider: Box<dyn Provider>, active: StageConfig, limits: RateLimits) -> Self {
        Self {
            provider,
            counter: TokenCounter::new(),
            limiter: RateLimiter::new(limits),
            active,
            session: Session::default(),
        }
    }

    /// Switch the model used by subsequent `create` calls
    pub fn change_model<S: Into<String>>(&mut self, model: S) {
        self.active.model = model.into();
    }

    /// Settings used by `create`
    pub fn active(&self) -> &StageConfig {
        &self.active
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn used_tokens(&self) -> u64 {
        self.session.used_tokens
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Complete `messages` with the active settings
    pub async fn create(&mut self, messages: Vec<Message>) -> WebAskResult<CompletionResponse> {
        let request = self.active.request(messages);
        self.complete(request).await
    }

    pub async fn complete(&mut self, request: CompletionRequest) -> WebAskResult<CompletionResponse> {
        let cost = self.counter.count(&request.model, &request.messages)?;
        if cost > request.max_input_tokens {
            return Err(WebAskError::TokenBudgetExceeded {
                counted: cost,
                limit: request.max_input_tokens,
            });
        }

        self.limiter.reserve(cost as u64).await;

        debug!(model = %request.model, input_tokens = cost, "sending completion request");
        let response = self.provider.complete(&request).await?;

        let spent = response.tokens.sum();
        self.session.used_tokens += spent;
        self.session.model = Some(request.model);
        info!(
            model = %response.model,
            tokens = spent,
            total = self.session.used_tokens,
            "completion finished"
        );
        self.session.responses.push(response.clone());

        Ok(response)
    }
}
