use super::USER_QUERY_PREFIX;
use crate::completions::Completions;
use crate::errors::WebAskResult;
use crate::models::completion::{CompletionResponse, StageConfig};
use crate::models::message::Message;
use crate::prompt_template::{DISTILL_INSTRUCTIONS, DISTILL_SYSTEM};

pub fn messages(prompt: &str, html: &str) -> Vec<Message> {
    vec![
        Message::system(DISTILL_SYSTEM.trim()),
        Message::user(DISTILL_INSTRUCTIONS.trim()),
        Message::user(format!("{}{}", USER_QUERY_PREFIX, prompt)),
        Message::user(format!("```html\n{}\n```", html)),
    ]
}

/// Extract from one page the text that answers `prompt`
pub async fn distill_html(
    completions: &mut Completions,
    stage: &StageConfig,
    prompt: &str,
    html: &str,
) -> WebAskResult<CompletionResponse> {
    completions
        .complete(stage.request(messages(prompt, html)))
        .await
}
