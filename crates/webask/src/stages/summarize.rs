use super::USER_QUERY_PREFIX;
use crate::completions::Completions;
use crate::errors::WebAskResult;
use crate::models::completion::{CompletionResponse, StageConfig};
use crate::models::message::Message;
use crate::prompt_template::SUMMARIZE_SYSTEM;

pub fn messages<S: AsRef<str>>(prompt: &str, documents: &[S]) -> Vec<Message> {
    let mut messages = vec![
        Message::system(SUMMARIZE_SYSTEM.trim()),
        Message::user(format!("{}{}", USER_QUERY_PREFIX, prompt)),
    ];
    messages.extend(documents.iter().map(|doc| Message::user(doc.as_ref())));
    messages
}

/// Combine the distilled documents into one answer to `prompt`
pub async fn summarize<S: AsRef<str>>(
    completions: &mut Completions,
    stage: &StageConfig,
    prompt: &str,
    documents: &[S],
) -> WebAskResult<CompletionResponse> {
    completions
        .complete(stage.request(messages(prompt, documents)))
        .await
}
