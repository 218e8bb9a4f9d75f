use chrono::{NaiveDate, Utc};

use crate::completions::Completions;
use crate::errors::WebAskResult;
use crate::models::completion::{CompletionResponse, StageConfig};
use crate::models::message::Message;
use crate::prompt_template::SEARCH_QUERY_SYSTEM;

pub fn messages(prompt: &str, today: NaiveDate) -> Vec<Message> {
    vec![
        Message::system(SEARCH_QUERY_SYSTEM.trim()),
        Message::user(format!("Today is: {}", today.format("%Y-%m-%d"))),
        Message::user(prompt),
    ]
}

/// Ask the model whether `prompt` needs a web search and for which query.
///
/// The reply either starts with `Searching the web for: ` or is a direct
/// answer; see [`crate::search::wants_to_search_web`].
pub async fn decide_query(
    completions: &mut Completions,
    stage: &StageConfig,
    prompt: &str,
) -> WebAskResult<CompletionResponse> {
    let today = Utc::now().date_naive();
    completions
        .complete(stage.request(messages(prompt, today)))
        .await
}
