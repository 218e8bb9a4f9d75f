use serde_json::json;
use tracing::debug;

use super::USER_QUERY_PREFIX;
use crate::completions::Completions;
use crate::errors::WebAskResult;
use crate::json_block::extract_json;
use crate::models::completion::StageConfig;
use crate::models::message::Message;
use crate::models::search::SearchResult;
use crate::prompt_template::{load_prompt, RANK_INSTRUCTIONS, RANK_SYSTEM};

pub const DEFAULT_PICKED_RESULTS: usize = 3;

pub fn messages(prompt: &str, results: &[SearchResult], picked: usize) -> WebAskResult<Vec<Message>> {
    let instructions = load_prompt(RANK_INSTRUCTIONS, &json!({ "picked": picked }))?;
    let results = serde_json::to_string_pretty(results)?;

    Ok(vec![
        Message::system(RANK_SYSTEM.trim()),
        Message::user(instructions),
        Message::user(format!("{}{}", USER_QUERY_PREFIX, prompt)),
        Message::user(format!("```json\n{}\n```", results)),
    ])
}

/// Let the model pick the `picked` most relevant and reputable results.
///
/// The reply must contain a ```json fenced array of results; anything else
/// is a `MalformedOutput`. Extra picks beyond `picked` are dropped.
pub async fn rank(
    completions: &mut Completions,
    stage: &StageConfig,
    prompt: &str,
    results: &[SearchResult],
    picked: usize,
) -> WebAskResult<Vec<SearchResult>> {
    let response = completions
        .complete(stage.request(messages(prompt, results, picked)?))
        .await?;

    let mut ranked: Vec<SearchResult> = extract_json(&response.message)?;
    if ranked.len() > picked {
        debug!(returned = ranked.len(), picked, "model picked too many results");
        ranked.truncate(picked);
    }
    Ok(ranked)
}
