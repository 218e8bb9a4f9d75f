//! The steps of a web-grounded answer.
//!
//! Each LLM-backed stage takes the completion client and the `StageConfig`
//! it should run with, builds its conversation and makes exactly one call.

pub mod distill;
pub mod rank;
pub mod scrape;
pub mod search_query;
pub mod summarize;

/// Prefix of the message carrying the user's original question
pub const USER_QUERY_PREFIX: &str = "User query: ";
