pub mod completions;
pub mod config;
pub mod errors;
pub mod json_block;
pub mod models;
pub mod pipeline;
pub mod prompt_template;
pub mod providers;
pub mod rate_limiter;
pub mod render;
pub mod sanitize;
pub mod search;
pub mod stages;
pub mod token_counter;
