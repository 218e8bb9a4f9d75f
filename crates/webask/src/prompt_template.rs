use serde::Serialize;
use tera::{Context, Tera};

use crate::errors::WebAskResult;

pub const SEARCH_QUERY_SYSTEM: &str = include_str!("prompts/search_query.md");
pub const RANK_SYSTEM: &str = include_str!("prompts/rank_system.md");
pub const RANK_INSTRUCTIONS: &str = include_str!("prompts/rank_instructions.md");
pub const DISTILL_SYSTEM: &str = include_str!("prompts/distill_system.md");
pub const DISTILL_INSTRUCTIONS: &str = include_str!("prompts/distill_instructions.md");
pub const SUMMARIZE_SYSTEM: &str = include_str!("prompts/summarize_system.md");
pub const ASSISTANT_SYSTEM: &str = "You are a helpful assistant.";

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> WebAskResult<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WebAskError;
    use std::collections::HashMap;

    #[test]
    fn test_rank_instructions_without_pick_count() {
        let context: HashMap<String, usize> = HashMap::new();
        let err = load_prompt(RANK_INSTRUCTIONS, &context).unwrap_err();
        assert!(matches!(err, WebAskError::Prompt(_)));
    }

    #[test]
    fn test_rendered_rank_instructions_are_complete() {
        let rendered = load_prompt(RANK_INSTRUCTIONS, &serde_json::json!({ "picked": 5 })).unwrap();
        assert!(!rendered.contains("{{"));
        assert_eq!(rendered, rendered.trim());
        assert!(rendered.ends_with("inside a ```json fenced block."));
    }

    #[test]
    fn test_rank_instructions_mention_pick_count() {
        let mut context = HashMap::new();
        context.insert("picked", 3);
        let rendered = load_prompt(RANK_INSTRUCTIONS, &context).unwrap();
        assert!(rendered.contains("3 best results"));
    }

    #[test]
    fn test_search_query_prompt_keeps_signal_phrase() {
        assert!(SEARCH_QUERY_SYSTEM.contains("Searching the web for: "));
    }
}
