use anyhow::Result;
use bat::PrettyPrinter;
use console::style;
use serde_json::json;

use webask::completions::Completions;
use webask::models::completion::CompletionResponse;
use webask::pipeline::WebAnswer;

pub fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()?;
    println!();
    Ok(())
}

/// The reply text, or the whole response with `--stats`
pub fn print_response(response: &CompletionResponse, stats: bool) -> Result<()> {
    if stats {
        println!("{}", serde_json::to_string_pretty(response)?);
        Ok(())
    } else {
        render(&response.message)
    }
}

pub fn print_no_search(answer: &str) {
    println!(
        "{}",
        style("The LLM answer didn't meet the criteria in order to search the web. Please try again.")
            .yellow()
    );
    println!("{} {}", style("LLM answer:").bold(), answer);
}

pub fn print_answer(answer: &WebAnswer) -> Result<()> {
    println!();
    render(&answer.summary)?;
    println!();
    println!("{} {}", style("Sources:").bold().green(), answer.domains.join(", "));
    println!("{} {}", style("URLs:").bold().green(), answer.urls.join(", "));
    println!();
    println!("{} {}", style("Tokens used:").bold(), answer.used_tokens);
    Ok(())
}

/// Every call of the run with its usage
pub fn print_session(completions: &Completions) -> Result<()> {
    let session = completions.session();
    let report = json!({
        "model": session.model,
        "used_tokens": session.used_tokens,
        "responses": session.responses,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
