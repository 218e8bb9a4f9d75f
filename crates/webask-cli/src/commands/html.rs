use anyhow::{bail, Context, Result};
use std::path::Path;

use webask::stages::distill::distill_html;

use crate::output::print_response;
use crate::setup::{self, HTML};
use crate::CompletionArgs;

pub fn read_context(path: &Path) -> Result<String> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading context file {}", path.display()))?;
    if html.trim().is_empty() {
        bail!("Context file {} is empty", path.display());
    }
    Ok(html)
}

pub async fn execute(args: &CompletionArgs, input: &Path, prompt: &str) -> Result<()> {
    let html = read_context(input)?;
    let settings = setup::load_settings(args)?;
    let stage = setup::stage(args, &settings, HTML);
    let mut completions = setup::completions(&settings, stage.clone())?;

    let response = distill_html(&mut completions, &stage, prompt, &html).await?;
    print_response(&response, args.stats)
}
