use anyhow::Result;

use webask::models::message::Message;
use webask::prompt_template::ASSISTANT_SYSTEM;

use crate::output::print_response;
use crate::setup::{self, ASK};
use crate::CompletionArgs;

pub async fn execute(args: &CompletionArgs, prompt: &str) -> Result<()> {
    let settings = setup::load_settings(args)?;
    let mut completions = setup::completions(&settings, setup::stage(args, &settings, ASK))?;

    let response = completions
        .create(vec![Message::system(ASSISTANT_SYSTEM), Message::user(prompt)])
        .await?;
    print_response(&response, args.stats)
}
