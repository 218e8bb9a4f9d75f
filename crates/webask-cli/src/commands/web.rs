use anyhow::Result;

use webask::pipeline::{PipelineOutcome, QueryDecision, SearchFindings};

use crate::output::{print_answer, print_no_search, print_response, print_session};
use crate::setup::{self, SEARCH, WEB};
use crate::CompletionArgs;

fn print_findings(outcome: PipelineOutcome<SearchFindings>) -> Result<()> {
    match outcome {
        PipelineOutcome::Answered(findings) => {
            println!("{}", serde_json::to_string_pretty(&findings.results)?);
        }
        PipelineOutcome::NoSearch { answer } => print_no_search(&answer),
    }
    Ok(())
}

pub async fn search_query(args: &CompletionArgs, prompt: &str) -> Result<()> {
    let settings = setup::load_settings(args)?;
    let mut pipeline = setup::pipeline(&settings, setup::stage(args, &settings, SEARCH))?;

    let decision = pipeline.decide_query(prompt).await?;
    if args.stats {
        if let Some(response) = pipeline.completions().session().responses.last() {
            return print_response(response, true);
        }
    }
    match decision {
        QueryDecision::Search(query) => println!("{}", query),
        QueryDecision::NoSearch(answer) => print_no_search(&answer),
    }
    Ok(())
}

pub async fn surf(args: &CompletionArgs, prompt: &str) -> Result<()> {
    let settings = setup::load_settings(args)?;
    let mut pipeline = setup::pipeline(&settings, setup::stage(args, &settings, SEARCH))?;

    print_findings(pipeline.surf(prompt).await?)?;
    if args.stats {
        print_session(pipeline.completions())?;
    }
    Ok(())
}

pub async fn rank(args: &CompletionArgs, prompt: &str) -> Result<()> {
    let settings = setup::load_settings(args)?;
    let mut pipeline = setup::pipeline(&settings, setup::stage(args, &settings, SEARCH))?;

    print_findings(pipeline.rank(prompt).await?)?;
    if args.stats {
        print_session(pipeline.completions())?;
    }
    Ok(())
}

pub async fn execute(args: &CompletionArgs, prompt: &str) -> Result<()> {
    let settings = setup::load_settings(args)?;
    let mut pipeline = setup::pipeline(&settings, setup::stage(args, &settings, WEB))?;

    match pipeline.run(prompt).await? {
        PipelineOutcome::Answered(answer) => print_answer(&answer)?,
        PipelineOutcome::NoSearch { answer } => print_no_search(&answer),
    }
    if args.stats {
        print_session(pipeline.completions())?;
    }
    Ok(())
}
