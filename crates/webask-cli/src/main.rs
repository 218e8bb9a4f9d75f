use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use webask::errors::WebAskError;

mod commands;
mod output;
mod setup;

use commands::{ask, html, version, web};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    completion: CompletionArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every command that talks to the model
#[derive(Args, Debug, Clone, Default)]
pub struct CompletionArgs {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// OpenAI organization id sent with every request
    #[arg(long, global = true)]
    pub org_id: Option<String>,

    /// Model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Maximum input tokens of a single request
    #[arg(short, long, global = true)]
    pub tokens: Option<usize>,

    /// Sampling temperature, between 0 and 2
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Print the full completion responses instead of the text only
    #[arg(long, global = true)]
    pub stats: bool,

    /// Log every pipeline step
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the model directly
    Ask {
        /// The question or instruction for the model
        prompt: String,
    },

    /// Answer from the content of an HTML file
    Html {
        /// The HTML file to use as context
        #[arg(short, long)]
        input: PathBuf,

        /// The question or instruction about the HTML content
        prompt: String,
    },

    /// Get the best web search query for a question
    SearchQuery { prompt: String },

    /// Search the web for a question and list the results
    Surf { prompt: String },

    /// Search the web and keep the results the model trusts most
    Rank { prompt: String },

    /// Answer a question from real web pages
    Web { prompt: String },

    /// Print the version
    Version,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "webask=debug" } else { "webask=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let args = cli.completion;
    match cli.command {
        Command::Ask { prompt } => ask::execute(&args, &prompt).await,
        Command::Html { input, prompt } => html::execute(&args, &input, &prompt).await,
        Command::SearchQuery { prompt } => web::search_query(&args, &prompt).await,
        Command::Surf { prompt } => web::surf(&args, &prompt).await,
        Command::Rank { prompt } => web::rank(&args, &prompt).await,
        Command::Web { prompt } => web::execute(&args, &prompt).await,
        Command::Version => version::execute().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.completion.verbose);

    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(raw) = err.downcast_ref::<WebAskError>().and_then(|e| e.raw_output()) {
            eprintln!("{}", style("Model output:").yellow().bold());
            eprintln!("{}", raw);
        }
    }
    result
}
