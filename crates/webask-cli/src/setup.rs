use anyhow::{Context, Result};
use std::env;

use webask::completions::Completions;
use webask::config::{ConfigError, Overrides, Settings};
use webask::models::completion::StageConfig;
use webask::pipeline::WebPipeline;
use webask::providers::openai::OpenAiProvider;
use webask::search::GoogleSearch;
use webask::stages::scrape::ScrapeStage;

use crate::CompletionArgs;

/// Token budget and temperature a command uses when no flag overrides them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandDefaults {
    pub max_tokens: usize,
    pub temperature: f32,
}

pub const ASK: CommandDefaults = CommandDefaults {
    max_tokens: 1_000,
    temperature: 0.5,
};
pub const HTML: CommandDefaults = CommandDefaults {
    max_tokens: 10_000,
    temperature: 0.1,
};
pub const SEARCH: CommandDefaults = CommandDefaults {
    max_tokens: 10_000,
    temperature: 0.6,
};
pub const WEB: CommandDefaults = CommandDefaults {
    max_tokens: 500_000,
    temperature: 0.4,
};

pub fn load_settings(args: &CompletionArgs) -> Result<Settings> {
    let overrides = Overrides {
        api_key: args
            .api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok()),
        organization: args.org_id.clone(),
    };

    Settings::new(&overrides).map_err(|err| match err {
        ConfigError::MissingEnvVar { env_var } if env_var.ends_with("PROVIDER__API_KEY") => {
            anyhow::anyhow!(
                "API key must be provided via --api-key, OPENAI_API_KEY or {}",
                env_var
            )
        }
        other => anyhow::Error::new(other).context("Failed to load settings"),
    })
}

/// Stage settings from the flags, falling back to the command defaults
pub fn stage(args: &CompletionArgs, settings: &Settings, defaults: CommandDefaults) -> StageConfig {
    StageConfig::new(
        args.model
            .clone()
            .unwrap_or_else(|| settings.pipeline.fast_model.clone()),
        args.temperature.unwrap_or(defaults.temperature),
        args.tokens.unwrap_or(defaults.max_tokens),
    )
}

pub fn completions(settings: &Settings, stage: StageConfig) -> Result<Completions> {
    let provider = OpenAiProvider::new(settings.provider_config())
        .context("Failed to create the OpenAI provider")?;
    Ok(Completions::new(
        Box::new(provider),
        stage,
        settings.rate_limits(),
    ))
}

pub fn pipeline(settings: &Settings, stage: StageConfig) -> Result<WebPipeline> {
    let search = GoogleSearch::new(settings.search.engine_url.clone())
        .context("Failed to create the search engine client")?;
    let renderer = settings
        .scrape
        .renderer
        .build(settings.scrape.timeout())
        .context("Failed to create the page renderer")?;

    Ok(WebPipeline::new(
        completions(settings, stage.clone())?,
        Box::new(search),
        ScrapeStage::new(renderer),
        settings.pipeline_config(stage),
    ))
}
