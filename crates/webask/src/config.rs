//! Layered settings: built-in defaults, then `webask.toml`, then `WEBASK_*`
//! environment variables (`WEBASK_PROVIDER__API_KEY`, `WEBASK_SCRAPE__RENDERER`, ...).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::models::completion::StageConfig;
use crate::pipeline::{PipelineConfig, DEFAULT_FAST_MODEL, DEFAULT_STRONG_MODEL};
use crate::providers::openai::{OpenAiProviderConfig, OPENAI_HOST};
use crate::rate_limiter::{RateLimits, DEFAULT_REQUESTS_PER_MINUTE, DEFAULT_TOKENS_PER_MINUTE};
use crate::render::{RendererKind, DEFAULT_RENDER_TIMEOUT};
use crate::search::GOOGLE_HOST;
use crate::stages::rank::DEFAULT_PICKED_RESULTS;

const ENV_PREFIX: &str = "WEBASK";
const CONFIG_FILE: &str = "webask.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting, set it with the {env_var} environment variable")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// `provider.api_key` -> `WEBASK_PROVIDER__API_KEY`
pub fn to_env_var(field: &str) -> String {
    format!("{}_{}", ENV_PREFIX, field.replace('.', "__").to_uppercase())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: default_openai_host(),
            api_key: None,
            organization: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u64,
    #[serde(default = "default_tokens_per_minute")]
    pub tokens_per_minute: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            tokens_per_minute: default_tokens_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_engine_url")]
    pub engine_url: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeSettings {
    #[serde(default)]
    pub renderer: RendererKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl ScrapeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    #[serde(default = "default_strong_model")]
    pub strong_model: String,
    #[serde(default = "default_picked_results")]
    pub picked_results: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fast_model: default_fast_model(),
            strong_model: default_strong_model(),
            picked_results: default_picked_results(),
        }
    }
}

/// Values given on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scrape: ScrapeSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

impl Settings {
    /// Load from the user config file and the environment
    pub fn new(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load(default_config_file().as_deref(), overrides)
    }

    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("provider.api_key", overrides.api_key.clone())?
            .set_override_option("provider.organization", overrides.organization.clone())?
            .build()?;

        // Every field has a default, so only a bad value can fail here
        let settings: Settings = config.try_deserialize()?;

        if settings.provider.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("provider.api_key"),
            });
        }
        Ok(settings)
    }

    pub fn provider_config(&self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.provider.host.clone(),
            api_key: self.provider.api_key.clone().unwrap_or_default(),
            organization: self.provider.organization.clone(),
        }
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            requests_per_minute: self.limits.requests_per_minute,
            tokens_per_minute: self.limits.tokens_per_minute,
        }
    }

    /// Pipeline settings around the fast `stage`
    pub fn pipeline_config(&self, stage: StageConfig) -> PipelineConfig {
        PipelineConfig {
            fast: stage,
            strong_model: self.pipeline.strong_model.clone(),
            picked_results: self.pipeline.picked_results,
            scrape_concurrency: self.scrape.concurrency.max(1),
        }
    }
}

/// `<config dir>/webask/webask.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("webask").join(CONFIG_FILE))
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_requests_per_minute() -> u64 {
    DEFAULT_REQUESTS_PER_MINUTE
}

fn default_tokens_per_minute() -> u64 {
    DEFAULT_TOKENS_PER_MINUTE
}

fn default_engine_url() -> String {
    GOOGLE_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_RENDER_TIMEOUT.as_secs()
}

fn default_concurrency() -> usize {
    1
}

fn default_fast_model() -> String {
    DEFAULT_FAST_MODEL.to_string()
}

fn default_strong_model() -> String {
    DEFAULT_STRONG_MODEL.to_string()
}

fn default_picked_results() -> usize {
    DEFAULT_PICKED_RESULTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("WEBASK_") {
                env::remove_var(&key);
            }
        }
    }

    fn with_key() -> Overrides {
        Overrides {
            api_key: Some("test-key".to_string()),
            organization: None,
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::load(None, &with_key()).unwrap();
        assert_eq!(settings.provider.host, "https://api.openai.com");
        assert_eq!(settings.limits.requests_per_minute, 10_000);
        assert_eq!(settings.limits.tokens_per_minute, 200_000);
        assert_eq!(settings.search.engine_url, "https://www.google.com");
        assert_eq!(settings.scrape.renderer, RendererKind::Browser);
        assert_eq!(settings.scrape.timeout(), Duration::from_secs(60));
        assert_eq!(settings.scrape.concurrency, 1);
        assert_eq!(settings.pipeline.fast_model, "gpt-4o-mini");
        assert_eq!(settings.pipeline.strong_model, "gpt-4o");
        assert_eq!(settings.pipeline.picked_results, 3);
        assert_eq!(settings.provider_config().api_key, "test-key");
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        let err = Settings::load(None, &Overrides::default()).unwrap_err();
        match err {
            ConfigError::MissingEnvVar { env_var } => {
                assert_eq!(env_var, "WEBASK_PROVIDER__API_KEY")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("WEBASK_PROVIDER__API_KEY", "env-key");
        env::set_var("WEBASK_LIMITS__TOKENS_PER_MINUTE", "30000");
        env::set_var("WEBASK_SCRAPE__RENDERER", "http");
        env::set_var("WEBASK_SCRAPE__CONCURRENCY", "4");

        let settings = Settings::load(None, &Overrides::default()).unwrap();
        assert_eq!(settings.provider.api_key.as_deref(), Some("env-key"));
        assert_eq!(settings.rate_limits().tokens_per_minute, 30_000);
        assert_eq!(settings.scrape.renderer, RendererKind::Http);

        let pipeline = settings.pipeline_config(StageConfig::new("gpt-4o-mini", 0.4, 500_000));
        assert_eq!(pipeline.scrape_concurrency, 4);

        // Command line wins over the environment
        let settings = Settings::load(None, &with_key()).unwrap();
        assert_eq!(settings.provider.api_key.as_deref(), Some("test-key"));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_config_file() {
        clean_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[provider]\nhost = \"https://proxy.example.com\"\norganization = \"org-1\"\n\n[pipeline]\nstrong_model = \"gpt-4-turbo\"\npicked_results = 5"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path()), &with_key()).unwrap();
        assert_eq!(settings.provider.host, "https://proxy.example.com");
        assert_eq!(settings.provider.organization.as_deref(), Some("org-1"));
        assert_eq!(settings.pipeline.strong_model, "gpt-4-turbo");
        assert_eq!(settings.pipeline.picked_results, 5);
        assert_eq!(settings.pipeline.fast_model, "gpt-4o-mini");
    }

    #[test]
    #[serial]
    fn test_missing_file_is_ignored() {
        clean_env();
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("absent.toml")), &with_key()).unwrap();
        assert_eq!(settings.pipeline.picked_results, 3);
    }

    #[test]
    #[serial]
    fn test_invalid_value_is_reported_as_is() {
        clean_env();
        env::set_var("WEBASK_SCRAPE__RENDERER", "chrome");

        let err = Settings::load(None, &with_key()).unwrap_err();
        assert!(matches!(err, ConfigError::Other(_)), "unexpected error: {err:?}");
        assert!(err.to_string().contains("chrome"));

        clean_env();
    }

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("scrape.timeout_secs"), "WEBASK_SCRAPE__TIMEOUT_SECS");
    }
}
