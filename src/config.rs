#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runtime configuration sourced from the environment.
//!
//! The config is an explicit value handed to whoever builds the grading
//! capability; nothing here is global.

use std::time::Duration;

use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Default completion budget per grading call.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default per-call deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default number of grading calls in flight.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Settings for the grading capability and the grader.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GraderConfig {
    /// Base URL of the OpenAI-compatible API.
    #[builder(default = DEFAULT_API_BASE.to_string(), setter(into))]
    api_base:    String,
    /// API key; only required for live grading.
    #[builder(default, setter(strip_option, into))]
    api_key:     Option<String>,
    /// Model identifier sent with every call.
    #[builder(default = DEFAULT_MODEL.to_string(), setter(into))]
    model:       String,
    /// Optional sampling temperature.
    #[builder(default, setter(strip_option))]
    temperature: Option<f32>,
    /// Optional nucleus sampling cutoff.
    #[builder(default, setter(strip_option))]
    top_p:       Option<f32>,
    /// Completion budget per call.
    #[builder(default = DEFAULT_MAX_TOKENS)]
    max_tokens:  u32,
    /// Per-call deadline.
    #[builder(default = Duration::from_secs(DEFAULT_TIMEOUT_SECS))]
    timeout:     Duration,
    /// Upper bound on simultaneous grading calls.
    #[builder(default = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GraderConfig {
    /// Reads configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let api_base = env_string("OPENAI_ENDPOINT").unwrap_or_else(|| DEFAULT_API_BASE.into());
        let api_key = env_string("OPENAI_API_KEY").or_else(|| env_string("ANTHROPIC_API_KEY"));
        let model = env_string("QUIZGRADE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());

        Self {
            api_base,
            api_key,
            model,
            temperature: env_parse("QUIZGRADE_TEMPERATURE"),
            top_p: env_parse("QUIZGRADE_TOP_P"),
            max_tokens: env_parse("QUIZGRADE_MAX_TOKENS").unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_secs(
                env_parse("QUIZGRADE_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            concurrency: env_parse("QUIZGRADE_CONCURRENCY").unwrap_or(DEFAULT_CONCURRENCY),
        }
    }

    /// Replaces the model when an override is given.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    /// Replaces the concurrency bound when an override is given.
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        if let Some(concurrency) = concurrency {
            self.concurrency = concurrency;
        }
        self
    }

    /// Returns the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the API key, or a [`ConfigError`] when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the configured temperature, if any.
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Returns the configured top_p, if any.
    pub fn top_p(&self) -> Option<f32> {
        self.top_p
    }

    /// Returns the completion budget per call.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Returns the per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the concurrency bound, never less than one.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Reads a trimmed, non-empty environment variable.
fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parses an environment variable, warning when it is set but unusable.
fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = env_string(var)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = GraderConfig::default();
        assert_eq!(cfg.model(), DEFAULT_MODEL);
        assert_eq!(cfg.max_tokens(), 1024);
        assert_eq!(cfg.concurrency(), 1);
        assert!(matches!(cfg.require_api_key(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn overrides_apply_only_when_present() {
        let cfg = GraderConfig::builder()
            .model("base-model")
            .api_key("k")
            .build()
            .with_model(None)
            .with_concurrency(Some(0));
        assert_eq!(cfg.model(), "base-model");
        assert_eq!(cfg.concurrency(), 1);
        assert_eq!(cfg.require_api_key().unwrap(), "k");

        let cfg = cfg.with_model(Some("other".into())).with_concurrency(Some(4));
        assert_eq!(cfg.model(), "other");
        assert_eq!(cfg.concurrency(), 4);
    }
}
