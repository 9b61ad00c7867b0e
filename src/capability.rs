#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The external grading capability.
//!
//! The grader only ever sees the [`GradingCapability`] trait, so tests can
//! swap in deterministic stubs.

use std::time::Duration;

use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

use crate::{
    config::GraderConfig,
    error::{CapabilityError, ConfigError},
};

/// A text-completion service that grades one answer per call.
#[async_trait]
pub trait GradingCapability: Send + Sync {
    /// Sends one system/user prompt pair and returns the raw response text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, CapabilityError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiCapability {
    /// Underlying API client.
    client:      OpenAIClient<OpenAIConfig>,
    /// Optional sampling temperature.
    temperature: Option<f32>,
    /// Optional nucleus sampling cutoff.
    top_p:       Option<f32>,
    /// Completion budget per call.
    max_tokens:  u32,
    /// Per-call deadline.
    timeout:     Duration,
}

impl OpenAiCapability {
    /// Builds a client from config. Fails without an API key.
    pub fn new(config: &GraderConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ConfigError::HttpClient)?;

        let client = OpenAIClient::with_config(
            OpenAIConfig::new()
                .with_api_base(config.api_base())
                .with_api_key(api_key),
        )
        .with_http_client(http_client);

        Ok(Self {
            client,
            temperature: config.temperature(),
            top_p: config.top_p(),
            max_tokens: config.max_tokens(),
            timeout: config.timeout(),
        })
    }

    /// Sends the request without the deadline applied.
    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, CapabilityError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.to_string())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt.to_string())
                .build()?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(messages)
            .max_completion_tokens(self.max_tokens)
            .n(1);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            args.top_p(top_p);
        }
        let request = args.build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CapabilityError::EmptyResponse)
    }
}

#[async_trait]
impl GradingCapability for OpenAiCapability {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, CapabilityError> {
        tokio::time::timeout(self.timeout, self.request(system_prompt, user_prompt, model))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout))?
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}
