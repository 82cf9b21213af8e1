// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI streaming provider adapter for the Leadflow engine.
//!
//! This crate implements [`ProviderAdapter`] for the OpenAI Chat Completions
//! API. It assembles the sales-persona system prompt (including the
//! qualification marker protocol), converts a lead's chat history into chat
//! messages, and exposes the reply as a token-fragment stream.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use futures::StreamExt;
use leadflow_config::LeadflowConfig;
use leadflow_core::types::{ChatMessage, Sender};
use leadflow_core::{
    AdapterType, HealthStatus, LeadflowError, PluginAdapter, ProviderAdapter, TokenFragment,
    TokenStream,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::sse::StreamEvent;
use crate::types::{ChatMessagePayload, ChatRequest};

/// Built-in sales persona. The closing paragraphs are the marker protocol:
/// the model appends exactly one control character as the absolute last
/// character of its final conversational turn.
const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a friendly, highly professional sales representative for a software \
development company. Engage the visitor, ask at most 3 conversational \
questions (project or need; business or personal; phone number), and guide \
the conversation to either share the demo booking link or politely close \
the chat. Never provide technical support, never output structured data, \
and never tell the visitor how they were classified.

At the very end of your final conversational turn, append exactly one of \
the following single-character markers and nothing after it:
- If you shared the booking link (hot lead or big customer), append: #
- If you politely closed the conversation (weak lead), append: *

Do NOT use the '#' or '*' characters anywhere else in your responses. They \
must only ever appear as the single, absolute last character of your final \
message.";

/// OpenAI provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl OpenAiProvider {
    /// Creates a new OpenAI provider from the given configuration.
    ///
    /// # System Prompt Resolution
    /// 1. `config.agent.system_prompt_file` if set and readable
    /// 2. `config.agent.system_prompt` if set
    /// 3. Built-in sales persona with the marker protocol
    pub async fn new(config: &LeadflowConfig) -> Result<Self, LeadflowError> {
        let api_key = resolve_api_key(&config.openai.api_key)?;
        let system_prompt =
            load_system_prompt(&config.agent.system_prompt, &config.agent.system_prompt_file)
                .await;

        let client = OpenAiClient::new(api_key, config.openai.api_base.clone())?;

        info!(model = config.openai.model, "OpenAI provider initialized");

        Ok(Self {
            client,
            model: config.openai.model.clone(),
            max_tokens: config.openai.max_tokens,
            system_prompt,
        })
    }

    /// Creates a provider with explicit parts (for testing).
    pub fn with_client(
        client: OpenAiClient,
        model: String,
        max_tokens: u32,
        system_prompt: String,
    ) -> Self {
        Self {
            client,
            model,
            max_tokens,
            system_prompt,
        }
    }

    /// Converts a lead's chat history into the chat completion message list,
    /// with the persona prompt first.
    fn prepare_messages(&self, history: &[ChatMessage]) -> Vec<ChatMessagePayload> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessagePayload::system(self.system_prompt.clone()));
        for msg in history {
            messages.push(match msg.sender {
                Sender::User => ChatMessagePayload::user(msg.text.clone()),
                Sender::Ai => ChatMessagePayload::assistant(msg.text.clone()),
            });
        }
        messages
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        // We avoid consuming tokens on health checks; a constructable client
        // with a resolved key counts as healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn stream_turn(
        &self,
        history: &[ChatMessage],
    ) -> Result<TokenStream, LeadflowError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.prepare_messages(history),
            max_tokens: Some(self.max_tokens),
            stream: true,
        };

        debug!(
            messages = request.messages.len(),
            model = self.model,
            "opening completion stream"
        );

        let event_stream = self.client.stream_chat(&request).await?;

        // The [DONE] sentinel becomes natural stream end; everything before
        // it is a token fragment.
        let fragments = event_stream
            .take_while(|item| {
                let done = matches!(item, Ok(StreamEvent::Done));
                async move { !done }
            })
            .filter_map(|item| async move {
                match item {
                    Ok(StreamEvent::Delta(text)) => Some(Ok(TokenFragment { text })),
                    Ok(StreamEvent::Done) => None,
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(Box::pin(fragments))
    }
}

/// Resolve the API key from config or the environment.
fn resolve_api_key(configured: &Option<String>) -> Result<String, LeadflowError> {
    if let Some(key) = configured {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }
    std::env::var("OPENAI_API_KEY").map_err(|_| {
        LeadflowError::Config(
            "no OpenAI API key: set openai.api_key or the OPENAI_API_KEY environment variable"
                .to_string(),
        )
    })
}

/// Resolve the persona system prompt (file > inline > built-in default).
async fn load_system_prompt(inline: &Option<String>, file: &Option<String>) -> String {
    if let Some(path) = file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => return content,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "failed to read system prompt file, falling back");
            }
        }
    }
    inline
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}
