use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use soundrent_core::config::{LlmConfig, LlmProvider};

use crate::conversation::{Message, Role};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Free-text reply generator. Never decides prices or selections.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, transcript: &[Message], preamble: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn chat_messages<'a>(transcript: &'a [Message], preamble: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = vec![ChatMessage { role: "system", content: preamble }];
    messages.extend(transcript.iter().filter(|message| !message.is_idle()).map(|message| {
        ChatMessage {
            role: match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &message.content,
        }
    }));
    messages
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().context("failed to build http client")
}

pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self { http: http_client(timeout)?, base_url: base_url.into(), model: model.into() })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, transcript: &[Message], preamble: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let request = OllamaChatRequest {
            model: &self.model,
            messages: chat_messages(transcript, preamble),
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("ollama request to {url} failed"))?
            .error_for_status()
            .context("ollama returned an error status")?;
        let payload: OllamaChatResponse =
            response.json().await.context("ollama response was not valid json")?;
        Ok(payload.message.content)
    }
}

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self { http: http_client(timeout)?, base_url: base_url.into(), model: model.into(), api_key })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, transcript: &[Message], preamble: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request =
            OpenAiChatRequest { model: &self.model, messages: chat_messages(transcript, preamble) };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .context("openai request failed")?
            .error_for_status()
            .context("openai returned an error status")?;
        let payload: OpenAiChatResponse =
            response.json().await.context("openai response was not valid json")?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| anyhow!("openai response had no choices"))
    }
}

/// Returns the same reply on every call. Used for offline runs and tests.
#[derive(Clone, Debug)]
pub struct StaticLlmClient {
    reply: String,
}

impl StaticLlmClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

#[async_trait]
impl LlmClient for StaticLlmClient {
    async fn generate(&self, _transcript: &[Message], _preamble: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Ollama => {
            let base_url = config.base_url.as_deref().context("llm.base_url is required for ollama")?;
            Arc::new(OllamaClient::new(base_url, config.model.clone(), timeout)?)
        }
        LlmProvider::OpenAi => {
            let api_key = config.api_key.clone().context("llm.api_key is required for openai")?;
            let base_url = config.base_url.as_deref().unwrap_or(OPENAI_DEFAULT_BASE_URL);
            Arc::new(OpenAiClient::new(base_url, config.model.clone(), api_key, timeout)?)
        }
        LlmProvider::Static => Arc::new(StaticLlmClient::new(config.static_reply.clone())),
    };
    Ok(client)
}
