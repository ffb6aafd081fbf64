//! Agent dispatch: user input plus prior turns in, reply text out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful study assistant. Answer questions about the user's class notes concisely.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Agent request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Agent returned no reply")]
    NoChoices,
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// `history` holds the turns before `input`, oldest first.
    async fn respond(&self, input: &str, history: &[ChatMessage]) -> Result<String, AgentError>;
}

/// Structure for the OpenAI Chat API request
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: Role,
    content: &'a str,
}

/// Structure for the OpenAI Chat API response
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiAgent {
    api_key: String,
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AgentError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey);
        }
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            api_key,
            client,
            base_url: crate::config::DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            temperature: 0.2,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AgentError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(AgentError::MissingApiKey)?;
        Ok(Self::new(api_key, config.agent_model.clone())?
            .with_base_url(config.openai_base_url.clone())
            .with_temperature(config.agent_temperature))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    async fn respond(&self, input: &str, history: &[ChatMessage]) -> Result<String, AgentError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message {
            role: Role::System,
            content: SYSTEM_PROMPT,
        });
        messages.extend(history.iter().map(|turn| Message {
            role: turn.role,
            content: &turn.content,
        }));
        messages.push(Message {
            role: Role::User,
            content: input,
        });

        let req_body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        debug!(model = %self.model, turns = history.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Agent request rejected");
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response = response.json::<ChatResponse>().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AgentError::NoChoices)
    }
}
