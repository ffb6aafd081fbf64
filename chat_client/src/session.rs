use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::agent::{Agent, AgentError, ChatMessage};
use crate::notes::NotesStore;
use crate::speech::SpeechDispatcher;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyInput,

    #[error(transparent)]
    Agent(#[from] AgentError),
}

const NOTE_USAGE: &str = "usage: /note <category>: <text>";

/// Turn history plus the agent and (optional) voice that answer it.
pub struct ChatSession {
    agent: Arc<dyn Agent>,
    speech: Option<SpeechDispatcher>,
    history: Vec<ChatMessage>,
    notes: NotesStore,
}

impl ChatSession {
    /// `speech: None` keeps the session silent.
    pub fn new(agent: Arc<dyn Agent>, speech: Option<SpeechDispatcher>) -> Self {
        Self {
            agent,
            speech,
            history: Vec::new(),
            notes: NotesStore::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn notes(&self) -> &NotesStore {
        &self.notes
    }

    /// Run a `/note` or `/notes` command. Returns `None` for anything else.
    ///
    /// Commands never reach the agent and never touch the history.
    pub fn handle_command(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "/notes" => Some(self.notes.render((!rest.is_empty()).then_some(rest))),
            "/note" => {
                let Some((category, note)) = rest.split_once(':') else {
                    return Some(NOTE_USAGE.to_string());
                };
                Some(match self.notes.add(category, note) {
                    Ok(()) => format!("Added note to {}", category.trim()),
                    Err(e) => format!("{e} ({NOTE_USAGE})"),
                })
            }
            _ => None,
        }
    }

    /// Send one user turn and return the agent's reply.
    ///
    /// The user turn is recorded even when the agent fails. Speaking the
    /// reply can never fail this call.
    pub async fn send_message(&mut self, input: &str) -> Result<String, ChatError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let prior = self.history.len();
        self.history.push(ChatMessage::user(input));

        let reply = self
            .agent
            .respond(input, &self.history[..prior])
            .await
            .inspect_err(|e| warn!("Agent failed: {e}"))?;
        info!(chars = reply.chars().count(), "Agent replied");
        self.history.push(ChatMessage::assistant(reply.clone()));

        if let Some(speech) = &self.speech {
            speech.speak(&reply).await;
        }
        Ok(reply)
    }
}
