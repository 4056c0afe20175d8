//! Chat transcript built from the agent's dialogue history.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case::Persona;
use crate::state::DialogueTurn;

/// Speaker name the agent uses for the trainee.
const USER_SPEAKER: &str = "user";

/// Who authored a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    User,
    System,
    /// A persona, by persona id.
    Persona(String),
}

impl Sender {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Persona(id) => id,
        }
    }
}

impl From<String> for Sender {
    fn from(s: String) -> Self {
        match s.as_str() {
            "user" => Self::User,
            "system" => Self::System,
            _ => Self::Persona(s),
        }
    }
}

impl From<Sender> for String {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::Persona(id) => id,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as shown to the trainee and stored in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    /// Original speaker name from the dialogue history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: format!("local-{}", uuid::Uuid::new_v4()),
            sender: Sender::User,
            text: text.into(),
            speaker_name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            id: format!("sys-{}", uuid::Uuid::new_v4()),
            sender: Sender::System,
            text: text.into(),
            speaker_name: None,
        }
    }

    /// Display name: persona name, original speaker, or a fallback by sender kind.
    pub fn display_name<'a>(&'a self, personas: &'a BTreeMap<String, Persona>) -> &'a str {
        match &self.sender {
            Sender::User => "You",
            Sender::Persona(id) => personas
                .values()
                .find(|p| &p.id == id)
                .map(|p| p.name.as_str())
                .unwrap_or(id.as_str()),
            Sender::System => self.speaker_name.as_deref().unwrap_or("System"),
        }
    }
}

/// Ordered chat messages for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript from a full dialogue history.
    pub fn from_dialogue(history: &[DialogueTurn], personas: &BTreeMap<String, Persona>) -> Self {
        let mut transcript = Self::new();
        transcript.replace_from_dialogue(history, personas);
        transcript
    }

    /// Replace all messages with the agent's dialogue history.
    ///
    /// Speakers are resolved to persona ids by matching the persona's display
    /// name; unknown speakers are attributed to the system.
    pub fn replace_from_dialogue(
        &mut self,
        history: &[DialogueTurn],
        personas: &BTreeMap<String, Persona>,
    ) {
        self.messages = history
            .iter()
            .enumerate()
            .map(|(index, turn)| ChatMessage {
                id: format!("hist-{}", index),
                sender: resolve_sender(&turn.speaker, personas),
                text: turn.content.clone(),
                speaker_name: Some(turn.speaker.clone()),
            })
            .collect();
    }

    /// Append the trainee's input ahead of the agent's response.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Append an inline error authored by the system.
    pub fn push_system_error(&mut self, detail: impl fmt::Display) {
        self.messages.push(ChatMessage::system(format!(
            "Error: could not send message. {}",
            detail
        )));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn resolve_sender(speaker: &str, personas: &BTreeMap<String, Persona>) -> Sender {
    if speaker == USER_SPEAKER {
        return Sender::User;
    }
    personas
        .values()
        .find(|p| p.name == speaker)
        .map(|p| Sender::Persona(p.id.clone()))
        .unwrap_or(Sender::System)
}
