//! UI-agnostic data types
//!
//! Messages, sessions and users as the backend sends them, shared between
//! the view-state modules and any front end.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Longest session preview shown before it is cut with "..."
pub const PREVIEW_MAX_CHARS: usize = 50;

/// A chat message in a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "role")]
    pub sender: ChatRole,
    #[serde(rename = "content")]
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == ChatRole::User
    }
}

/// Who sent a chat message. Any role the backend sends other than `user`
/// is shown as the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(other)]
    Assistant,
}

/// A stored conversation, owned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "session_id")]
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl Session {
    /// First user message, truncated, or "New Chat" when there is none
    pub fn preview(&self) -> String {
        let first = self
            .messages
            .iter()
            .find(|m| m.is_user())
            .map(|m| m.text.as_str())
            .unwrap_or("New Chat");

        if first.chars().count() > PREVIEW_MAX_CHARS {
            let cut: String = first.chars().take(PREVIEW_MAX_CHARS).collect();
            format!("{}...", cut)
        } else {
            first.to_string()
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Creation time as "Mon D, HH:MM"; unparseable timestamps are shown as-is
    pub fn created_label(&self) -> String {
        const LABEL: &str = "%b %-d, %H:%M";

        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.created_at) {
            return dt.format(LABEL).to_string();
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f") {
            return dt.format(LABEL).to_string();
        }
        self.created_at.clone()
    }
}

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Student,
    Teacher,
    Admin,
    #[serde(other)]
    Other,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
            UserType::Admin => "admin",
            UserType::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserType::Student => "Student",
            UserType::Teacher => "Teacher",
            UserType::Admin => "Admin",
            UserType::Other => "Other",
        }
    }
}
