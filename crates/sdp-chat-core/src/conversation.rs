//! Conversation view state
//!
//! Everything the chat screen shows lives in [`Conversation`] and only
//! changes through its transition methods, so behaviour can be tested without
//! a terminal or a backend.

use serde::{Deserialize, Serialize};

use crate::api::ChatReply;
use crate::state::{ChatMessage, Session};

/// Assistant message shown when a chat request fails
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// A question accepted by [`Conversation::submit`] that still has to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub question: String,
    /// `None` starts a new session on the backend
    pub session_id: Option<String>,
    pub epoch: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub loading: bool,
    pub session_id: Option<String>,
    pub sessions: Vec<Session>,
    /// Bumped whenever the transcript is swapped out; replies tagged with an
    /// older epoch belong to a conversation that is no longer shown.
    pub epoch: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything, e.g. on sign-out. The epoch keeps counting so replies
    /// to the previous user's questions are still recognised as stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Self::new()
        };
    }

    pub fn new_conversation(&mut self) {
        self.session_id = None;
        self.messages.clear();
        self.input.clear();
        self.loading = false;
        self.epoch += 1;
    }

    /// Take the current input as a question.
    ///
    /// Returns `None` when the input is blank or a reply is still pending.
    pub fn submit(&mut self) -> Option<PendingQuestion> {
        if self.loading {
            return None;
        }
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return None;
        }

        self.input.clear();
        self.messages.push(ChatMessage::user(question.clone()));
        self.loading = true;

        Some(PendingQuestion {
            question,
            session_id: self.session_id.clone(),
            epoch: self.epoch,
        })
    }

    /// Apply a backend answer. Returns false if the reply was stale.
    pub fn receive_answer(&mut self, epoch: u64, reply: ChatReply) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.messages.push(ChatMessage::assistant(reply.answer));
        self.session_id = Some(reply.session_id);
        self.loading = false;
        true
    }

    /// Record a failed request. Returns false if the request was stale.
    pub fn receive_error(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.messages.push(ChatMessage::assistant(ERROR_REPLY));
        self.loading = false;
        true
    }

    pub fn sessions_loaded(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
    }

    pub fn select_session(&mut self, session: &Session) {
        self.session_id = Some(session.id.clone());
        self.messages = session.messages.clone();
        self.loading = false;
        self.epoch += 1;
    }

    pub fn session_deleted(&mut self, id: &str) {
        self.sessions.retain(|s| s.id != id);
        if self.is_current(id) {
            self.session_id = None;
            self.messages.clear();
            self.loading = false;
            self.epoch += 1;
        }
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.session_id.as_deref() == Some(id)
    }

    pub fn transcript_is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Position of the current session in the sidebar list
    pub fn current_session_index(&self) -> Option<usize> {
        let id = self.session_id.as_deref()?;
        self.sessions.iter().position(|s| s.id == id)
    }
}
