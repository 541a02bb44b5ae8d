use serde::{Deserialize, Serialize};

use crate::state::User;

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub question: &'a str,
    pub session_id: Option<&'a str>,
}

/// Answer to a chat question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    /// Session the answer was stored under; new for a fresh conversation
    pub session_id: String,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Deserialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

/// Result of a successful login: both the token and the profile it unlocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedIn {
    pub token: String,
    pub user: User,
}

/// Result of a registration. Some backends hand out a token right away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Registered {
    #[serde(default)]
    pub token: Option<String>,
}
