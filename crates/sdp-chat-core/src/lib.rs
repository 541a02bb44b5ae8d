pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod render;
pub mod state;

// Re-export main types for convenience
pub use admin::{AdminPanel, StatusKind, StatusMessage, UploadFile};
pub use api::{ApiClient, ApiError, ChatReply, LoggedIn, Registered};
pub use auth::{guard, AuthState, LoginForm, RegisterForm, Route};
pub use config::Config;
pub use conversation::{Conversation, PendingQuestion, ERROR_REPLY};
pub use render::{parse_inline, render, render_with, InlineSpan, MarkdownSubset, RenderedBlock};
pub use state::{ChatMessage, ChatRole, Session, User, UserType};
