use serde_json::Value;
use thiserror::Error;

pub const UNREACHABLE_MESSAGE: &str =
    "No response from server. Please check if the backend is running.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("server returned {status}: {}", summarize(.detail, .message))]
    Server {
        status: u16,
        detail: Option<String>,
        message: Option<String>,
    },

    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable(#[source] reqwest::Error),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("unexpected response from server: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build a `Server` error from a failed response body
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let detail = json.as_ref().and_then(|v| detail_text(v.get("detail")?));
        let message = json
            .as_ref()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string));

        ApiError::Server {
            status,
            detail,
            message,
        }
    }

    /// Map a transport error, separating "nobody answered" from the rest
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Unreachable(err)
        } else if err.is_decode() {
            ApiError::Decode(err)
        } else {
            ApiError::Request(err)
        }
    }

    /// The server's `detail` explanation, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The server's `message` field, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text for a form's error line: the server detail, the unreachable
    /// notice, or `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }
}

fn summarize<'a>(detail: &'a Option<String>, message: &'a Option<String>) -> &'a str {
    detail
        .as_deref()
        .or(message.as_deref())
        .unwrap_or("request failed")
}

// FastAPI sends either a string or a list of validation errors with `msg`
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg")?.as_str())
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_detail() {
        let err = ApiError::from_body(401, r#"{"detail":"Incorrect username or password"}"#);
        assert_eq!(err.detail(), Some("Incorrect username or password"));
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message("Login failed"), "Incorrect username or password");
    }

    #[test]
    fn test_validation_list_detail() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"field required"},{"msg":"too short"}]}"#;
        let err = ApiError::from_body(422, body);
        assert_eq!(err.detail(), Some("field required; too short"));
    }

    #[test]
    fn test_message_field_and_plain_body() {
        let err = ApiError::from_body(500, r#"{"message":"boom"}"#);
        assert_eq!(err.detail(), None);
        assert_eq!(err.server_message(), Some("boom"));
        assert_eq!(err.user_message("Login failed"), "Login failed");
        assert_eq!(err.to_string(), "server returned 500: boom");

        let err = ApiError::from_body(502, "<html>Bad Gateway</html>");
        assert_eq!(err.detail(), None);
        assert_eq!(err.server_message(), None);
        assert_eq!(err.to_string(), "server returned 502: request failed");
    }

    #[test]
    fn test_not_authenticated_has_no_detail() {
        let err = ApiError::NotAuthenticated;
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message("fallback"), "fallback");
    }
}
