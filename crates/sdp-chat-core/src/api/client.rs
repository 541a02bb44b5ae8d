use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::types::{ChatReply, ChatRequest, LoggedIn, MessageResponse, Registered, TokenResponse};
use crate::admin::UploadFile;
use crate::auth::RegisterForm;
use crate::state::{Session, User};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client for the chatbot backend's REST API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/sessions/{id}` with the id escaped as a single path segment
    fn session_url(&self, id: &str) -> ApiResult<Url> {
        let invalid = || ApiError::InvalidBaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("sessions")
            .push(id);
        Ok(url)
    }

    fn bearer(&self) -> ApiResult<&str> {
        self.token.as_deref().ok_or(ApiError::NotAuthenticated)
    }

    /// Send a request and turn non-2xx answers into `ApiError::Server`
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "backend request failed");
            ApiError::from_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_body(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "backend returned an error");
            return Err(err);
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        response.json::<T>().await.map_err(ApiError::Decode)
    }

    /// Exchange credentials for a token, then fetch the profile it belongs to.
    ///
    /// Nothing is returned unless both steps succeed.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoggedIn> {
        debug!(username, "logging in");
        let request = self
            .client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)]);

        let token: TokenResponse = Self::decode(self.send(request).await?).await?;
        let user = self.current_user(&token.access_token).await?;

        Ok(LoggedIn {
            token: token.access_token,
            user,
        })
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        let request = self.client.get(self.url("/users/me")).bearer_auth(token);
        Self::decode(self.send(request).await?).await
    }

    pub async fn register(&self, form: &RegisterForm) -> ApiResult<Registered> {
        debug!(username = %form.username, user_type = form.user_type.as_str(), "registering");
        let request = self.client.post(self.url("/register")).json(form);
        let body: Value = Self::decode(self.send(request).await?).await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    /// Ask a question. `session_id` of `None` starts a new session.
    pub async fn chat(&self, question: &str, session_id: Option<&str>) -> ApiResult<ChatReply> {
        debug!(session_id, "sending chat question");
        let request = self
            .client
            .post(self.url("/chat"))
            .bearer_auth(self.bearer()?)
            .json(&ChatRequest {
                question,
                session_id,
            });
        Self::decode(self.send(request).await?).await
    }

    pub async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        let request = self
            .client
            .get(self.url("/sessions"))
            .bearer_auth(self.bearer()?);
        let sessions: Vec<Session> = Self::decode(self.send(request).await?).await?;
        debug!(count = sessions.len(), "fetched sessions");
        Ok(sessions)
    }

    pub async fn delete_session(&self, id: &str) -> ApiResult<()> {
        debug!(session_id = id, "deleting session");
        let request = self
            .client
            .delete(self.session_url(id)?)
            .bearer_auth(self.bearer()?);
        self.send(request).await?;
        Ok(())
    }

    /// Upload a document to the knowledge base; returns the server's message
    pub async fn ingest_file(&self, file: &UploadFile) -> ApiResult<String> {
        let token = self.bearer()?;
        let bytes = tokio::fs::read(&file.path).await?;
        debug!(file = %file.file_name, size = bytes.len(), "uploading document");

        let part = Part::bytes(bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)?;
        let request = self
            .client
            .post(self.url("/ingest-file"))
            .bearer_auth(token)
            .multipart(Form::new().part("file", part));

        let body: MessageResponse = Self::decode(self.send(request).await?).await?;
        Ok(body.message)
    }

    /// Queue web pages for ingestion; returns the server's message
    pub async fn ingest_urls(&self, urls: &[String]) -> ApiResult<String> {
        debug!(count = urls.len(), "submitting urls");
        let request = self
            .client
            .post(self.url("/ingest-urls"))
            .bearer_auth(self.bearer()?)
            .json(urls);
        let body: MessageResponse = Self::decode(self.send(request).await?).await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/chat"), "http://localhost:8000/chat");
    }

    #[test]
    fn test_bearer_requires_token() {
        let client = ApiClient::new(DEFAULT_BASE_URL);
        assert!(matches!(client.bearer(), Err(ApiError::NotAuthenticated)));

        let client = client.with_token("abc");
        assert_eq!(client.bearer().unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_authenticated_calls_fail_fast_without_token() {
        // Port 9 is discard; the call must not get that far.
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.list_sessions().await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[test]
    fn test_session_url_escapes_id() {
        let client = ApiClient::new(DEFAULT_BASE_URL);
        assert_eq!(
            client.session_url("abc-123").unwrap().as_str(),
            "http://localhost:8000/sessions/abc-123"
        );
        assert_eq!(
            client.session_url("a/b?c#d").unwrap().as_str(),
            "http://localhost:8000/sessions/a%2Fb%3Fc%23d"
        );

        let nested = ApiClient::new("http://host/api/");
        assert_eq!(
            nested.session_url("s1").unwrap().as_str(),
            "http://host/api/sessions/s1"
        );
    }

    #[test]
    fn test_session_url_rejects_bad_base() {
        let client = ApiClient::new("not a url");
        assert!(matches!(
            client.session_url("s1"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }
}
