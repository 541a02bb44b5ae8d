//! Admin panel view state: knowledge-base uploads

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// A document accepted for upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
}

impl UploadFile {
    /// Accepts `.pdf` and `.txt` files, matched case-insensitively
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let mime = match ext.as_str() {
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            _ => return None,
        };
        let file_name = path.file_name()?.to_string_lossy().into_owned();

        Some(Self {
            path: path.to_path_buf(),
            file_name,
            mime: mime.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPanel {
    pub file: Option<UploadFile>,
    pub urls: String,
    pub file_loading: bool,
    pub url_loading: bool,
    pub status: Option<StatusMessage>,
}

impl AdminPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, path: impl AsRef<Path>) {
        match UploadFile::from_path(path) {
            Some(file) => {
                self.file = Some(file);
                self.status = None;
            }
            None => {
                self.file = None;
                self.status = Some(StatusMessage::error("Please select a PDF or TXT file"));
            }
        }
    }

    pub fn begin_file_upload(&mut self) -> Option<UploadFile> {
        let Some(file) = self.file.clone() else {
            self.status = Some(StatusMessage::error("Please select a file first"));
            return None;
        };
        self.file_loading = true;
        Some(file)
    }

    pub fn file_upload_finished(&mut self, result: Result<String, ApiError>) {
        self.file_loading = false;
        match result {
            Ok(message) => {
                self.status = Some(StatusMessage::success(message));
                self.file = None;
            }
            Err(err) => {
                let text = err
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| "Error uploading file".to_string());
                self.status = Some(StatusMessage::error(text));
            }
        }
    }

    pub fn set_urls(&mut self, urls: impl Into<String>) {
        self.urls = urls.into();
        self.status = None;
    }

    /// Validate the URL box and, if every line is a URL, return the list to send
    pub fn begin_url_submit(&mut self) -> Option<Vec<String>> {
        if self.urls.trim().is_empty() {
            self.status = Some(StatusMessage::error("Please enter at least one URL"));
            return None;
        }

        let urls = parse_url_list(&self.urls);
        let invalid: Vec<&str> = urls
            .iter()
            .filter(|u| Url::parse(u).is_err())
            .map(String::as_str)
            .collect();

        if !invalid.is_empty() {
            self.status = Some(StatusMessage::error(format!(
                "Invalid URLs found: {}",
                invalid.join(", ")
            )));
            return None;
        }

        self.url_loading = true;
        Some(urls)
    }

    pub fn url_submit_finished(&mut self, result: Result<String, ApiError>) {
        self.url_loading = false;
        match result {
            Ok(message) => {
                self.status = Some(StatusMessage::success(message));
                self.urls.clear();
            }
            Err(err) => {
                let text = err
                    .detail()
                    .or_else(|| err.server_message())
                    .map(str::to_string)
                    .unwrap_or_else(|| "Error processing URLs".to_string());
                self.status = Some(StatusMessage::error(text));
            }
        }
    }
}

/// One URL per line; surrounding whitespace and blank lines are dropped
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(detail: Option<&str>, message: Option<&str>) -> ApiError {
        ApiError::Server {
            status: 400,
            detail: detail.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_select_pdf_and_txt() {
        let mut panel = AdminPanel::new();
        panel.select_file("/tmp/Report.PDF");
        let file = panel.file.clone().unwrap();
        assert_eq!(file.file_name, "Report.PDF");
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(panel.status, None);

        panel.select_file("notes.txt");
        assert_eq!(panel.file.as_ref().unwrap().mime, "text/plain");
    }

    #[test]
    fn test_select_rejects_other_types() {
        let mut panel = AdminPanel::new();
        panel.select_file("notes.txt");
        panel.select_file("slides.pptx");
        assert!(panel.file.is_none());
        assert_eq!(
            panel.status,
            Some(StatusMessage::error("Please select a PDF or TXT file"))
        );

        panel.select_file("README");
        assert!(panel.file.is_none());
    }

    #[test]
    fn test_upload_requires_file() {
        let mut panel = AdminPanel::new();
        assert!(panel.begin_file_upload().is_none());
        assert!(!panel.file_loading);
        assert_eq!(
            panel.status,
            Some(StatusMessage::error("Please select a file first"))
        );
    }

    #[test]
    fn test_upload_success_clears_selection() {
        let mut panel = AdminPanel::new();
        panel.select_file("doc.pdf");
        assert!(panel.begin_file_upload().is_some());
        assert!(panel.file_loading);

        panel.file_upload_finished(Ok("File ingested".to_string()));
        assert!(!panel.file_loading);
        assert!(panel.file.is_none());
        assert_eq!(panel.status, Some(StatusMessage::success("File ingested")));
    }

    #[test]
    fn test_upload_failure_messages() {
        let mut panel = AdminPanel::new();
        panel.select_file("doc.pdf");
        panel.begin_file_upload();
        panel.file_upload_finished(Err(server_error(Some("Too large"), None)));
        assert_eq!(panel.status, Some(StatusMessage::error("Too large")));
        assert!(panel.file.is_some());

        panel.file_upload_finished(Err(server_error(None, Some("ignored"))));
        assert_eq!(panel.status, Some(StatusMessage::error("Error uploading file")));
    }

    #[test]
    fn test_url_list_parsing() {
        assert_eq!(
            parse_url_list("  https://a.example \n\n\thttps://b.example/x\n"),
            vec!["https://a.example", "https://b.example/x"]
        );
    }

    #[test]
    fn test_url_submit_requires_text() {
        let mut panel = AdminPanel::new();
        panel.set_urls(" \n ");
        assert!(panel.begin_url_submit().is_none());
        assert_eq!(
            panel.status,
            Some(StatusMessage::error("Please enter at least one URL"))
        );
    }

    #[test]
    fn test_url_submit_reports_invalid_entries() {
        let mut panel = AdminPanel::new();
        panel.set_urls("https://ok.example\nnot a url\nexample.com");
        assert!(panel.begin_url_submit().is_none());
        assert!(!panel.url_loading);
        assert_eq!(
            panel.status,
            Some(StatusMessage::error("Invalid URLs found: not a url, example.com"))
        );
    }

    #[test]
    fn test_url_submit_round() {
        let mut panel = AdminPanel::new();
        panel.set_urls("https://a.example\nhttps://b.example");
        let urls = panel.begin_url_submit().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(panel.url_loading);

        panel.url_submit_finished(Ok("Processed 2 URLs".to_string()));
        assert!(panel.urls.is_empty());
        assert!(!panel.url_loading);
        assert_eq!(panel.status, Some(StatusMessage::success("Processed 2 URLs")));
    }

    #[test]
    fn test_url_failure_falls_back_to_message() {
        let mut panel = AdminPanel::new();
        panel.set_urls("https://a.example");
        panel.begin_url_submit();

        panel.url_submit_finished(Err(server_error(None, Some("Scrape failed"))));
        assert_eq!(panel.status, Some(StatusMessage::error("Scrape failed")));
        assert_eq!(panel.urls, "https://a.example");

        panel.url_submit_finished(Err(ApiError::NotAuthenticated));
        assert_eq!(panel.status, Some(StatusMessage::error("Error processing URLs")));
    }

    #[test]
    fn test_editing_urls_clears_status() {
        let mut panel = AdminPanel::new();
        panel.begin_url_submit();
        assert!(panel.status.is_some());
        panel.set_urls("h");
        assert!(panel.status.is_none());
    }
}
