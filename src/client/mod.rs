//! HTTP client for the essay service.
//!
//! Transport concerns live here: base URL, bearer token, status mapping and
//! the server's loose response shapes. The composition core only sees
//! [`GenerationService`], so it can be driven by a fake in tests.

mod events;

use std::path::Path;

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub use events::{AuthEvent, AuthEvents};

use crate::config::Config;
use crate::models::*;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// The service refused the credentials; `message` is its `detail`.
    #[error("Not authorized: {message}")]
    AuthExpired { message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Remote operations the composition core depends on.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Ask the service for an outline; creates the essay record.
    async fn generate_outline(&self, document_id: &str, topic: &str)
        -> Result<Essay, ClientError>;

    /// Generate one section. The payload is returned undecoded: it may be a
    /// bare string or an object carrying the text.
    async fn generate_section(
        &self,
        essay_id: &str,
        header: &str,
        document_id: &str,
    ) -> Result<Value, ClientError>;

    async fn get_essay(&self, essay_id: &str) -> Result<Essay, ClientError>;

    async fn list_essays(&self) -> Result<Vec<Essay>, ClientError>;
}

/// Error body shape used by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// Pick the server's `detail` message out of an error body, or fall back.
fn rejection_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// HTTP client for the essay service.
#[derive(Debug, Clone)]
pub struct EssayClient {
    base_url: String,
    token: Option<String>,
    client: Client,
    events: AuthEvents,
}

impl EssayClient {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
            events: AuthEvents::new(),
        }
    }

    /// Create from resolved configuration.
    pub fn from_config(config: &Config, token: Option<String>) -> Self {
        Self::new(config.base_url.clone(), token)
    }

    /// Channel on which [`AuthEvent::Expired`] is published.
    pub fn auth_events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request with optional auth header.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Handle an authenticated response.
    ///
    /// A 401 publishes [`AuthEvent::Expired`] before being returned.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ClientError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            self.events.publish(AuthEvent::Expired);
            let body = response.text().await?;
            let message = rejection_message(&body, "session expired, log in again");
            tracing::warn!("Service rejected credentials: {}", message);
            return Err(ClientError::AuthExpired { message });
        }
        Self::decode(response, fallback).await
    }

    /// Handle a response from an endpoint that does not need a session.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(serde_json::from_str(&body)?)
        } else {
            let message = rejection_message(&body, fallback);
            tracing::debug!("Request rejected with {}: {}", status, message);
            Err(ClientError::Rejected { status, message })
        }
    }

    // ============================================================
    // Auth Operations
    // ============================================================

    pub async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/auth/signup", self.base_url))
            .json(credentials)
            .send()
            .await?;
        Self::decode(response, "Signup failed").await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(credentials)
            .send()
            .await?;
        Self::decode(response, "Login failed").await
    }

    // ============================================================
    // Document Operations
    // ============================================================

    /// Upload a PDF for ingestion.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadReceipt, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, "/documents/upload")
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response, "Upload failed").await
    }

    pub async fn list_documents(&self) -> Result<Vec<Document>, ClientError> {
        let response = self.request(Method::GET, "/documents/").send().await?;
        let list: DocumentList = self
            .handle_response(response, "Failed to fetch documents")
            .await?;
        Ok(list.into_vec())
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, ClientError> {
        let response = self
            .request(Method::GET, &format!("/documents/{}", id))
            .send()
            .await?;
        let detail: DocumentDetail = self
            .handle_response(response, "Failed to fetch document")
            .await?;
        Ok(detail.into_document())
    }
}

#[async_trait]
impl GenerationService for EssayClient {
    async fn generate_outline(
        &self,
        document_id: &str,
        topic: &str,
    ) -> Result<Essay, ClientError> {
        tracing::debug!("Requesting outline for document {}", document_id);
        let response = self
            .request(Method::POST, "/files/generate-outline")
            .query(&[("document_id", document_id), ("topic", topic)])
            .send()
            .await?;
        let envelope: EssayEnvelope = self
            .handle_response(response, "Failed to generate outline")
            .await?;
        envelope.into_essay().ok_or_else(|| ClientError::Rejected {
            status: StatusCode::OK,
            message: "Failed to generate outline".to_string(),
        })
    }

    async fn generate_section(
        &self,
        essay_id: &str,
        header: &str,
        document_id: &str,
    ) -> Result<Value, ClientError> {
        tracing::debug!("Requesting section {:?} of essay {}", header, essay_id);
        let response = self
            .request(
                Method::POST,
                &format!("/files/{}/generate-section", essay_id),
            )
            .query(&[("header", header), ("document_id", document_id)])
            .send()
            .await?;
        self.handle_response(response, "Failed to generate section")
            .await
    }

    async fn get_essay(&self, essay_id: &str) -> Result<Essay, ClientError> {
        let response = self
            .request(Method::GET, &format!("/files/{}", essay_id))
            .send()
            .await?;
        self.handle_response(response, "Failed to fetch essay").await
    }

    async fn list_essays(&self) -> Result<Vec<Essay>, ClientError> {
        let response = self.request(Method::GET, "/files/").send().await?;
        let list: EssayList = self
            .handle_response(response, "Failed to fetch essays")
            .await?;
        Ok(list.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_uses_server_detail() {
        let msg = rejection_message(r#"{"detail":"No relevant info found in PDF"}"#, "fallback");
        assert_eq!(msg, "No relevant info found in PDF");
    }

    #[test]
    fn rejection_falls_back_without_detail() {
        assert_eq!(rejection_message("", "Upload failed"), "Upload failed");
        assert_eq!(rejection_message("{}", "Upload failed"), "Upload failed");
        assert_eq!(
            rejection_message(r#"{"detail":[{"loc":["query"],"msg":"missing"}]}"#, "Upload failed"),
            "Upload failed"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = EssayClient::new("http://localhost:8000/", None);
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
