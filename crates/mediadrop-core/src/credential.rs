//! Credential fetcher for signed uploads.
//!
//! The credential endpoint signs each upload with a private key the client
//! never sees. Any failure is logged with full detail and surfaced as a
//! generic [`UploadError::Auth`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::models::UploadCredential;
use crate::util::{compact_text, is_http_url, sanitize};

/// Source of fresh upload credentials, one per attempt.
pub trait CredentialFetcher: Send + Sync {
    fn fetch_credential(
        &self,
    ) -> impl Future<Output = Result<UploadCredential, UploadError>> + Send;
}

/// Detailed credential failure, kept for logs only.
#[derive(Debug, Error)]
enum CredentialError {
    #[error("credential request failed: {0}")]
    Request(String),
    #[error("credential endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("credential response is not valid JSON: {0}")]
    Malformed(String),
    #[error("credential response is missing signature, token, or publicKey")]
    Incomplete,
}

/// Fetches credentials with `GET {endpoint}`.
#[derive(Debug, Clone)]
pub struct HttpCredentialFetcher {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpCredentialFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let endpoint = endpoint.into().trim().to_string();
        if !is_http_url(&endpoint) {
            return Err(crate::Error::InvalidInput(
                "credential endpoint must include http:// or https://".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn from_config(config: &UploadConfig) -> crate::Result<Self> {
        Self::new(config.auth_endpoint.clone(), config.http_timeout)
    }

    async fn request_credential(&self) -> Result<UploadCredential, CredentialError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| CredentialError::Request(sanitize(&error)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| CredentialError::Request(sanitize(&error)))?;
        if !status.is_success() {
            return Err(CredentialError::Status {
                status: status.as_u16(),
                body: compact_text(&body),
            });
        }

        let credential = serde_json::from_str::<UploadCredential>(&body)
            .map_err(|error| CredentialError::Malformed(sanitize(&error)))?;
        if !credential.is_complete() {
            return Err(CredentialError::Incomplete);
        }
        Ok(credential)
    }
}

impl CredentialFetcher for HttpCredentialFetcher {
    async fn fetch_credential(&self) -> Result<UploadCredential, UploadError> {
        match self.request_credential().await {
            Ok(credential) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    expire = credential.expire,
                    "Fetched upload credential"
                );
                Ok(credential)
            }
            Err(error) => {
                tracing::error!(endpoint = %self.endpoint, "Upload authentication failed: {}", error);
                Err(UploadError::Auth)
            }
        }
    }
}
