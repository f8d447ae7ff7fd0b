//! Runtime configuration for the upload workflow.
//!
//! Values come from the process environment (the desktop binary loads `.env`
//! first). Nothing here is secret: the private key that signs uploads lives
//! behind the credential endpoint, never in the client.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const ENV_AUTH_ENDPOINT: &str = "MEDIADROP_AUTH_ENDPOINT";
pub const ENV_UPLOAD_ENDPOINT: &str = "MEDIADROP_UPLOAD_ENDPOINT";
pub const ENV_UPLOAD_FOLDER: &str = "MEDIADROP_UPLOAD_FOLDER";
pub const ENV_URL_ENDPOINT: &str = "MEDIADROP_URL_ENDPOINT";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MEDIADROP_HTTP_TIMEOUT_SECS";
pub const ENV_UPLOAD_CHUNK_KIB: &str = "MEDIADROP_UPLOAD_CHUNK_KIB";

pub const DEFAULT_AUTH_ENDPOINT: &str = "http://localhost:3000/api/upload-auth";
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://upload.imagekit.io/api/v1/files/upload";
pub const DEFAULT_UPLOAD_FOLDER: &str = "/";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "300";
const DEFAULT_UPLOAD_CHUNK_KIB: &str = "64";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Endpoints and limits used by the credential fetcher and upload transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Server endpoint returning a signed upload credential bundle.
    pub auth_endpoint: String,
    /// Media service endpoint accepting multipart uploads.
    pub upload_endpoint: String,
    /// Destination folder on the media service, always starting with `/`.
    pub default_folder: String,
    /// Media-delivery base URL used only when rendering results.
    pub url_endpoint: Option<String>,
    /// Overall timeout applied to each HTTP request.
    pub http_timeout: Duration,
    /// Size of the body chunks the transport reports progress for.
    pub upload_chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            default_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            url_endpoint: None,
            http_timeout: Duration::from_secs(300),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let auth_endpoint = required_http_url(
            value_or_default(&lookup, ENV_AUTH_ENDPOINT, DEFAULT_AUTH_ENDPOINT),
            ENV_AUTH_ENDPOINT,
        )?;
        let upload_endpoint = required_http_url(
            value_or_default(&lookup, ENV_UPLOAD_ENDPOINT, DEFAULT_UPLOAD_ENDPOINT),
            ENV_UPLOAD_ENDPOINT,
        )?;
        let default_folder = normalize_folder(lookup(ENV_UPLOAD_FOLDER));

        let url_endpoint = match normalize_text_option(lookup(ENV_URL_ENDPOINT)) {
            Some(url) => Some(required_http_url(url, ENV_URL_ENDPOINT)?),
            None => None,
        };

        let http_timeout_secs = value_or_default(&lookup, ENV_HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be an integer in [5, 3600]"
                ))
            })?;
        if !(5..=3_600).contains(&http_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "{ENV_HTTP_TIMEOUT_SECS} must be in [5, 3600]"
            )));
        }

        let chunk_kib = value_or_default(&lookup, ENV_UPLOAD_CHUNK_KIB, DEFAULT_UPLOAD_CHUNK_KIB)
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "{ENV_UPLOAD_CHUNK_KIB} must be an integer in [4, 4096]"
                ))
            })?;
        if !(4..=4_096).contains(&chunk_kib) {
            return Err(ConfigError::Invalid(format!(
                "{ENV_UPLOAD_CHUNK_KIB} must be in [4, 4096]"
            )));
        }

        Ok(Self {
            auth_endpoint,
            upload_endpoint,
            default_folder,
            url_endpoint,
            http_timeout: Duration::from_secs(http_timeout_secs),
            upload_chunk_size: chunk_kib * 1024,
        })
    }
}

/// Normalize a destination folder; unset or blank folders become `/`.
pub fn normalize_folder(raw: Option<String>) -> String {
    let Some(folder) = normalize_text_option(raw) else {
        return DEFAULT_UPLOAD_FOLDER.to_string();
    };
    if folder.starts_with('/') {
        folder
    } else {
        format!("/{folder}")
    }
}

fn required_http_url(value: String, field: &str) -> Result<String, ConfigError> {
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must start with http:// or https://"
        )))
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    normalize_text_option(lookup(name)).unwrap_or_else(|| default.to_string())
}
