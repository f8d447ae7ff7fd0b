//! Multipart HTTP upload to the media service.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use tokio_util::sync::CancellationToken;

use super::{ProgressCallback, UploadRequest, UploadTransport};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::models::{UploadProgress, UploadResult};
use crate::util::{compact_text, is_http_url, sanitize};

const MIN_CHUNK_SIZE: usize = 1024;

/// Posts files to a signed-upload endpoint as `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct HttpUploadTransport {
    endpoint: String,
    chunk_size: usize,
    client: reqwest::Client,
}

impl HttpUploadTransport {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        chunk_size: usize,
    ) -> crate::Result<Self> {
        let endpoint = endpoint.into().trim().to_string();
        if !is_http_url(&endpoint) {
            return Err(crate::Error::InvalidInput(
                "upload endpoint must include http:// or https://".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint,
            chunk_size: chunk_size.max(MIN_CHUNK_SIZE),
            client,
        })
    }

    pub fn from_config(config: &UploadConfig) -> crate::Result<Self> {
        Self::new(
            config.upload_endpoint.clone(),
            config.http_timeout,
            config.upload_chunk_size,
        )
    }

    fn build_form(
        &self,
        request: UploadRequest,
        progress: ProgressCallback,
    ) -> Result<Form, UploadError> {
        let UploadRequest {
            file,
            credential,
            folder,
        } = request;
        let size = file.size();
        let body = progress_body(file.bytes, self.chunk_size, progress);

        let mut part = Part::stream_with_length(body, size).file_name(file.name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|error| {
                UploadError::invalid_request(format!(
                    "invalid content type '{content_type}': {}",
                    sanitize(&error)
                ))
            })?;
        }

        Ok(Form::new()
            .part("file", part)
            .text("fileName", file.name)
            .text("publicKey", credential.public_key)
            .text("signature", credential.signature)
            .text("expire", credential.expire.to_string())
            .text("token", credential.token)
            .text("folder", folder)
            .text("useUniqueFileName", "true"))
    }
}

impl UploadTransport for HttpUploadTransport {
    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<UploadResult, UploadError> {
        tracing::info!(
            file_name = %request.file.name,
            size = request.file.size(),
            folder = %request.folder,
            "Uploading file"
        );
        let form = self.build_form(request, progress)?;

        let response = until_cancelled(
            &cancel,
            self.client.post(&self.endpoint).multipart(form).send(),
        )
        .await?
        .map_err(|error| classify_request_error(&error))?;

        let status = response.status();
        let body = until_cancelled(&cancel, response.text())
            .await?
            .map_err(|error| classify_request_error(&error))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str::<UploadResult>(&body).map_err(|error| {
            UploadError::unknown(format!(
                "unexpected upload response: {}",
                sanitize(&error)
            ))
        })
    }
}

/// Drive `future` unless the token fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> Result<T, UploadError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(UploadError::cancelled()),
        output = future => Ok(output),
    }
}

/// Stream `payload` in chunks, reporting cumulative progress per chunk.
fn progress_body(payload: Bytes, chunk_size: usize, progress: ProgressCallback) -> Body {
    let total = payload.len() as u64;
    let chunks: Vec<Bytes> = (0..payload.len())
        .step_by(chunk_size)
        .map(|start| payload.slice(start..(start + chunk_size).min(payload.len())))
        .collect();

    let mut sent = 0_u64;
    let chunks = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress(UploadProgress::new(sent, total));
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(chunks)
}

fn classify_request_error(error: &reqwest::Error) -> UploadError {
    let message = sanitize(error);
    if error.is_builder() {
        UploadError::invalid_request(message)
    } else if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        UploadError::network(message)
    } else {
        UploadError::unknown(message)
    }
}

fn classify_status(status: StatusCode, body: &str) -> UploadError {
    let message = service_message(body).unwrap_or_else(|| {
        let compact = compact_text(body);
        if compact.is_empty() {
            format!("upload failed with HTTP {}", status.as_u16())
        } else {
            format!("upload failed with HTTP {}: {compact}", status.as_u16())
        }
    });

    if status.is_client_error() {
        UploadError::invalid_request(message)
    } else if status.is_server_error() {
        UploadError::server(message)
    } else {
        UploadError::unknown(message)
    }
}

/// Extract the service's `{"message": "..."}` error text, if present.
fn service_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    if message.is_empty() {
        None
    } else {
        Some(compact_text(message))
    }
}
