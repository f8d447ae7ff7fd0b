//! mediadrop-core - Core library for mediadrop
//!
//! This crate contains the upload data model, the credential fetcher, the
//! HTTP upload transport, and the upload workflow controller used by the
//! mediadrop desktop page.

pub mod config;
pub mod controller;
pub mod credential;
pub mod error;
pub mod models;
pub mod transport;
mod util;

pub use config::{ConfigError, UploadConfig};
pub use controller::{HttpUploadController, UploadController};
pub use credential::{CredentialFetcher, HttpCredentialFetcher};
pub use error::{Error, Result, UploadError, ABORTED_BY_USER};
pub use models::{
    FailureKind, UploadCredential, UploadProgress, UploadResult, UploadTarget, UploadUiState,
};
pub use transport::{HttpUploadTransport, ProgressCallback, UploadRequest, UploadTransport};
