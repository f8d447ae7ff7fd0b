//! Error types for mediadrop-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::FailureKind;

/// Message carried by attempts that end because their token fired.
pub const ABORTED_BY_USER: &str = "upload aborted by user";

/// Result type alias using mediadrop-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up upload collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Classified failure of a single upload attempt.
///
/// Every variant maps onto exactly one [`FailureKind`]; the controller turns
/// these into `Failed(kind, message)` UI states.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Submit was called without a selected file
    #[error("no file selected")]
    NoFileSelected,

    /// Credential endpoint was unreachable or returned an unusable body.
    ///
    /// Diagnostic detail is logged where the failure happens and deliberately
    /// not carried here.
    #[error("failed to obtain upload credentials")]
    Auth,

    /// The attempt was cancelled
    #[error("{0}")]
    Aborted(String),

    /// The media service rejected the request
    #[error("{0}")]
    InvalidRequest(String),

    /// The transfer failed before a response arrived
    #[error("{0}")]
    Network(String),

    /// The media service failed to process the upload
    #[error("{0}")]
    Server(String),

    /// Anything the transport could not classify
    #[error("{0}")]
    Unknown(String),
}

impl UploadError {
    /// The UI-facing failure kind for this error.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NoFileSelected => FailureKind::ValidationError,
            Self::Auth => FailureKind::AuthFailure,
            Self::Aborted(_) => FailureKind::AbortedByUser,
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::Network(_) => FailureKind::NetworkFailure,
            Self::Server(_) => FailureKind::ServerFailure,
            Self::Unknown(_) => FailureKind::UnknownFailure,
        }
    }

    /// Message carried into the `Failed` state.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Abort raised when an attempt's cancellation token fires.
    pub fn cancelled() -> Self {
        Self::aborted(ABORTED_BY_USER)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_upload_error_maps_to_its_kind() {
        let cases = [
            (UploadError::NoFileSelected, FailureKind::ValidationError),
            (UploadError::Auth, FailureKind::AuthFailure),
            (UploadError::aborted("stop"), FailureKind::AbortedByUser),
            (UploadError::invalid_request("bad"), FailureKind::InvalidRequest),
            (UploadError::network("down"), FailureKind::NetworkFailure),
            (UploadError::server("500"), FailureKind::ServerFailure),
            (UploadError::unknown("?"), FailureKind::UnknownFailure),
        ];
        for (error, kind) in cases {
            assert_eq!(error.kind(), kind, "{error:?}");
        }
    }

    #[test]
    fn auth_message_does_not_leak_detail() {
        assert_eq!(
            UploadError::Auth.message(),
            "failed to obtain upload credentials"
        );
        assert_eq!(UploadError::NoFileSelected.message(), "no file selected");
    }

    #[test]
    fn transport_errors_carry_upstream_message() {
        assert_eq!(
            UploadError::network("connection reset").message(),
            "connection reset"
        );
    }
}
