//! Upload UI state and failure taxonomy.

use std::fmt;

use super::UploadResult;

/// Why an attempt ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Detected locally; never reaches a collaborator.
    ValidationError,
    AuthFailure,
    AbortedByUser,
    InvalidRequest,
    NetworkFailure,
    ServerFailure,
    UnknownFailure,
}

impl FailureKind {
    /// Short human-readable message shown to the user.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::ValidationError => "Please select a file to upload.",
            Self::AuthFailure => "Could not authorize the upload. Please try again.",
            Self::AbortedByUser => "Upload cancelled.",
            Self::InvalidRequest => "The media service rejected the upload.",
            Self::NetworkFailure => "Network error while uploading.",
            Self::ServerFailure => "The media service failed to process the upload.",
            Self::UnknownFailure => "Upload failed.",
        }
    }

    /// Whether the upstream message may be shown next to the short message.
    pub const fn shows_detail(self) -> bool {
        !matches!(self, Self::ValidationError | Self::AuthFailure)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ValidationError => "validation error",
            Self::AuthFailure => "auth failure",
            Self::AbortedByUser => "aborted by user",
            Self::InvalidRequest => "invalid request",
            Self::NetworkFailure => "network failure",
            Self::ServerFailure => "server failure",
            Self::UnknownFailure => "unknown failure",
        };
        formatter.write_str(label)
    }
}

/// Cumulative transfer progress reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl UploadProgress {
    pub const fn new(bytes_sent: u64, bytes_total: u64) -> Self {
        Self {
            bytes_sent,
            bytes_total,
        }
    }

    /// Whole percent sent, clamped to `[0, 100]`.
    ///
    /// An empty payload counts as fully sent.
    pub fn percent(self) -> u8 {
        if self.bytes_total == 0 {
            return 100;
        }
        let percent = u128::from(self.bytes_sent) * 100 / u128::from(self.bytes_total);
        u8::try_from(percent.min(100)).unwrap_or(100)
    }
}

/// The single state the upload form renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadUiState {
    #[default]
    Idle,
    InProgress(u8),
    Succeeded(UploadResult),
    Failed(FailureKind, String),
}

impl UploadUiState {
    /// Whether the state ends an attempt.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(..))
    }

    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress(_))
    }

    /// Current progress percent, if an attempt is in flight.
    pub const fn progress(&self) -> Option<u8> {
        match self {
            Self::InProgress(percent) => Some(*percent),
            _ => None,
        }
    }

    pub const fn result(&self) -> Option<&UploadResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed(kind, _) => Some(*kind),
            _ => None,
        }
    }
}
