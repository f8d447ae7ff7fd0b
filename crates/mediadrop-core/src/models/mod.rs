//! Data models for mediadrop

mod state;
mod upload;

pub use state::{FailureKind, UploadProgress, UploadUiState};
pub use upload::{UploadCredential, UploadResult, UploadTarget};
