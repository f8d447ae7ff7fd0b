//! Upload transports.
//!
//! A transport performs the network transfer for one attempt, reports
//! progress through a callback, honors the attempt's cancellation token, and
//! returns either the service's result or a classified [`UploadError`].

mod http;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use http::HttpUploadTransport;

use crate::error::UploadError;
use crate::models::{UploadCredential, UploadProgress, UploadResult, UploadTarget};

/// Progress sink handed to a transport for one attempt.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Everything a transport needs to perform a single upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: UploadTarget,
    pub credential: UploadCredential,
    /// Destination folder on the media service.
    pub folder: String,
}

pub trait UploadTransport: Send + Sync {
    fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<UploadResult, UploadError>> + Send;
}
