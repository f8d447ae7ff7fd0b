//! UI Components
//!
//! The upload form and the pieces it renders.

mod format;
mod upload_form;
mod upload_status;

pub use upload_form::UploadForm;
