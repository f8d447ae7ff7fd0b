//! Application services
//!
//! Platform helpers the upload form relies on.

mod file_picker;

pub use file_picker::pick_upload_target;
