//! Native file selection for the upload form.

use rfd::AsyncFileDialog;

use mediadrop_core::UploadTarget;

/// Ask the user for a file and load it as an upload target.
///
/// Returns `Ok(None)` when the dialog is dismissed.
pub async fn pick_upload_target() -> Result<Option<UploadTarget>, String> {
    let Some(file) = AsyncFileDialog::new()
        .set_title("Choose a file to upload")
        .pick_file()
        .await
    else {
        return Ok(None);
    };

    let file_name = file.file_name();
    if file_name.trim().is_empty() {
        return Err("Selected file has an empty filename.".to_string());
    }

    let bytes = file.read().await;
    tracing::debug!(file_name = %file_name, size = bytes.len(), "Selected upload file");
    let content_type = infer_mime_type(&file_name);
    Ok(Some(UploadTarget::new(file_name, content_type, bytes)))
}

/// Guess a MIME type from the file extension.
fn infer_mime_type(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string)
}
