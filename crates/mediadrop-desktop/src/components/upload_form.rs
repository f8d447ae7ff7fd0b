//! File selection and upload controls

use dioxus::prelude::*;
use mediadrop_core::{UploadTarget, UploadUiState};

use super::format::format_file_size;
use super::upload_status::UploadStatus;
use crate::services::pick_upload_target;
use crate::state::AppState;
use crate::theme::PALETTE;

/// Upload form bound to the shared controller.
#[component]
pub fn UploadForm() -> Element {
    let app_state = use_context::<AppState>();
    let colors = PALETTE;

    let mut selected_file = use_signal(|| None::<UploadTarget>);
    let mut upload_state = use_signal(UploadUiState::default);
    let mut picker_error = use_signal(|| None::<String>);

    // Mirror controller state into the signal
    let watched = app_state.controller.clone();
    use_future(move || {
        let watched = watched.clone();
        async move {
            let Some(controller) = watched else {
                return;
            };
            let mut receiver = controller.subscribe();
            loop {
                let current = receiver.borrow_and_update().clone();
                upload_state.set(current);
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        }
    });

    let busy = upload_state.read().is_in_progress();
    let available = app_state.controller.is_some();
    let selected_label = selected_file
        .read()
        .as_ref()
        .map(|file| format!("{} ({})", file.name, format_file_size(file.size())));

    let choose_file = move |_| {
        spawn(async move {
            match pick_upload_target().await {
                Ok(Some(file)) => {
                    tracing::debug!(name = %file.name, size = file.size(), "File selected");
                    picker_error.set(None);
                    selected_file.set(Some(file));
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!("Failed to read selected file: {}", error);
                    picker_error.set(Some(error));
                }
            }
        });
    };

    let submit_controller = app_state.controller.clone();
    let start_upload = move |_| {
        let Some(controller) = submit_controller.clone() else {
            return;
        };
        let file = selected_file();
        spawn(async move {
            controller.submit(file).await;
        });
    };

    let cancel_controller = app_state.controller.clone();
    let cancel_upload = move |_| {
        if let Some(controller) = cancel_controller.as_ref() {
            controller.cancel();
        }
    };

    let button_style = format!(
        "padding: 8px 16px; border-radius: 6px; border: 1px solid {}; cursor: pointer;",
        colors.border
    );

    rsx! {
        div {
            style: "
                padding: 20px;
                border: 1px solid {colors.border};
                border-radius: 8px;
                background: {colors.bg_primary};
            ",

            if let Some(error) = app_state.setup_error.clone() {
                p {
                    role: "alert",
                    style: "margin: 0 0 12px; color: {colors.error};",
                    "Uploads are unavailable: {error}"
                }
            }

            div {
                style: "display: flex; align-items: center; gap: 12px;",
                button {
                    style: "{button_style} background: {colors.bg_secondary}; color: {colors.text_primary};",
                    disabled: busy || !available,
                    onclick: choose_file,
                    "Choose file"
                }
                span {
                    style: "color: {colors.text_muted}; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;",
                    {selected_label.unwrap_or_else(|| "No file selected".to_string())}
                }
            }

            if let Some(error) = picker_error() {
                p {
                    style: "margin: 8px 0 0; color: {colors.error}; font-size: 12px;",
                    "{error}"
                }
            }

            div {
                style: "display: flex; gap: 8px; margin-top: 16px;",
                button {
                    style: "{button_style} background: {colors.accent}; color: {colors.accent_text}; border-color: {colors.accent};",
                    disabled: busy || !available,
                    onclick: start_upload,
                    if busy { "Uploading..." } else { "Upload" }
                }
                if busy {
                    button {
                        style: "{button_style} background: {colors.bg_primary}; color: {colors.text_primary};",
                        onclick: cancel_upload,
                        "Cancel"
                    }
                }
            }

            UploadStatus {
                state: upload_state(),
                url_endpoint: app_state.url_endpoint.clone(),
            }
        }
    }
}
