//! Progress, failure, and result display for the current attempt

use dioxus::prelude::*;
use mediadrop_core::{UploadResult, UploadUiState};

use super::format::{failure_text, format_file_size};
use crate::theme::PALETTE;

#[component]
pub fn UploadStatus(state: UploadUiState, url_endpoint: Option<String>) -> Element {
    let colors = PALETTE;

    match &state {
        UploadUiState::Idle => rsx! {},
        UploadUiState::InProgress(percent) => rsx! {
            div {
                style: "margin-top: 16px;",
                div {
                    style: "
                        height: 8px;
                        border-radius: 4px;
                        background: {colors.border};
                        overflow: hidden;
                    ",
                    div {
                        style: "height: 100%; width: {percent}%; background: {colors.accent};",
                    }
                }
                p {
                    style: "margin: 6px 0 0; font-size: 12px; color: {colors.text_muted};",
                    "Uploading... {percent}%"
                }
            }
        },
        UploadUiState::Failed(..) => {
            let message = failure_text(&state).unwrap_or_default();
            rsx! {
                p {
                    role: "alert",
                    style: "margin-top: 16px; color: {colors.error};",
                    "{message}"
                }
            }
        }
        UploadUiState::Succeeded(result) => rsx! {
            ResultCard { result: result.clone(), url_endpoint }
        },
    }
}

#[component]
fn ResultCard(result: UploadResult, url_endpoint: Option<String>) -> Element {
    let colors = PALETTE;
    let href = result.delivery_url(url_endpoint.as_deref());
    let size = format_file_size(result.size);
    let dimensions = match (result.width, result.height) {
        (Some(width), Some(height)) => Some(format!("{width} x {height}")),
        _ => None,
    };

    rsx! {
        div {
            style: "
                margin-top: 16px;
                padding: 16px;
                border: 1px solid {colors.border};
                border-radius: 8px;
                background: {colors.bg_primary};
            ",

            p {
                style: "margin: 0 0 12px; color: {colors.success}; font-weight: 600;",
                "Upload complete"
            }

            if result.is_image() {
                img {
                    src: "{href}",
                    alt: "{result.name}",
                    style: "max-width: 100%; max-height: 240px; border-radius: 6px; margin-bottom: 12px;",
                }
            }

            a {
                href: "{href}",
                target: "_blank",
                style: "color: {colors.accent}; word-break: break-all;",
                "{result.name}"
            }

            dl {
                style: "
                    display: grid;
                    grid-template-columns: auto 1fr;
                    gap: 4px 12px;
                    margin: 12px 0 0;
                    font-size: 12px;
                    color: {colors.text_muted};
                ",
                dt { "Size" }
                dd { style: "margin: 0;", "{size}" }
                if let Some(dimensions) = dimensions {
                    dt { "Dimensions" }
                    dd { style: "margin: 0;", "{dimensions}" }
                }
                dt { "File ID" }
                dd { style: "margin: 0; font-family: monospace;", "{result.file_id}" }
                dt { "Path" }
                dd { style: "margin: 0; font-family: monospace;", "{result.file_path}" }
            }
        }
    }
}
