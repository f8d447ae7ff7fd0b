//! Text helpers for the upload page.

use mediadrop_core::UploadUiState;

const KIB_BYTES: u64 = 1024;
const MIB_BYTES: u64 = KIB_BYTES * 1024;
const GIB_BYTES: u64 = MIB_BYTES * 1024;

pub(super) fn format_file_size(bytes: u64) -> String {
    if bytes < KIB_BYTES {
        format!("{bytes} B")
    } else if bytes < MIB_BYTES {
        format_scaled_one_decimal(bytes, KIB_BYTES, "KB")
    } else if bytes < GIB_BYTES {
        format_scaled_one_decimal(bytes, MIB_BYTES, "MB")
    } else {
        format_scaled_one_decimal(bytes, GIB_BYTES, "GB")
    }
}

fn format_scaled_one_decimal(bytes: u64, unit: u64, suffix: &str) -> String {
    let mut whole = bytes / unit;
    let mut tenth = ((bytes % unit) * 10 + (unit / 2)) / unit;

    if tenth == 10 {
        whole += 1;
        tenth = 0;
    }

    format!("{whole}.{tenth} {suffix}")
}

/// User-facing text for a failed attempt, if the state is `Failed`.
pub(super) fn failure_text(state: &UploadUiState) -> Option<String> {
    let UploadUiState::Failed(kind, message) = state else {
        return None;
    };
    let summary = kind.user_message();
    if kind.shows_detail() && !message.trim().is_empty() {
        Some(format!("{summary} ({message})"))
    } else {
        Some(summary.to_string())
    }
}
