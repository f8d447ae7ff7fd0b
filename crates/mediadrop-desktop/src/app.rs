//! Main application component

use dioxus::prelude::*;

use crate::components::UploadForm;
use crate::state::AppState;
use crate::theme::PALETTE;

/// Root application component
#[component]
pub fn App() -> Element {
    use_context_provider(AppState::from_env);
    let colors = PALETTE;

    rsx! {
        div {
            class: "app-container",
            style: "
                min-height: 100vh;
                font-family: system-ui, -apple-system, sans-serif;
                font-size: 14px;
                background: {colors.bg_secondary};
                color: {colors.text_primary};
            ",

            main {
                style: "max-width: 560px; margin: 0 auto; padding: 32px 24px;",

                h1 { style: "font-size: 22px; margin: 0 0 4px;", "Upload a file" }
                p {
                    style: "margin: 0 0 20px; color: {colors.text_muted};",
                    "Files are sent straight to the media service with a one-time signed credential."
                }

                UploadForm {}
            }
        }
    }
}
