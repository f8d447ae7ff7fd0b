//! Application state management
//!
//! Shared state accessible via Dioxus context providers.

use std::sync::Arc;

use mediadrop_core::{HttpUploadController, UploadConfig};

/// Upload services resolved once at startup
#[derive(Clone)]
pub struct AppState {
    /// Upload controller, absent when configuration failed
    pub controller: Option<Arc<HttpUploadController>>,
    /// Media-delivery base URL used to render results
    pub url_endpoint: Option<String>,
    /// Startup error shown in place of the form actions
    pub setup_error: Option<String>,
}

impl AppState {
    /// Resolve configuration from the environment and build the controller.
    pub fn from_env() -> Self {
        match UploadConfig::from_env() {
            Ok(config) => Self::from_config(&config),
            Err(error) => {
                tracing::error!("Invalid upload configuration: {}", error);
                Self::unavailable(error.to_string())
            }
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        match HttpUploadController::from_config(config) {
            Ok(controller) => {
                tracing::info!(
                    auth_endpoint = %config.auth_endpoint,
                    upload_endpoint = %config.upload_endpoint,
                    folder = %config.default_folder,
                    "Upload controller ready"
                );
                Self {
                    controller: Some(Arc::new(controller)),
                    url_endpoint: config.url_endpoint.clone(),
                    setup_error: None,
                }
            }
            Err(error) => {
                tracing::error!("Failed to build upload controller: {}", error);
                Self::unavailable(error.to_string())
            }
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            controller: None,
            url_endpoint: None,
            setup_error: Some(message),
        }
    }
}
