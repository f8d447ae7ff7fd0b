//! mediadrop Desktop Application
//!
//! A single-page desktop app that uploads a chosen file to the hosted media
//! service using short-lived signed credentials.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod components;
mod services;
mod state;
mod theme;

use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediadrop=debug".parse().expect("valid directive")),
        )
        .init();

    tracing::info!("Starting mediadrop...");

    let window = WindowBuilder::new()
        .with_title("mediadrop")
        .with_inner_size(LogicalSize::new(640.0, 560.0));
    let config = Config::new().with_window(window);

    dioxus::LaunchBuilder::new()
        .with_cfg(config)
        .launch(app::App);
}
