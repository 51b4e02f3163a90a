mod api;
mod app;
mod chat;
mod config;
mod event;
mod language;
mod library;
mod storage;
mod theme;
mod ui;

use api::{ApiClient, Backend};
use app::HerotopiaApp;
use config::AppConfig;
use eframe::egui;
use std::sync::mpsc;
use storage::{KeyValueStore, LocalState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn install_panic_logger() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        error!(%panic_info, "unhandled panic");
        default_hook(panic_info);
    }));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    install_panic_logger();

    let config = AppConfig::from_env()?;
    info!(
        base_url = %config.base_url,
        data_dir = %config.data_dir.display(),
        "starting Herotopia"
    );

    let local_state = LocalState::new(KeyValueStore::new(config.data_dir.clone()));
    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("herotopia-runtime")
        .build()?;

    let api = ApiClient::new(config.base_url.clone());
    let backend =
        runtime.block_on(async { Backend::new(api, tx.clone(), config.download_dir.clone()) })?;

    let app = HerotopiaApp::new(rx, backend, local_state, config.autosave_interval);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Herotopia",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
