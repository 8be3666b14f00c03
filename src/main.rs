use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

mod app;
mod header;
mod page;
mod shared;
mod ui;
mod widgets;


use shared::{Config, Dictionaries, DictionariesBuilder, LocalStorage};

type ReloadHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() -> Result<()> {
    let log_handle = init_tracing();
    let config = Config::load();
    apply_log_level(&log_handle, config.log_level.as_filter_str());
    info!(version = env!("CARGO_PKG_VERSION"), "Starting gymx-header");

    let dictionaries = load_dictionaries(&config)?;
    let storage = match LocalStorage::open_default() {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!("Language preference will not be saved: {e:#}");
            None
        }
    };

    // Initialize the application
    let app = app::App::new(config, dictionaries, storage, app::terminal_size());

    // Run the TUI
    app.run().await?;

    Ok(())
}

/// Log to a file in the data directory; the terminal belongs to the UI.
/// Without a log file the subscriber still filters but writes nothing.
fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    let file_layer = open_log_file().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Mutex::new(file))
    });
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(file_layer)
        .init();
    handle
}

fn open_log_file() -> Option<File> {
    let dir = shared::app_data_dir().ok()?;
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("gymx-header.log"))
        .ok()
}

/// The configured level applies unless RUST_LOG is set
fn apply_log_level(handle: &ReloadHandle, level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}

/// Built-in dictionaries plus the configured extra fragments. A fragment
/// that cannot be read is skipped.
fn load_dictionaries(config: &Config) -> Result<Arc<Dictionaries>> {
    let mut builder = DictionariesBuilder::with_builtin()?;
    for path in &config.translations {
        if let Err(e) = builder.register_file(path) {
            warn!("Skipping translations: {e:#}");
        }
    }
    Ok(builder.build())
}
