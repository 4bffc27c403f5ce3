//! Entry point for the recitation player.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml` (or `--config`).
//! - Launch the terminal player on the requested view.

mod app;
mod audio;
mod cache;
mod commands;
mod config;
mod display;

use crate::app::run_app;
use crate::commands::parse_args;
use crate::config::load_config;
use anyhow::{Context, Result};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let launch = parse_args(env::args().skip(1))?;
    let config = load_config(&launch.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %launch.config_path.display(),
        level = %config.log_level,
        "Starting recitation player"
    );
    info!(
        data_dir = %config.data_dir,
        cache_dir = %config.cache_dir,
        on_audio_failure = ?config.on_audio_failure,
        preamble_repeat = ?config.preamble_repeat,
        preload_next = config.preload_next,
        "Active playback configuration"
    );
    run_app(config, launch.mode).context("Failed to run the player")?;
    Ok(())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
