//! Configuration loading for the recitation player.
//!
//! Settings live in `conf/config.toml`, grouped into `[content]`,
//! `[playback]`, `[audio]`, `[storage]`, `[display]` and `[logging]` tables. Missing or
//! invalid entries fall back to defaults so the player can always start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, serialize_config};
pub use models::{AppConfig, LogLevel, TextMode};
