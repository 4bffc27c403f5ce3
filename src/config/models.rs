use recitation_core::{FailurePolicy, PlaybackPolicy, PreambleRepeat, SectionId};
use serde::Deserialize;

/// Flattened player configuration; the on-disk form is sectioned (see
/// `tables.rs`).
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_data_dir")]
    pub data_dir: String,
    #[serde(default = "crate::config::defaults::default_max_page")]
    pub max_page: u32,
    #[serde(default = "crate::config::defaults::default_preamble_locator")]
    pub preamble_locator: String,
    #[serde(default = "crate::config::defaults::default_preamble_exempt_sections")]
    pub preamble_exempt_sections: Vec<SectionId>,
    #[serde(default)]
    pub on_audio_failure: FailurePolicy,
    #[serde(default)]
    pub preamble_repeat: PreambleRepeat,
    #[serde(default = "crate::config::defaults::default_preload_next")]
    pub preload_next: bool,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub volume: f32,
    #[serde(default = "crate::config::defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub text_mode: TextMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: crate::config::defaults::default_data_dir(),
            max_page: crate::config::defaults::default_max_page(),
            preamble_locator: crate::config::defaults::default_preamble_locator(),
            preamble_exempt_sections: crate::config::defaults::default_preamble_exempt_sections(),
            on_audio_failure: FailurePolicy::default(),
            preamble_repeat: PreambleRepeat::default(),
            preload_next: crate::config::defaults::default_preload_next(),
            volume: crate::config::defaults::default_volume(),
            poll_interval_ms: crate::config::defaults::default_poll_interval_ms(),
            fetch_timeout_secs: crate::config::defaults::default_fetch_timeout_secs(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            log_level: crate::config::defaults::default_log_level(),
            text_mode: TextMode::default(),
        }
    }
}

impl AppConfig {
    pub fn playback_policy(&self) -> PlaybackPolicy {
        PlaybackPolicy {
            preamble_locator: self.preamble_locator.clone(),
            preamble_exempt: self.preamble_exempt_sections.clone(),
            on_audio_failure: self.on_audio_failure,
            preamble_repeat: self.preamble_repeat,
            preload_next: self.preload_next,
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Which texts of a verse the display prints.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    Arabic,
    #[default]
    Both,
    Translation,
}

impl std::fmt::Display for TextMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TextMode::Arabic => "arabic",
            TextMode::Both => "both",
            TextMode::Translation => "translation",
        };
        f.write_str(label)
    }
}
