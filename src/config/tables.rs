use super::defaults;
use super::models::{AppConfig, LogLevel, TextMode};
use recitation_core::{FailurePolicy, PreambleRepeat, SectionId};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    content: ContentConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            data_dir: tables.content.data_dir,
            max_page: tables.content.max_page,
            preamble_locator: tables.playback.preamble_locator,
            preamble_exempt_sections: tables.playback.preamble_exempt_sections,
            on_audio_failure: tables.playback.on_audio_failure,
            preamble_repeat: tables.playback.preamble_repeat,
            preload_next: tables.playback.preload_next,
            volume: tables.audio.volume,
            poll_interval_ms: tables.audio.poll_interval_ms,
            fetch_timeout_secs: tables.audio.fetch_timeout_secs,
            cache_dir: tables.storage.cache_dir,
            log_level: tables.logging.log_level,
            text_mode: tables.display.text_mode,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            content: ContentConfig {
                data_dir: config.data_dir.clone(),
                max_page: config.max_page,
            },
            playback: PlaybackConfig {
                preamble_locator: config.preamble_locator.clone(),
                preamble_exempt_sections: config.preamble_exempt_sections.clone(),
                on_audio_failure: config.on_audio_failure,
                preamble_repeat: config.preamble_repeat,
                preload_next: config.preload_next,
            },
            audio: AudioConfig {
                volume: config.volume,
                poll_interval_ms: config.poll_interval_ms,
                fetch_timeout_secs: config.fetch_timeout_secs,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
            display: DisplayConfig {
                text_mode: config.text_mode,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ContentConfig {
    #[serde(default = "defaults::default_data_dir")]
    data_dir: String,
    #[serde(default = "defaults::default_max_page")]
    max_page: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            data_dir: defaults::default_data_dir(),
            max_page: defaults::default_max_page(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_preamble_locator")]
    preamble_locator: String,
    #[serde(default = "defaults::default_preamble_exempt_sections")]
    preamble_exempt_sections: Vec<SectionId>,
    #[serde(default)]
    on_audio_failure: FailurePolicy,
    #[serde(default)]
    preamble_repeat: PreambleRepeat,
    #[serde(default = "defaults::default_preload_next")]
    preload_next: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            preamble_locator: defaults::default_preamble_locator(),
            preamble_exempt_sections: defaults::default_preamble_exempt_sections(),
            on_audio_failure: FailurePolicy::default(),
            preamble_repeat: PreambleRepeat::default(),
            preload_next: defaults::default_preload_next(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AudioConfig {
    #[serde(default = "defaults::default_volume")]
    volume: f32,
    #[serde(default = "defaults::default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "defaults::default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            volume: defaults::default_volume(),
            poll_interval_ms: defaults::default_poll_interval_ms(),
            fetch_timeout_secs: defaults::default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
struct DisplayConfig {
    #[serde(default)]
    text_mode: TextMode,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
