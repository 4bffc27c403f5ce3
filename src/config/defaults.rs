use recitation_core::{DEFAULT_MAX_PAGE, PREAMBLE_LOCATOR, SectionId};

pub(crate) fn default_data_dir() -> String {
    "data".to_string()
}

pub(crate) fn default_max_page() -> u32 {
    DEFAULT_MAX_PAGE
}

pub(crate) fn default_preamble_locator() -> String {
    PREAMBLE_LOCATOR.to_string()
}

pub(crate) fn default_preamble_exempt_sections() -> Vec<SectionId> {
    recitation_core::playback::DEFAULT_PREAMBLE_EXEMPT.to_vec()
}

pub(crate) fn default_preload_next() -> bool {
    true
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    50
}

pub(crate) fn default_fetch_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
