use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub server_version: String,

    /// Updates retained per key; once full, the oldest entry is evicted
    /// on every new publish.
    pub history_capacity: usize,

    /// Long-poll wait (seconds) used when a fetch carries no usable
    /// `watch` parameter.
    pub default_watch_seconds: u64,

    /// Upper bound (seconds) on client-requested `watch` windows, so a
    /// single request cannot park itself indefinitely.
    pub max_watch_seconds: u64,
}

impl AppConfig {
    pub fn load_from_file(path: &str) -> Self {
        let file = fs::read_to_string(Path::new(path))
            .expect("Failed to read config.json");

        serde_json::from_str::<AppConfig>(&file)
            .expect("Invalid config.json")
    }
}
