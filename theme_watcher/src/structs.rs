use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_theme_source_url")]
    pub theme_source_url: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_theme_source_url() -> String {
    "http://127.0.0.1:3030".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_history_limit() -> usize {
    10
}

impl Config {
    #[must_use]
    pub fn latest_url(&self) -> String {
        format!(
            "{base}/webhook/latest",
            base = self.theme_source_url.trim_end_matches('/')
        )
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
