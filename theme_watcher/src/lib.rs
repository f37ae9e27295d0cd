//! Headless theme applicator: polls the latest-theme endpoint and applies
//! every new theme it sees.

pub mod history;
pub mod structs;
pub mod watcher;

pub use structs::Config;
pub use watcher::{PollOutcome, ThemeWatcher};

/// Context for the watcher binary.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub watcher: ThemeWatcher,
}

impl tr_app::ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        let watcher =
            ThemeWatcher::new(config.latest_url(), config.history_limit);

        Self { config, watcher }
    }
}
