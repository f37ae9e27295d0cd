use std::{fmt::Write, future::Future, time::Duration};

use chrono::Utc;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use types::{LatestResponse, Theme, ThemeEnvelope, legacy_aliases};

use crate::history::{AppliedHistory, AppliedTheme};

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("theme source reported a failure")]
    SourceFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Nothing has been published yet.
    Empty,
    /// Same theme as the last one applied.
    Unchanged,
    Applied(AppliedTheme),
}

/// Pulls the latest theme on an interval and applies it when it changes.
#[derive(Debug)]
pub struct ThemeWatcher {
    client: reqwest::Client,
    latest_url: String,
    last_marker: Option<String>,
    history: AppliedHistory,
}

impl ThemeWatcher {
    #[must_use]
    pub fn new(latest_url: String, history_limit: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            latest_url,
            last_marker: None,
            history: AppliedHistory::new(history_limit),
        }
    }

    #[must_use]
    pub const fn history(&self) -> &AppliedHistory {
        &self.history
    }

    /// Fetch the latest theme once and apply it if it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response cannot be
    /// decoded, or the source reports a failure.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, WatchError> {
        let response = self
            .client
            .get(&self.latest_url)
            .send()
            .await?
            .error_for_status()?
            .json::<LatestResponse>()
            .await?;

        if !response.success {
            return Err(WatchError::SourceFailure);
        }

        Ok(self.observe(response.data))
    }

    /// Compare `data` with the last applied theme and apply it if it
    /// differs.
    pub fn observe(&mut self, data: Option<ThemeEnvelope>) -> PollOutcome {
        let Some(envelope) = data else {
            return PollOutcome::Empty;
        };

        let marker = envelope.change_marker();
        if self.last_marker.as_deref() == Some(marker.as_str()) {
            return PollOutcome::Unchanged;
        }

        let applied = AppliedTheme {
            styles: render_styles(&envelope.theme),
            theme_id: envelope.theme_id,
            theme_name: envelope.theme_name,
            marker: marker.clone(),
            applied_at: Utc::now(),
        };

        tracing::info!(
            theme_id = %applied.theme_id,
            theme_name = applied.theme_name.as_deref().unwrap_or_default(),
            styles = %applied.styles,
            "applied theme"
        );

        self.last_marker = Some(marker);
        self.history.push(applied.clone());

        PollOutcome::Applied(applied)
    }

    /// Poll forever on `interval`, until Ctrl+C. Failures are logged and
    /// the next tick simply tries again.
    pub async fn run(self, interval: Duration) {
        self.run_until(interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Poll on `interval` until `stop` resolves. A stop that arrives while
    /// a poll is in flight ends the loop without waiting for it.
    pub async fn run_until<F>(mut self, interval: Duration, stop: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                () = &mut stop => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                () = &mut stop => break,
                outcome = self.poll_once() => match outcome {
                    Ok(PollOutcome::Applied(_)) => {
                        tracing::debug!(
                            history = self.history.len(),
                            "theme history updated"
                        );
                    }
                    Ok(outcome) => {
                        tracing::debug!(?outcome, "no theme change");
                    }
                    Err(e) => {
                        tracing::warn!("theme check failed: {e}");
                    }
                },
            }
        }

        tracing::info!("stopping theme watcher");
    }
}

/// The style-variable document plus the legacy short aliases.
#[must_use]
pub fn render_styles(theme: &Theme) -> String {
    let mut styles = theme.css_variables();

    styles.push_str(":root {\n");
    for (name, value) in legacy_aliases(theme) {
        let _ = writeln!(styles, "  {name}: {value};");
    }
    styles.push_str("}\n");

    styles
}
