use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// A theme the watcher has applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTheme {
    pub theme_id: String,
    pub theme_name: Option<String>,
    pub marker: String,
    pub styles: String,
    pub applied_at: DateTime<Utc>,
}

/// Bounded log of applied themes, newest last. Only kept for display;
/// change detection never reads it.
#[derive(Debug, Clone)]
pub struct AppliedHistory {
    entries: VecDeque<AppliedTheme>,
    limit: usize,
}

impl AppliedHistory {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, applied: AppliedTheme) {
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(applied);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&AppliedTheme> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedTheme> {
        self.entries.iter()
    }
}
