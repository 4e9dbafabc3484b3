//! Source of "today" for menu freshness, vote uniqueness and winner tallies.
//!
//! Handlers never read the system date directly; they ask the [`Clock`] held
//! in application state so tests can pin the date.

use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Current UTC date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to a settable date.
#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<RwLock<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(RwLock::new(date)),
        }
    }

    /// Moves the clock; clones share the same date.
    pub fn set(&self, date: NaiveDate) {
        let mut guard = self.date.write().unwrap_or_else(|poison| poison.into_inner());
        *guard = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.read().unwrap_or_else(|poison| poison.into_inner())
    }
}
