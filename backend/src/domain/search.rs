//! Roster search and input debouncing.

use log::debug;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::domain::models::{AttendanceSheet, SheetRow};

/// Rows whose id or name contains `query`, case-insensitively.
///
/// The query is trimmed; an empty query matches every row.
pub fn filter_members<'a>(sheet: &'a AttendanceSheet, query: &str) -> Vec<SheetRow<'a>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return sheet.rows().collect();
    }

    let matches: Vec<SheetRow<'a>> = sheet
        .rows()
        .filter(|row| {
            row.member.id().to_lowercase().contains(&needle)
                || row.member.name.to_lowercase().contains(&needle)
        })
        .collect();

    debug!("Search '{}' matched {} of {} members", needle, matches.len(), sheet.len());
    matches
}

/// Coalesces bursts of calls into one: every `call` restarts the delay and
/// cancels the pending invocation, so only the last action of a burst runs.
///
/// Must be used from within a tokio runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Drop the pending invocation, if any
    pub fn cancel(&self) {
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
