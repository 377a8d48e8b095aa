//! Core traits for persistence, notification and time
//!
//! These are the seams between the ledger and its collaborators. The ledger is
//! generic over the store so tests can swap the persistence medium, and holds
//! the notifier and clock as trait objects.

use crate::types::{LedgerError, TransactionEvent};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Result of a committed `AtomicStore::write`
///
/// The updater's return value is always present once the write is committed
/// in memory. `persist_error` is set when the persistence medium failed to
/// keep up; the in-memory value is still the new one.
#[derive(Debug)]
pub struct Committed<R> {
    pub value: R,
    pub persist_error: Option<LedgerError>,
}

/// Key-value store with read-modify-write semantics
///
/// Implementations guarantee that each updater observes the effect of every
/// write committed before it on the same key, so no update is lost under
/// rapid or interleaved mutation.
pub trait AtomicStore: Send + Sync {
    /// Read the committed value for `key`, or `T::default()` if absent
    fn read<T>(&self, key: &str) -> Result<T, LedgerError>
    where
        T: DeserializeOwned + Default;

    /// Apply `updater` to the latest committed value for `key`
    ///
    /// If the updater returns an error nothing is committed and the error is
    /// returned as-is. The updater must not call back into the store.
    fn write<T, R, F>(&self, key: &str, updater: F) -> Result<Committed<R>, LedgerError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R, LedgerError>;
}

/// Outbound messaging collaborator
///
/// Dispatch is fire-and-forget from the ledger's point of view: a returned
/// error is logged and never reaches the caller of `create`.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, event: &TransactionEvent) -> Result<(), LedgerError>;
}

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn dispatch(&self, _event: &TransactionEvent) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Source of timestamps for ids, lifecycle stamps and commissions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let start = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance_millis(1_500);
        assert_eq!(clock.now().timestamp_millis(), 1_700_000_001_500);
    }
}
