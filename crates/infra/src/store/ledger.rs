use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paytv_billing::BillingPeriod;
use paytv_core::ExpectedVersion;

/// Store operation error.
///
/// These are infrastructure errors (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Versioned copy of every stored billing period.
///
/// The version starts at 0 for an empty store and increases by one on every
/// successful replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u64,
    pub periods: Vec<BillingPeriod>,
}

/// Persistence sink for billing periods: whole-list snapshot and replacement.
pub trait PeriodLedger: Send + Sync {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;

    /// Replace the whole period list if the stored version matches `expected`.
    /// Returns the new version.
    fn replace_all(
        &self,
        expected: ExpectedVersion,
        periods: Vec<BillingPeriod>,
    ) -> Result<u64, LedgerError>;
}

impl<S> PeriodLedger for Arc<S>
where
    S: PeriodLedger + ?Sized,
{
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        (**self).snapshot()
    }

    fn replace_all(
        &self,
        expected: ExpectedVersion,
        periods: Vec<BillingPeriod>,
    ) -> Result<u64, LedgerError> {
        (**self).replace_all(expected, periods)
    }
}

/// Check `expected` against `current` and return the next version.
pub(crate) fn next_version(expected: ExpectedVersion, current: u64) -> Result<u64, LedgerError> {
    if !expected.matches(current) {
        return Err(LedgerError::Concurrency(format!(
            "expected {expected:?}, found {current}"
        )));
    }
    Ok(current + 1)
}

/// In-memory ledger for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPeriodLedger {
    inner: RwLock<LedgerSnapshot>,
}

impl InMemoryPeriodLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing period list (seed data) at version 0.
    pub fn with_periods(periods: Vec<BillingPeriod>) -> Self {
        Self {
            inner: RwLock::new(LedgerSnapshot {
                version: 0,
                periods,
            }),
        }
    }
}

impl PeriodLedger for InMemoryPeriodLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.clone())
    }

    fn replace_all(
        &self,
        expected: ExpectedVersion,
        periods: Vec<BillingPeriod>,
    ) -> Result<u64, LedgerError> {
        let mut state = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        let version = next_version(expected, state.version)?;
        *state = LedgerSnapshot { version, periods };
        Ok(version)
    }
}
