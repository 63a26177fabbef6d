//! Persistence boundary for the ledger of billing periods and the
//! branch/subscriber directory.
//!
//! Both stores hand out whole snapshots and accept whole replacements (or
//! single-record upserts); the billing engine never sees storage details.

pub mod directory;
pub mod json_file;
pub mod ledger;

pub use directory::{DirectoryStore, InMemoryDirectoryStore};
pub use json_file::{JsonFileDirectoryStore, JsonFilePeriodLedger};
pub use ledger::{InMemoryPeriodLedger, LedgerError, LedgerSnapshot, PeriodLedger};
