//! JSON-file backed stores.
//!
//! Each store keeps its state in memory and rewrites the whole file on every
//! change. Writes go to a sibling temp file, which is flushed to disk before
//! being renamed over the target, so a crash mid-write leaves the previous
//! file intact.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use paytv_billing::BillingPeriod;
use paytv_core::ExpectedVersion;
use paytv_subscribers::{Branch, Subscriber, SubscriberDirectory};

use super::directory::DirectoryStore;
use super::ledger::{LedgerError, LedgerSnapshot, PeriodLedger, next_version};

pub const PERIODS_FILE: &str = "periods.json";
pub const DIRECTORY_FILE: &str = "directory.json";

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, LedgerError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn prepare(dir: &Path, file: &str) -> Result<PathBuf, LedgerError> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(file))
}

/// Ledger persisted as `<dir>/periods.json`.
#[derive(Debug)]
pub struct JsonFilePeriodLedger {
    path: PathBuf,
    state: RwLock<LedgerSnapshot>,
}

impl JsonFilePeriodLedger {
    /// Open (or lazily create) the ledger file under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = prepare(dir.as_ref(), PERIODS_FILE)?;
        let state = read_or_default(&path)?;
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }
}

impl PeriodLedger for JsonFilePeriodLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.clone())
    }

    fn replace_all(
        &self,
        expected: ExpectedVersion,
        periods: Vec<BillingPeriod>,
    ) -> Result<u64, LedgerError> {
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        let version = next_version(expected, state.version)?;
        let next = LedgerSnapshot { version, periods };
        // Memory is only updated once the file is durable.
        write_atomic(&self.path, &next)?;
        *state = next;
        Ok(version)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DirectoryFile {
    branches: Vec<Branch>,
    subscribers: Vec<Subscriber>,
}

impl DirectoryFile {
    fn from_directory(directory: &SubscriberDirectory) -> Self {
        Self {
            branches: directory.branches().into_iter().cloned().collect(),
            subscribers: directory.subscribers().into_iter().cloned().collect(),
        }
    }
}

/// Directory persisted as `<dir>/directory.json`.
#[derive(Debug)]
pub struct JsonFileDirectoryStore {
    path: PathBuf,
    state: RwLock<SubscriberDirectory>,
}

impl JsonFileDirectoryStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = prepare(dir.as_ref(), DIRECTORY_FILE)?;
        let file: DirectoryFile = read_or_default(&path)?;
        Ok(Self {
            path,
            state: RwLock::new(SubscriberDirectory::from_parts(file.branches, file.subscribers)),
        })
    }

    fn update(&self, apply: impl FnOnce(&mut SubscriberDirectory)) -> Result<(), LedgerError> {
        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        let mut next = state.clone();
        apply(&mut next);
        write_atomic(&self.path, &DirectoryFile::from_directory(&next))?;
        *state = next;
        Ok(())
    }
}

impl DirectoryStore for JsonFileDirectoryStore {
    fn directory(&self) -> Result<SubscriberDirectory, LedgerError> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.clone())
    }

    fn upsert_branch(&self, branch: Branch) -> Result<(), LedgerError> {
        self.update(|d| d.insert_branch(branch))
    }

    fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<(), LedgerError> {
        self.update(|d| d.insert_subscriber(subscriber))
    }
}
