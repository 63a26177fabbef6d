use std::sync::{Arc, RwLock};

use paytv_subscribers::{Branch, Subscriber, SubscriberDirectory};

use super::ledger::LedgerError;

/// Branch and subscriber records.
pub trait DirectoryStore: Send + Sync {
    /// Consistent copy of every branch and subscriber.
    fn directory(&self) -> Result<SubscriberDirectory, LedgerError>;
    fn upsert_branch(&self, branch: Branch) -> Result<(), LedgerError>;
    fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<(), LedgerError>;
}

impl<S> DirectoryStore for Arc<S>
where
    S: DirectoryStore + ?Sized,
{
    fn directory(&self) -> Result<SubscriberDirectory, LedgerError> {
        (**self).directory()
    }

    fn upsert_branch(&self, branch: Branch) -> Result<(), LedgerError> {
        (**self).upsert_branch(branch)
    }

    fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<(), LedgerError> {
        (**self).upsert_subscriber(subscriber)
    }
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    inner: RwLock<SubscriberDirectory>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(directory: SubscriberDirectory) -> Self {
        Self {
            inner: RwLock::new(directory),
        }
    }
}

impl DirectoryStore for InMemoryDirectoryStore {
    fn directory(&self) -> Result<SubscriberDirectory, LedgerError> {
        let map = self.inner.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(map.clone())
    }

    fn upsert_branch(&self, branch: Branch) -> Result<(), LedgerError> {
        let mut map = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        map.insert_branch(branch);
        Ok(())
    }

    fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<(), LedgerError> {
        let mut map = self.inner.write().map_err(|_| LedgerError::Poisoned)?;
        map.insert_subscriber(subscriber);
        Ok(())
    }
}
