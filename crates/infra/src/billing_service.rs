//! Billing application service.
//!
//! Composes the directory store, the period ledger and a clock around the pure
//! billing engine:
//!
//! ```text
//! request
//!   ↓
//! 1. Take the subscriber's write lock
//!   ↓
//! 2. Snapshot directory + ledger (versioned)
//!   ↓
//! 3. Window → selection → reconcile (pure)
//!   ↓
//! 4. Replace the ledger at the snapshot version (optimistic concurrency)
//! ```
//!
//! A version conflict on step 4 means another writer (a different subscriber
//! or the aging sweep) replaced the ledger in between; the whole pipeline is
//! re-run from a fresh snapshot a bounded number of times.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use paytv_billing::{
    BillingError, BillingPeriod, DashboardSummary, DisplayPeriod, IntegrityWarning, PeriodRef,
    Selection, SelectionBuckets, SelectionState, Shortcut, Verdict, build_window, classify,
    ensure_selection_belongs_to, mark_overdue, reconcile, summarize,
};
use paytv_core::{
    BillingMonth, BranchId, Clock, DomainError, ExpectedVersion, PeriodId, SubscriberId,
    SystemClock,
};
use paytv_subscribers::{Branch, ContactInfo, Subscriber, SubscriberDirectory};

use crate::config::AppConfig;
use crate::store::{
    DirectoryStore, InMemoryDirectoryStore, InMemoryPeriodLedger, JsonFileDirectoryStore,
    JsonFilePeriodLedger, LedgerError, PeriodLedger,
};

/// Attempts of the snapshot → write pipeline before a conflict is surfaced.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input or a domain rule rejected the request.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// The payment selection could not be applied; nothing was written.
    #[error("invalid selection: {0}")]
    Selection(String),
    /// Optimistic concurrency failure that survived the retries.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),
    #[error("store failure: {0}")]
    Store(LedgerError),
}

impl From<LedgerError> for ServiceError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Concurrency(msg) => ServiceError::Concurrency(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(msg) => ServiceError::NotFound(msg),
            DomainError::Conflict(msg) => ServiceError::Concurrency(msg),
        }
    }
}

impl From<BillingError> for ServiceError {
    fn from(value: BillingError) -> Self {
        ServiceError::Selection(value.to_string())
    }
}

/// What an operator asked to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRequest {
    /// Explicit period references, as shown in the payment window.
    References(Vec<PeriodRef>),
    /// A named bulk selection, resolved against the current window.
    Shortcut(Shortcut),
}

/// Subscriber record plus the derived payment view shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberOverview {
    #[serde(flatten)]
    pub subscriber: Subscriber,
    pub branch_name: Option<String>,
    pub monthly_price: Option<u64>,
    pub payment: Verdict,
}

/// The payment dialog: full window, selection buckets and the suggested
/// (smart default) selection.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentWindow {
    pub subscriber_id: SubscriberId,
    pub current_month: BillingMonth,
    pub periods: Vec<DisplayPeriod>,
    pub buckets: SelectionBuckets,
    pub suggested: Vec<PeriodRef>,
    pub warnings: Vec<IntegrityWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub subscriber_id: SubscriberId,
    pub paid_at: DateTime<Utc>,
    /// Periods settled by this payment, in ledger order.
    pub settled: Vec<BillingPeriod>,
    pub materialized: usize,
    pub total_amount: u64,
    pub ledger_version: u64,
    /// Payment status right after the payment.
    pub payment: Verdict,
    pub warnings: Vec<IntegrityWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub flipped: usize,
    pub ledger_version: u64,
}

/// One mutex per registered subscriber, created on first payment.
///
/// Callers must only ask for ids already present in the directory; subscribers
/// are never removed, so the map is bounded by the directory size.
#[derive(Debug, Default)]
struct SubscriberLocks {
    inner: Mutex<HashMap<SubscriberId, Arc<Mutex<()>>>>,
}

impl SubscriberLocks {
    fn handle(&self, subscriber: &Subscriber) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(subscriber.id_typed().clone()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct BillingService {
    directories: Arc<dyn DirectoryStore>,
    ledger: Arc<dyn PeriodLedger>,
    clock: Arc<dyn Clock>,
    locks: SubscriberLocks,
    /// Serializes read-modify-write of directory records.
    directory_write: Mutex<()>,
}

impl BillingService {
    pub fn new(
        directories: Arc<dyn DirectoryStore>,
        ledger: Arc<dyn PeriodLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directories,
            ledger,
            clock,
            locks: SubscriberLocks::default(),
            directory_write: Mutex::new(()),
        }
    }

    /// Empty in-memory stores (tests/dev).
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryDirectoryStore::new()),
            Arc::new(InMemoryPeriodLedger::new()),
            clock,
        )
    }

    /// JSON-file stores when a data directory is configured, in-memory otherwise.
    pub fn from_config(config: &AppConfig) -> Result<Self, LedgerError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let Some(dir) = &config.data_dir else {
            tracing::info!("no data directory configured; using in-memory stores");
            return Ok(Self::in_memory(clock));
        };
        tracing::info!(data_dir = %dir.display(), "opening JSON-file stores");
        Ok(Self::new(
            Arc::new(JsonFileDirectoryStore::open(dir)?),
            Arc::new(JsonFilePeriodLedger::open(dir)?),
            clock,
        ))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ---- branches ----

    pub fn create_branch(&self, name: &str, monthly_price: u64) -> ServiceResult<Branch> {
        let branch = Branch::open(BranchId::new(), name, monthly_price, self.clock.now())?;
        self.directories.upsert_branch(branch.clone())?;
        tracing::info!(branch_id = %branch.id_typed(), monthly_price, "branch created");
        Ok(branch)
    }

    pub fn list_branches(&self) -> ServiceResult<Vec<Branch>> {
        let directory = self.directories.directory()?;
        Ok(directory.branches().into_iter().cloned().collect())
    }

    /// Change the monthly price. Already materialized periods keep their amount.
    pub fn set_branch_price(&self, id: &BranchId, monthly_price: u64) -> ServiceResult<Branch> {
        self.update_branch(id, |b| b.set_monthly_price(monthly_price))
    }

    pub fn set_branch_active(&self, id: &BranchId, active: bool) -> ServiceResult<Branch> {
        self.update_branch(id, |b| {
            if active {
                b.activate();
            } else {
                b.deactivate();
            }
            Ok(())
        })
    }

    fn update_branch(
        &self,
        id: &BranchId,
        apply: impl FnOnce(&mut Branch) -> Result<(), DomainError>,
    ) -> ServiceResult<Branch> {
        let _guard = self
            .directory_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut branch = self
            .directories
            .directory()?
            .branch(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("branch {id}")))?;
        apply(&mut branch)?;
        self.directories.upsert_branch(branch.clone())?;
        tracing::info!(branch_id = %id, monthly_price = branch.monthly_price(), status = ?branch.status(), "branch updated");
        Ok(branch)
    }

    // ---- subscribers ----

    pub fn register_subscriber(
        &self,
        name: &str,
        branch_id: &BranchId,
        contact: ContactInfo,
    ) -> ServiceResult<Subscriber> {
        let _guard = self
            .directory_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.directories.directory()?.branch(branch_id).is_none() {
            return Err(ServiceError::Validation(format!("unknown branch {branch_id}")));
        }
        let subscriber = Subscriber::register(
            SubscriberId::new(),
            name,
            branch_id.clone(),
            contact,
            self.clock.now(),
        )?;
        self.directories.upsert_subscriber(subscriber.clone())?;
        tracing::info!(subscriber_id = %subscriber.id_typed(), branch_id = %branch_id, "subscriber registered");
        Ok(subscriber)
    }

    pub fn list_subscribers(&self) -> ServiceResult<Vec<SubscriberOverview>> {
        let directory = self.directories.directory()?;
        let snapshot = self.ledger.snapshot()?;
        let today = self.today();

        let mut by_subscriber: HashMap<&SubscriberId, Vec<&BillingPeriod>> = HashMap::new();
        for p in &snapshot.periods {
            by_subscriber.entry(p.subscriber_id()).or_default().push(p);
        }
        let none = Vec::new();
        Ok(directory
            .subscribers()
            .into_iter()
            .map(|s| {
                let own = by_subscriber.get(s.id_typed()).unwrap_or(&none);
                overview(&directory, s, own.iter().copied(), today)
            })
            .collect())
    }

    pub fn subscriber(&self, id: &SubscriberId) -> ServiceResult<SubscriberOverview> {
        let directory = self.directories.directory()?;
        let subscriber = find_subscriber(&directory, id)?;
        let snapshot = self.ledger.snapshot()?;
        Ok(overview(&directory, subscriber, &snapshot.periods, self.today()))
    }

    pub fn set_subscriber_active(&self, id: &SubscriberId, active: bool) -> ServiceResult<Subscriber> {
        self.update_subscriber_with(id, |_, s| {
            if active {
                s.activate();
            } else {
                s.deactivate();
            }
            Ok(())
        })
    }

    /// Rename, replace contact details and/or move to another branch.
    pub fn update_subscriber(
        &self,
        id: &SubscriberId,
        name: Option<String>,
        contact: Option<ContactInfo>,
        branch_id: Option<BranchId>,
    ) -> ServiceResult<Subscriber> {
        self.update_subscriber_with(id, |directory, s| {
            if let Some(branch_id) = branch_id {
                if directory.branch(&branch_id).is_none() {
                    return Err(ServiceError::Validation(format!("unknown branch {branch_id}")));
                }
                s.move_to_branch(branch_id);
            }
            s.update_details(name, contact)?;
            Ok(())
        })
    }

    fn update_subscriber_with(
        &self,
        id: &SubscriberId,
        apply: impl FnOnce(&SubscriberDirectory, &mut Subscriber) -> ServiceResult<()>,
    ) -> ServiceResult<Subscriber> {
        let _guard = self
            .directory_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let directory = self.directories.directory()?;
        let mut subscriber = find_subscriber(&directory, id)?.clone();
        apply(&directory, &mut subscriber)?;
        self.directories.upsert_subscriber(subscriber.clone())?;
        tracing::info!(subscriber_id = %id, lifecycle = ?subscriber.lifecycle(), "subscriber updated");
        Ok(subscriber)
    }

    // ---- billing ----

    pub fn status(&self, id: &SubscriberId) -> ServiceResult<Verdict> {
        let directory = self.directories.directory()?;
        let subscriber = find_subscriber(&directory, id)?;
        let snapshot = self.ledger.snapshot()?;
        Ok(classify(subscriber, &snapshot.periods, self.today()))
    }

    pub fn window(&self, id: &SubscriberId) -> ServiceResult<PaymentWindow> {
        let directory = self.directories.directory()?;
        let subscriber = find_subscriber(&directory, id)?;
        let snapshot = self.ledger.snapshot()?;

        let window = build_window(
            subscriber,
            directory.branch_of(subscriber),
            &snapshot.periods,
            self.today(),
        );
        log_warnings(&window.warnings);

        let buckets = window.buckets();
        let mut state = SelectionState::new();
        state.seed(&buckets);

        Ok(PaymentWindow {
            subscriber_id: id.clone(),
            current_month: window.current_month,
            periods: window.periods,
            buckets,
            suggested: state.into_selection().into_iter().collect(),
            warnings: window.warnings,
        })
    }

    /// Settle the requested periods for one subscriber.
    ///
    /// All-or-nothing: on any error the ledger is left as it was.
    pub fn pay(&self, id: &SubscriberId, request: PaymentRequest) -> ServiceResult<PaymentReceipt> {
        let directory = self.directories.directory()?;
        let handle = self.locks.handle(find_subscriber(&directory, id)?);
        drop(directory);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_pay(id, &request) {
                Err(ServiceError::Concurrency(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::debug!(subscriber_id = %id, attempt, %msg, "ledger changed during payment; retrying");
                }
                other => return other,
            }
        }
    }

    fn try_pay(&self, id: &SubscriberId, request: &PaymentRequest) -> ServiceResult<PaymentReceipt> {
        let now = self.clock.now();
        let today = now.date_naive();
        let directory = self.directories.directory()?;
        let subscriber = find_subscriber(&directory, id)?;
        let snapshot = self.ledger.snapshot()?;

        let selection: Selection = match request {
            PaymentRequest::References(refs) => refs.iter().cloned().collect(),
            PaymentRequest::Shortcut(shortcut) => build_window(
                subscriber,
                directory.branch_of(subscriber),
                &snapshot.periods,
                today,
            )
            .buckets()
            .apply(*shortcut),
        };
        if selection.is_empty() {
            return Err(ServiceError::Selection("no periods selected".to_string()));
        }

        ensure_selection_belongs_to(id, &selection, &snapshot.periods)?;
        let outcome = reconcile(&selection, &directory, &snapshot.periods, now)?;
        log_warnings(&outcome.warnings);

        let touched: HashSet<&PeriodId> = outcome.paid.iter().chain(&outcome.materialized).collect();
        let settled: Vec<BillingPeriod> = outcome
            .periods
            .iter()
            .filter(|p| touched.contains(p.id_typed()))
            .cloned()
            .collect();
        let total_amount = settled
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.amount()));
        let payment = classify(subscriber, &outcome.periods, today);

        let ledger_version = self
            .ledger
            .replace_all(ExpectedVersion::Exact(snapshot.version), outcome.periods)?;

        tracing::info!(
            subscriber_id = %id,
            paid = outcome.paid.len(),
            materialized = outcome.materialized.len(),
            total_amount,
            ledger_version,
            "payment reconciled"
        );

        Ok(PaymentReceipt {
            subscriber_id: id.clone(),
            paid_at: now,
            settled,
            materialized: outcome.materialized.len(),
            total_amount,
            ledger_version,
            payment,
            warnings: outcome.warnings,
        })
    }

    // ---- reporting / maintenance ----

    /// Dashboard for `month` (defaults to the current month).
    pub fn dashboard(&self, month: Option<BillingMonth>) -> ServiceResult<DashboardSummary> {
        let today = self.today();
        let month = month.unwrap_or_else(|| BillingMonth::containing(today));
        let directory = self.directories.directory()?;
        let snapshot = self.ledger.snapshot()?;
        Ok(summarize(&directory, &snapshot.periods, month, today))
    }

    /// Persist the overdue status of every pending period past its due date.
    pub fn sweep_overdue(&self) -> ServiceResult<SweepReport> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_sweep() {
                Err(ServiceError::Concurrency(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::debug!(attempt, %msg, "ledger changed during sweep; retrying");
                }
                other => return other,
            }
        }
    }

    fn try_sweep(&self) -> ServiceResult<SweepReport> {
        let snapshot = self.ledger.snapshot()?;
        let sweep = mark_overdue(&snapshot.periods, self.today());
        if sweep.is_noop() {
            return Ok(SweepReport {
                flipped: 0,
                ledger_version: snapshot.version,
            });
        }
        let flipped = sweep.flipped.len();
        let ledger_version = self
            .ledger
            .replace_all(ExpectedVersion::Exact(snapshot.version), sweep.periods)?;
        tracing::info!(flipped, ledger_version, "overdue sweep applied");
        Ok(SweepReport {
            flipped,
            ledger_version,
        })
    }
}

fn find_subscriber<'a>(
    directory: &'a SubscriberDirectory,
    id: &SubscriberId,
) -> ServiceResult<&'a Subscriber> {
    directory
        .subscriber(id)
        .ok_or_else(|| ServiceError::NotFound(format!("subscriber {id}")))
}

fn overview<'a>(
    directory: &SubscriberDirectory,
    subscriber: &Subscriber,
    periods: impl IntoIterator<Item = &'a BillingPeriod>,
    today: NaiveDate,
) -> SubscriberOverview {
    let branch = directory.branch_of(subscriber);
    SubscriberOverview {
        subscriber: subscriber.clone(),
        branch_name: branch.map(|b| b.name().to_string()),
        monthly_price: branch.map(|b| b.monthly_price()),
        payment: classify(subscriber, periods, today),
    }
}

fn log_warnings(warnings: &[IntegrityWarning]) {
    for warning in warnings {
        match warning {
            IntegrityWarning::MissingBranch {
                subscriber_id,
                branch_id,
            } => tracing::warn!(
                subscriber_id = %subscriber_id,
                branch_id = %branch_id,
                "subscriber references a missing branch; pricing at 0"
            ),
            IntegrityWarning::DuplicatePeriod {
                subscriber_id,
                month,
                ignored,
            } => tracing::warn!(
                subscriber_id = %subscriber_id,
                month = %month,
                ignored = %ignored,
                "duplicate billing period for month; ignoring"
            ),
        }
    }
}
