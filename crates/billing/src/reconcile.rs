//! Reconciliation: commit a batch of selected periods as paid.
//!
//! The engine is a pure transform over a snapshot. The whole batch is
//! validated before anything is produced, so a bad reference leaves the
//! caller with nothing to persist.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};

use paytv_core::{BillingMonth, PeriodId, SubscriberId};
use paytv_subscribers::SubscriberDirectory;

use crate::error::{BillingError, BillingResult};
use crate::period::{BillingPeriod, PeriodRef};
use crate::window::IntegrityWarning;

/// Outcome of a reconciliation: the next ledger state plus what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Full replacement period list (existing periods first, in input order,
    /// then materialized ones).
    pub periods: Vec<BillingPeriod>,
    /// Stored periods flipped (or re-stamped) to paid.
    pub paid: Vec<PeriodId>,
    /// Newly created paid periods.
    pub materialized: Vec<PeriodId>,
    pub warnings: Vec<IntegrityWarning>,
}

/// Mark every selected period paid at `now`.
///
/// - Real references flip the stored period to paid (re-paying a paid period
///   only re-stamps `paid_at`).
/// - Synthesized references materialize a new paid period priced at the
///   subscriber's branch price as of now (0, with a warning, when the branch
///   is missing). If the month already has a stored period, that one is
///   marked paid instead, so a month never ends up with two periods.
///
/// Fails the whole batch on an unknown real period or an unknown subscriber.
pub fn reconcile<'a, I>(
    selected: I,
    directory: &SubscriberDirectory,
    periods: &[BillingPeriod],
    now: DateTime<Utc>,
) -> BillingResult<Reconciliation>
where
    I: IntoIterator<Item = &'a PeriodRef>,
{
    let known: HashSet<&PeriodId> = periods.iter().map(|p| p.id_typed()).collect();
    let mut by_month: HashMap<(&SubscriberId, BillingMonth), &PeriodId> = HashMap::new();
    for p in periods {
        by_month
            .entry((p.subscriber_id(), p.billing_month()))
            .or_insert(p.id_typed());
    }

    let mut to_pay: BTreeSet<PeriodId> = BTreeSet::new();
    let mut to_create: BTreeSet<(SubscriberId, BillingMonth)> = BTreeSet::new();

    for reference in selected {
        match reference {
            PeriodRef::Real(id) => {
                if !known.contains(id) {
                    return Err(BillingError::UnknownPeriod(id.clone()));
                }
                to_pay.insert(id.clone());
            }
            PeriodRef::Synthesized {
                subscriber_id,
                month,
            } => {
                if directory.subscriber(subscriber_id).is_none() {
                    return Err(BillingError::UnknownSubscriber(subscriber_id.clone()));
                }
                match by_month.get(&(subscriber_id, *month)) {
                    Some(existing) => {
                        to_pay.insert((*existing).clone());
                    }
                    None => {
                        to_create.insert((subscriber_id.clone(), *month));
                    }
                }
            }
        }
    }

    let mut paid = Vec::with_capacity(to_pay.len());
    let mut next: Vec<BillingPeriod> = periods
        .iter()
        .map(|p| {
            let mut p = p.clone();
            if to_pay.contains(p.id_typed()) && !paid.contains(p.id_typed()) {
                p.mark_paid(now);
                paid.push(p.id_typed().clone());
            }
            p
        })
        .collect();

    let mut warnings = Vec::new();
    let mut prices: BTreeMap<&SubscriberId, u64> = BTreeMap::new();
    let mut materialized = Vec::with_capacity(to_create.len());
    for (subscriber_id, month) in &to_create {
        let amount = match prices.get(subscriber_id) {
            Some(amount) => *amount,
            None => {
                let amount = price_for(directory, subscriber_id, &mut warnings)?;
                prices.insert(subscriber_id, amount);
                amount
            }
        };
        let period = BillingPeriod::materialize_paid(
            PeriodId::new(),
            subscriber_id.clone(),
            *month,
            amount,
            now,
        );
        materialized.push(period.id_typed().clone());
        next.push(period);
    }

    Ok(Reconciliation {
        periods: next,
        paid,
        materialized,
        warnings,
    })
}

fn price_for(
    directory: &SubscriberDirectory,
    subscriber_id: &SubscriberId,
    warnings: &mut Vec<IntegrityWarning>,
) -> BillingResult<u64> {
    let subscriber = directory
        .subscriber(subscriber_id)
        .ok_or_else(|| BillingError::UnknownSubscriber(subscriber_id.clone()))?;
    match directory.branch_of(subscriber) {
        Some(branch) => Ok(branch.monthly_price()),
        None => {
            warnings.push(IntegrityWarning::MissingBranch {
                subscriber_id: subscriber_id.clone(),
                branch_id: subscriber.branch_id().clone(),
            });
            Ok(0)
        }
    }
}

/// Reject references that do not belong to `subscriber_id`.
///
/// Used when a payment is submitted on behalf of one subscriber, so a tampered
/// or stale selection cannot settle another subscriber's months.
pub fn ensure_selection_belongs_to<'a, I>(
    subscriber_id: &SubscriberId,
    selected: I,
    periods: &[BillingPeriod],
) -> BillingResult<()>
where
    I: IntoIterator<Item = &'a PeriodRef>,
{
    for reference in selected {
        let owner = match reference {
            PeriodRef::Real(id) => periods
                .iter()
                .find(|p| p.id_typed() == id)
                .map(|p| p.subscriber_id())
                .ok_or_else(|| BillingError::UnknownPeriod(id.clone()))?,
            PeriodRef::Synthesized {
                subscriber_id: owner,
                ..
            } => owner,
        };
        if owner != subscriber_id {
            return Err(BillingError::ForeignPeriod {
                reference: reference.to_string(),
                subscriber_id: subscriber_id.clone(),
            });
        }
    }
    Ok(())
}
