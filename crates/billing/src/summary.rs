//! Dashboard reporting over the whole ledger.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use paytv_core::{BillingMonth, BranchId, SubscriberId};
use paytv_subscribers::SubscriberDirectory;

use crate::classify::{PaymentStatus, classify};
use crate::period::BillingPeriod;

/// Subscriber counts per verdict status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub paid: usize,
    pub overdue: usize,
    pub delinquent: usize,
    pub suspended: usize,
    pub inactive: usize,
}

impl StatusCounts {
    fn record(&mut self, status: PaymentStatus) {
        match status {
            PaymentStatus::Paid => self.paid += 1,
            PaymentStatus::Overdue => self.overdue += 1,
            PaymentStatus::Delinquent => self.delinquent += 1,
            PaymentStatus::Suspended => self.suspended += 1,
            PaymentStatus::Inactive => self.inactive += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSummary {
    pub branch_id: BranchId,
    pub name: String,
    pub subscribers: usize,
    pub active_subscribers: usize,
    pub total_debt: u64,
    pub collected: u64,
}

/// Headline figures for one billing month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub month: BillingMonth,
    pub subscribers: usize,
    pub by_status: StatusCounts,
    /// Outstanding debt on `today`, across active subscribers.
    pub total_debt: u64,
    /// Sum of paid periods billed for `month`.
    pub collected: u64,
    pub paid_periods: usize,
    pub unpaid_periods: usize,
    /// One row per known branch, sorted by name.
    pub branches: Vec<BranchSummary>,
}

/// Summarize the ledger for `month`, classifying every subscriber on `today`.
///
/// Periods whose subscriber is not in the directory still count towards the
/// month's collected/paid/unpaid figures but not towards any branch.
pub fn summarize(
    directory: &SubscriberDirectory,
    periods: &[BillingPeriod],
    month: BillingMonth,
    today: NaiveDate,
) -> DashboardSummary {
    let mut by_subscriber: HashMap<&SubscriberId, Vec<&BillingPeriod>> = HashMap::new();
    for period in periods {
        by_subscriber
            .entry(period.subscriber_id())
            .or_default()
            .push(period);
    }

    let mut branches: Vec<BranchSummary> = directory
        .branches()
        .into_iter()
        .map(|b| BranchSummary {
            branch_id: b.id_typed().clone(),
            name: b.name().to_string(),
            subscribers: 0,
            active_subscribers: 0,
            total_debt: 0,
            collected: 0,
        })
        .collect();
    let slot: HashMap<BranchId, usize> = branches
        .iter()
        .enumerate()
        .map(|(i, b)| (b.branch_id.clone(), i))
        .collect();

    let mut by_status = StatusCounts::default();
    let mut total_debt: u64 = 0;
    let no_periods = Vec::new();

    for subscriber in directory.subscribers() {
        let own = by_subscriber
            .get(subscriber.id_typed())
            .unwrap_or(&no_periods);
        let verdict = classify(subscriber, own.iter().copied(), today);
        by_status.record(verdict.status);
        total_debt = total_debt.saturating_add(verdict.total_debt);

        if let Some(row) = slot
            .get(subscriber.branch_id())
            .and_then(|i| branches.get_mut(*i))
        {
            row.subscribers += 1;
            if subscriber.is_active() {
                row.active_subscribers += 1;
            }
            row.total_debt = row.total_debt.saturating_add(verdict.total_debt);
            row.collected = row.collected.saturating_add(
                own.iter()
                    .filter(|p| p.billing_month() == month && p.is_paid())
                    .map(|p| p.amount())
                    .sum(),
            );
        }
    }

    let mut collected: u64 = 0;
    let mut paid_periods = 0;
    let mut unpaid_periods = 0;
    for period in periods.iter().filter(|p| p.billing_month() == month) {
        if period.is_paid() {
            paid_periods += 1;
            collected = collected.saturating_add(period.amount());
        } else {
            unpaid_periods += 1;
        }
    }

    DashboardSummary {
        month,
        subscribers: directory.subscriber_count(),
        by_status,
        total_debt,
        collected,
        paid_periods,
        unpaid_periods,
        branches,
    }
}
