//! Payment window: the ten months an operator can settle at once.
//!
//! The window spans the four months ending at (and including) the current
//! month plus the six months after it. Months with a stored period show that
//! period; the rest are filled with synthesized placeholders priced at the
//! branch's current monthly price.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use paytv_core::{BillingMonth, BranchId, PeriodId, SubscriberId};
use paytv_subscribers::{Branch, Subscriber};

use crate::period::{BillingPeriod, DisplayPeriod};
use crate::selection::SelectionBuckets;

/// Months up to and including the current one.
pub const TRAILING_MONTHS: i32 = 4;
/// Months strictly after the current one.
pub const LEADING_MONTHS: i32 = 6;

/// Bad reference data noticed while building a window or reconciling.
///
/// These never fail the operation; they are handed back so the caller can
/// report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// The subscriber's branch does not exist; placeholders are priced at 0.
    MissingBranch {
        subscriber_id: SubscriberId,
        branch_id: BranchId,
    },
    /// More than one stored period exists for the same month; only the
    /// first one is shown.
    DuplicatePeriod {
        subscriber_id: SubscriberId,
        month: BillingMonth,
        ignored: PeriodId,
    },
}

/// Ordered window of display periods for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingWindow {
    pub current_month: BillingMonth,
    pub periods: Vec<DisplayPeriod>,
    pub warnings: Vec<IntegrityWarning>,
}

impl BillingWindow {
    /// Periods that can still be selected for payment, in window order.
    pub fn unpaid(&self) -> Vec<DisplayPeriod> {
        self.periods.iter().filter(|p| !p.is_paid()).cloned().collect()
    }

    /// Selection buckets over the unpaid part of the window.
    pub fn buckets(&self) -> SelectionBuckets {
        SelectionBuckets::partition(&self.periods, self.current_month)
    }
}

/// The ten calendar months of the window anchored on `today`, ascending.
pub fn window_months(today: NaiveDate) -> Vec<BillingMonth> {
    let current = BillingMonth::containing(today);
    (-(TRAILING_MONTHS - 1)..=LEADING_MONTHS)
        .map(|offset| current.offset(offset))
        .collect()
}

/// Lay out the payment window for `subscriber`.
///
/// `branch` is the subscriber's owning branch, `None` when the reference
/// dangles. Stored periods are shown unmodified and never duplicated by a
/// placeholder; periods of other subscribers are ignored.
pub fn build_window<'a, I>(
    subscriber: &Subscriber,
    branch: Option<&Branch>,
    periods: I,
    today: NaiveDate,
) -> BillingWindow
where
    I: IntoIterator<Item = &'a BillingPeriod>,
{
    let current = BillingMonth::containing(today);
    let months = window_months(today);
    let first = months[0];
    let last = months[months.len() - 1];

    let mut warnings = Vec::new();
    let price = match branch {
        Some(b) => b.monthly_price(),
        None => {
            warnings.push(IntegrityWarning::MissingBranch {
                subscriber_id: subscriber.id_typed().clone(),
                branch_id: subscriber.branch_id().clone(),
            });
            0
        }
    };

    let mut stored: HashMap<BillingMonth, &BillingPeriod> = HashMap::new();
    for period in periods
        .into_iter()
        .filter(|p| p.subscriber_id() == subscriber.id_typed())
    {
        let month = period.billing_month();
        if month < first || month > last {
            continue;
        }
        if stored.contains_key(&month) {
            warnings.push(IntegrityWarning::DuplicatePeriod {
                subscriber_id: subscriber.id_typed().clone(),
                month,
                ignored: period.id_typed().clone(),
            });
            continue;
        }
        stored.insert(month, period);
    }

    let periods = months
        .into_iter()
        .map(|month| match stored.get(&month) {
            Some(period) => DisplayPeriod::from_stored(period, current),
            None => DisplayPeriod::placeholder(subscriber.id_typed(), month, price, current),
        })
        .collect();

    BillingWindow {
        current_month: current,
        periods,
        warnings,
    }
}
