//! Aging sweep: persist the overdue status of pending periods past due.
//!
//! Classification already treats a pending period past its due date as debt,
//! so the sweep only makes the stored status agree with what every view
//! derives anyway.

use chrono::NaiveDate;

use paytv_core::PeriodId;

use crate::period::BillingPeriod;

/// Result of an aging sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgingSweep {
    pub periods: Vec<BillingPeriod>,
    pub flipped: Vec<PeriodId>,
}

impl AgingSweep {
    pub fn is_noop(&self) -> bool {
        self.flipped.is_empty()
    }
}

/// Flip every pending period whose due date is strictly before `today` to
/// overdue. Paid and already overdue periods pass through untouched.
pub fn mark_overdue(periods: &[BillingPeriod], today: NaiveDate) -> AgingSweep {
    let mut flipped = Vec::new();
    let periods = periods
        .iter()
        .cloned()
        .map(|mut p| {
            if p.due_date() < today && p.mark_overdue() {
                flipped.push(p.id_typed().clone());
            }
            p
        })
        .collect();
    AgingSweep { periods, flipped }
}
