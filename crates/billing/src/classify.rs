//! Payment-status classification of a subscriber.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use paytv_core::BillingMonth;
use paytv_subscribers::{LifecycleStatus, Subscriber};

use crate::period::{BillingPeriod, PeriodStatus};

/// View-level payment status, distinct from a period's own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Current month paid, no arrears.
    Paid,
    /// Current month paid, but earlier months are owed.
    Overdue,
    /// Current month not paid, whatever the arrears.
    Delinquent,
    /// Kept for interface stability; nothing produces it yet.
    Suspended,
    /// Service not provisioned; financial detail is masked.
    Inactive,
}

/// Derived payment health of one subscriber. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub status: PaymentStatus,
    /// Labels (`Mai/2024`) of the periods counted as debt, in input order.
    pub overdue_months: Vec<String>,
    pub total_debt: u64,
    pub current_month_paid: bool,
    pub overdue_count: usize,
}

impl Verdict {
    fn inactive() -> Self {
        Self {
            status: PaymentStatus::Inactive,
            overdue_months: Vec::new(),
            total_debt: 0,
            current_month_paid: false,
            overdue_count: 0,
        }
    }
}

/// Classify a subscriber's payment health on `today`.
///
/// Periods belonging to other subscribers are ignored, so callers may pass the
/// whole ledger.
pub fn classify<'a, I>(subscriber: &Subscriber, periods: I, today: NaiveDate) -> Verdict
where
    I: IntoIterator<Item = &'a BillingPeriod>,
{
    if subscriber.lifecycle() == LifecycleStatus::Inactive {
        return Verdict::inactive();
    }

    let current = BillingMonth::containing(today);
    let mut current_month_paid = false;
    let mut overdue_months = Vec::new();
    let mut total_debt: u64 = 0;

    for period in periods
        .into_iter()
        .filter(|p| p.subscriber_id() == subscriber.id_typed())
    {
        if period.billing_month() == current && period.status() == PeriodStatus::Paid {
            current_month_paid = true;
        }
        if period.is_overdue_on(today) {
            overdue_months.push(period.billing_month().label());
            total_debt = total_debt.saturating_add(period.amount());
        }
    }

    let overdue_count = overdue_months.len();
    let status = if !current_month_paid {
        PaymentStatus::Delinquent
    } else if overdue_count > 0 {
        PaymentStatus::Overdue
    } else {
        PaymentStatus::Paid
    };

    Verdict {
        status,
        overdue_months,
        total_debt,
        current_month_paid,
        overdue_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paytv_core::{BranchId, PeriodId, SubscriberId};
    use paytv_subscribers::ContactInfo;
    use proptest::prelude::*;

    fn subscriber() -> Subscriber {
        Subscriber::register(
            SubscriberId::new(),
            "Joana",
            BranchId::new(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(s: &Subscriber, y: i32, m: u32, amount: u64, status: PeriodStatus) -> BillingPeriod {
        let mut p = BillingPeriod::issue(
            PeriodId::new(),
            s.id_typed().clone(),
            BillingMonth::new(y, m).unwrap(),
            amount,
            Utc::now(),
        );
        match status {
            PeriodStatus::Paid => p.mark_paid(Utc::now()),
            PeriodStatus::Overdue => {
                p.mark_overdue();
            }
            PeriodStatus::Pending => {}
        }
        p
    }

    #[test]
    fn no_periods_means_delinquent_without_debt() {
        let s = subscriber();
        let v = classify(&s, std::iter::empty::<&BillingPeriod>(), date(2024, 6, 15));
        assert_eq!(v.status, PaymentStatus::Delinquent);
        assert_eq!(v.total_debt, 0);
        assert_eq!(v.overdue_count, 0);
        assert!(!v.current_month_paid);
    }

    #[test]
    fn paid_current_month_with_arrears_is_overdue() {
        let s = subscriber();
        let periods = vec![
            period(&s, 2024, 5, 2500, PeriodStatus::Overdue),
            period(&s, 2024, 6, 2500, PeriodStatus::Paid),
        ];
        let v = classify(&s, &periods, date(2024, 6, 15));
        assert_eq!(v.status, PaymentStatus::Overdue);
        assert_eq!(v.total_debt, 2500);
        assert_eq!(v.overdue_count, 1);
        assert_eq!(v.overdue_months, vec!["Mai/2024".to_string()]);
        assert!(v.current_month_paid);
    }

    #[test]
    fn inactive_subscriber_masks_debt() {
        let mut s = subscriber();
        let periods = vec![
            period(&s, 2024, 3, 2500, PeriodStatus::Overdue),
            period(&s, 2024, 4, 2500, PeriodStatus::Overdue),
        ];
        s.deactivate();
        let v = classify(&s, &periods, date(2024, 6, 15));
        assert_eq!(v.status, PaymentStatus::Inactive);
        assert_eq!(v.total_debt, 0);
        assert!(v.overdue_months.is_empty());
        assert!(!v.current_month_paid);
    }

    #[test]
    fn pending_counts_as_debt_only_once_past_due() {
        let s = subscriber();
        let periods = vec![
            period(&s, 2024, 6, 2500, PeriodStatus::Paid),
            period(&s, 2024, 7, 2500, PeriodStatus::Pending),
        ];
        // July period is due on the 15th of July.
        assert_eq!(classify(&s, &periods, date(2024, 6, 20)).overdue_count, 0);

        let periods = vec![
            period(&s, 2024, 5, 2500, PeriodStatus::Pending),
            period(&s, 2024, 6, 2500, PeriodStatus::Paid),
        ];
        let v = classify(&s, &periods, date(2024, 6, 1));
        assert_eq!(v.status, PaymentStatus::Overdue);
        assert_eq!(v.total_debt, 2500);
    }

    #[test]
    fn current_month_due_today_is_not_yet_debt() {
        let s = subscriber();
        let periods = vec![period(&s, 2024, 6, 2500, PeriodStatus::Pending)];
        let v = classify(&s, &periods, date(2024, 6, 15));
        assert_eq!(v.status, PaymentStatus::Delinquent);
        assert_eq!(v.total_debt, 0);
    }

    #[test]
    fn overdue_labels_keep_input_order() {
        let s = subscriber();
        let periods = vec![
            period(&s, 2024, 4, 100, PeriodStatus::Overdue),
            period(&s, 2024, 2, 200, PeriodStatus::Overdue),
            period(&s, 2024, 3, 300, PeriodStatus::Overdue),
        ];
        let v = classify(&s, &periods, date(2024, 6, 15));
        assert_eq!(v.overdue_months, vec!["Abr/2024", "Fev/2024", "Mar/2024"]);
        assert_eq!(v.total_debt, 600);
    }

    #[test]
    fn other_subscribers_periods_are_ignored() {
        let s = subscriber();
        let other = subscriber();
        let periods = vec![
            period(&other, 2024, 5, 9999, PeriodStatus::Overdue),
            period(&other, 2024, 6, 9999, PeriodStatus::Paid),
        ];
        let v = classify(&s, &periods, date(2024, 6, 15));
        assert_eq!(v.status, PaymentStatus::Delinquent);
        assert_eq!(v.total_debt, 0);
    }

    fn status_strategy() -> impl Strategy<Value = PeriodStatus> {
        prop_oneof![
            Just(PeriodStatus::Paid),
            Just(PeriodStatus::Pending),
            Just(PeriodStatus::Overdue),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total debt and overdue count always equal the independently
        /// recomputed overdue set.
        #[test]
        fn debt_matches_overdue_set(
            rows in prop::collection::vec((0i32..24, 1u64..10_000, status_strategy()), 0..20),
            today_offset in 0i64..730,
        ) {
            let s = subscriber();
            let base = BillingMonth::new(2023, 1).unwrap();
            let periods: Vec<BillingPeriod> = rows
                .iter()
                .map(|(offset, amount, status)| {
                    let m = base.offset(*offset);
                    period(&s, m.year(), m.month(), *amount, *status)
                })
                .collect();
            let today = date(2023, 1, 1) + chrono::Duration::days(today_offset);

            let expected: Vec<&BillingPeriod> = periods
                .iter()
                .filter(|p| p.status() == PeriodStatus::Overdue
                    || (p.status() == PeriodStatus::Pending && p.due_date() < today))
                .collect();

            let v = classify(&s, &periods, today);
            prop_assert_eq!(v.total_debt, expected.iter().map(|p| p.amount()).sum::<u64>());
            prop_assert_eq!(v.overdue_count, expected.len());
            prop_assert_eq!(v.overdue_months.len(), expected.len());
        }
    }
}
