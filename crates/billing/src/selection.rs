//! Selection policy: one-click shortcuts and the smart default.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use paytv_core::BillingMonth;

use crate::period::{DisplayPeriod, PeriodRef, PeriodStatus};

/// A set of selected period references.
pub type Selection = BTreeSet<PeriodRef>;

/// How many future months the "advance" shortcut covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvanceHorizon {
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "6")]
    Six,
}

impl AdvanceHorizon {
    pub fn months(self) -> usize {
        match self {
            AdvanceHorizon::Three => 3,
            AdvanceHorizon::Six => 6,
        }
    }
}

/// Named bulk-selection shortcuts offered by the payment dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shortcut {
    #[serde(rename = "overdue")]
    PayOverdue,
    #[serde(rename = "current")]
    PayCurrent,
    Advance3,
    Advance6,
    Smart,
}

/// Unpaid window periods split by the caller-facing buckets.
///
/// Each bucket keeps window order. A period can sit in more than one bucket
/// (an overdue current month is both `overdue` and `current`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionBuckets {
    pub overdue: Vec<PeriodRef>,
    pub current: Vec<PeriodRef>,
    pub future: Vec<PeriodRef>,
}

impl SelectionBuckets {
    /// Partition display periods; paid periods never land in a bucket.
    pub fn partition(periods: &[DisplayPeriod], current_month: BillingMonth) -> Self {
        let mut buckets = Self::default();
        for period in periods.iter().filter(|p| !p.is_paid()) {
            if period.status == PeriodStatus::Overdue {
                buckets.overdue.push(period.reference.clone());
            }
            if period.month == current_month {
                buckets.current.push(period.reference.clone());
            }
            if period.is_future {
                buckets.future.push(period.reference.clone());
            }
        }
        buckets
    }

    /// "Pay overdue": every overdue period.
    pub fn pay_overdue(&self) -> Selection {
        self.overdue.iter().cloned().collect()
    }

    /// "Pay current month": the current month if unpaid.
    pub fn pay_current(&self) -> Selection {
        self.current.iter().cloned().collect()
    }

    /// "Advance N months": overdue, current, and the first N future periods.
    pub fn advance(&self, horizon: AdvanceHorizon) -> Selection {
        let mut selection = self.smart_default();
        selection.extend(self.future.iter().take(horizon.months()).cloned());
        selection
    }

    /// Default selection when the window is first shown: overdue and current.
    pub fn smart_default(&self) -> Selection {
        self.overdue
            .iter()
            .chain(self.current.iter())
            .cloned()
            .collect()
    }

    pub fn apply(&self, shortcut: Shortcut) -> Selection {
        match shortcut {
            Shortcut::PayOverdue => self.pay_overdue(),
            Shortcut::PayCurrent => self.pay_current(),
            Shortcut::Advance3 => self.advance(AdvanceHorizon::Three),
            Shortcut::Advance6 => self.advance(AdvanceHorizon::Six),
            Shortcut::Smart => self.smart_default(),
        }
    }
}

/// Operator selection while a payment window is open.
///
/// The smart default is seeded at most once, and only before the operator
/// has touched the selection; clearing the selection counts as touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Selection,
    touched: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &Selection {
        &self.selected
    }

    /// Apply the smart default if nothing has been chosen yet. Returns whether
    /// the selection changed.
    pub fn seed(&mut self, buckets: &SelectionBuckets) -> bool {
        if self.touched || !self.selected.is_empty() {
            return false;
        }
        self.selected = buckets.smart_default();
        self.touched = true;
        !self.selected.is_empty()
    }

    /// Replace the selection with a shortcut's result.
    pub fn apply_shortcut(&mut self, buckets: &SelectionBuckets, shortcut: Shortcut) {
        self.selected = buckets.apply(shortcut);
        self.touched = true;
    }

    /// Add or remove one reference.
    pub fn toggle(&mut self, reference: PeriodRef) {
        if !self.selected.remove(&reference) {
            self.selected.insert(reference);
        }
        self.touched = true;
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.touched = true;
    }

    pub fn into_selection(self) -> Selection {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::BillingPeriod;
    use crate::window::build_window;
    use chrono::{NaiveDate, Utc};
    use paytv_core::{BranchId, PeriodId, SubscriberId};
    use paytv_subscribers::{Branch, ContactInfo, Subscriber};
    use proptest::prelude::*;

    fn ym(y: i32, m: u32) -> BillingMonth {
        BillingMonth::new(y, m).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    struct Fixture {
        subscriber: Subscriber,
        buckets: SelectionBuckets,
        overdue_id: PeriodId,
        paid_id: PeriodId,
    }

    /// April overdue (stored), May paid (stored), rest synthesized.
    fn fixture() -> Fixture {
        let branch = Branch::open(BranchId::new(), "Tete", 2000, Utc::now()).unwrap();
        let subscriber = Subscriber::register(
            SubscriberId::new(),
            "Marta",
            branch.id_typed().clone(),
            ContactInfo::default(),
            Utc::now(),
        )
        .unwrap();

        let mut april = BillingPeriod::issue(
            PeriodId::new(),
            subscriber.id_typed().clone(),
            ym(2024, 4),
            2000,
            Utc::now(),
        );
        april.mark_overdue();
        let mut may = BillingPeriod::issue(
            PeriodId::new(),
            subscriber.id_typed().clone(),
            ym(2024, 5),
            2000,
            Utc::now(),
        );
        may.mark_paid(Utc::now());

        let window = build_window(&subscriber, Some(&branch), [&april, &may], today());
        Fixture {
            buckets: window.buckets(),
            overdue_id: april.id_typed().clone(),
            paid_id: may.id_typed().clone(),
            subscriber,
        }
    }

    fn synth(f: &Fixture, y: i32, m: u32) -> PeriodRef {
        PeriodRef::synthesized(f.subscriber.id_typed().clone(), ym(y, m))
    }

    #[test]
    fn buckets_partition_the_unpaid_window() {
        let f = fixture();
        assert_eq!(f.buckets.overdue, vec![PeriodRef::Real(f.overdue_id.clone())]);
        assert_eq!(f.buckets.current, vec![synth(&f, 2024, 6)]);
        assert_eq!(f.buckets.future.len(), 6);
        assert_eq!(f.buckets.future[0], synth(&f, 2024, 7));

        let paid = PeriodRef::Real(f.paid_id.clone());
        assert!(!f.buckets.advance(AdvanceHorizon::Six).contains(&paid));
    }

    #[test]
    fn smart_default_is_overdue_plus_current() {
        let f = fixture();
        let expected: Selection = [PeriodRef::Real(f.overdue_id.clone()), synth(&f, 2024, 6)]
            .into_iter()
            .collect();
        assert_eq!(f.buckets.smart_default(), expected);
    }

    #[test]
    fn advance_takes_first_n_future_months() {
        let f = fixture();
        let three = f.buckets.advance(AdvanceHorizon::Three);
        assert_eq!(three.len(), 5);
        assert!(three.contains(&synth(&f, 2024, 9)));
        assert!(!three.contains(&synth(&f, 2024, 10)));

        let six = f.buckets.apply(Shortcut::Advance6);
        assert_eq!(six.len(), 8);
        assert!(six.contains(&synth(&f, 2024, 12)));
    }

    #[test]
    fn smart_default_seeds_only_once() {
        let f = fixture();
        let mut state = SelectionState::new();
        assert!(state.seed(&f.buckets));
        assert_eq!(state.selected().len(), 2);

        state.clear();
        assert!(!state.seed(&f.buckets));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn manual_toggle_prevents_seeding() {
        let f = fixture();
        let mut state = SelectionState::new();
        state.toggle(synth(&f, 2024, 8));
        state.toggle(synth(&f, 2024, 8));
        assert!(state.selected().is_empty());
        assert!(!state.seed(&f.buckets));
    }

    #[test]
    fn pay_current_is_empty_for_an_empty_window() {
        let f = fixture();
        let periods: Vec<DisplayPeriod> = Vec::new();
        let empty = SelectionBuckets::partition(&periods, ym(2024, 6));
        assert!(empty.pay_current().is_empty());
        assert_eq!(f.buckets.pay_current().len(), 1);
    }

    fn status_strategy() -> impl Strategy<Value = PeriodStatus> {
        prop_oneof![
            Just(PeriodStatus::Paid),
            Just(PeriodStatus::Pending),
            Just(PeriodStatus::Overdue),
        ]
    }

    fn shortcut_strategy() -> impl Strategy<Value = Shortcut> {
        prop_oneof![
            Just(Shortcut::PayOverdue),
            Just(Shortcut::PayCurrent),
            Just(Shortcut::Advance3),
            Just(Shortcut::Advance6),
            Just(Shortcut::Smart),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: re-applying a shortcut never changes the selection, and
        /// it never picks a paid period or one outside the window.
        #[test]
        fn shortcuts_are_idempotent(
            stored in prop::collection::btree_map(-8i32..10, status_strategy(), 0..12),
            shortcuts in prop::collection::vec(shortcut_strategy(), 1..6),
        ) {
            let branch = Branch::open(BranchId::new(), "Xai-Xai", 1500, Utc::now()).unwrap();
            let subscriber = Subscriber::register(
                SubscriberId::new(),
                "Helena",
                branch.id_typed().clone(),
                ContactInfo::default(),
                Utc::now(),
            )
            .unwrap();
            let periods: Vec<BillingPeriod> = stored
                .iter()
                .map(|(offset, status)| {
                    let mut p = BillingPeriod::issue(
                        PeriodId::new(),
                        subscriber.id_typed().clone(),
                        ym(2024, 6).offset(*offset),
                        1500,
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
                })
                .collect();

            let window = build_window(&subscriber, Some(&branch), &periods, today());
            let buckets = window.buckets();
            let unpaid: Selection = window
                .periods
                .iter()
                .filter(|p| !p.is_paid())
                .map(|p| p.reference.clone())
                .collect();

            let mut state = SelectionState::new();
            for shortcut in shortcuts {
                state.apply_shortcut(&buckets, shortcut);
                let once = state.selected().clone();
                state.apply_shortcut(&buckets, shortcut);
                prop_assert_eq!(state.selected(), &once);
                prop_assert_eq!(&once, &buckets.apply(shortcut));
                prop_assert!(once.iter().all(|r| unpaid.contains(r)));
            }
        }
    }
}
