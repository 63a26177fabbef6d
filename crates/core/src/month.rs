//! Calendar month used as the billing key of a period.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Day of the month on which every period falls due.
pub const DUE_DAY: u32 = 15;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

const SHORT_NAMES: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// A (year, month) pair, ordered chronologically.
///
/// Internally anchored on the first day of the month so that month arithmetic
/// never produces month `0` or `13`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "MonthParts", into = "MonthParts")]
pub struct BillingMonth(NaiveDate);

#[derive(Serialize, Deserialize)]
struct MonthParts {
    year: i32,
    month: u32,
}

impl ValueObject for BillingMonth {}

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> DomainResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation(format!(
                "month must be between 1 and 12 (got {month})"
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DomainError::validation(format!(
                "year must be between {MIN_YEAR} and {MAX_YEAR} (got {year})"
            )));
        }
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("invalid month {year}-{month}")))
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month number, 1-12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Periods fall due on the 15th of their month.
    pub fn due_date(&self) -> NaiveDate {
        self.0 + Days::new(u64::from(DUE_DAY - 1))
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn previous(self) -> Self {
        self.offset(-1)
    }

    /// Shift by `months` calendar months (negative goes back in time).
    pub fn offset(self, months: i32) -> Self {
        let step = Months::new(months.unsigned_abs());
        if months >= 0 {
            Self(self.0 + step)
        } else {
            Self(self.0 - step)
        }
    }

    /// Operator-facing label, e.g. `Mai/2024`.
    pub fn label(&self) -> String {
        format!("{}/{}", SHORT_NAMES[self.0.month0() as usize], self.year())
    }
}

impl core::fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

impl TryFrom<MonthParts> for BillingMonth {
    type Error = DomainError;

    fn try_from(value: MonthParts) -> Result<Self, Self::Error> {
        Self::new(value.year, value.month)
    }
}

impl From<BillingMonth> for MonthParts {
    fn from(value: BillingMonth) -> Self {
        Self {
            year: value.year(),
            month: value.month(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ym(year: i32, month: u32) -> BillingMonth {
        BillingMonth::new(year, month).unwrap()
    }

    #[test]
    fn rejects_out_of_range_months() {
        assert!(BillingMonth::new(2024, 0).is_err());
        assert!(BillingMonth::new(2024, 13).is_err());
        assert!(BillingMonth::new(0, 5).is_err());
    }

    #[test]
    fn rolls_over_year_boundaries() {
        assert_eq!(ym(2024, 12).next(), ym(2025, 1));
        assert_eq!(ym(2025, 1).previous(), ym(2024, 12));
        assert_eq!(ym(2024, 11).offset(6), ym(2025, 5));
        assert_eq!(ym(2024, 2).offset(-3), ym(2023, 11));
    }

    #[test]
    fn due_date_is_the_fifteenth() {
        assert_eq!(
            ym(2024, 2).due_date(),
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
        );
    }

    #[test]
    fn containing_truncates_to_first_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(BillingMonth::containing(date), ym(2024, 6));
    }

    #[test]
    fn labels_use_short_month_names() {
        assert_eq!(ym(2024, 5).label(), "Mai/2024");
        assert_eq!(ym(2023, 12).label(), "Dez/2023");
    }

    #[test]
    fn serializes_as_year_and_month() {
        let json = serde_json::to_value(ym(2024, 9)).unwrap();
        assert_eq!(json, serde_json::json!({ "year": 2024, "month": 9 }));

        let bad: Result<BillingMonth, _> =
            serde_json::from_value(serde_json::json!({ "year": 2024, "month": 13 }));
        assert!(bad.is_err());
    }

    proptest! {
        /// Stepping forward then back is the identity, and stays in range.
        #[test]
        fn offset_round_trips(year in 1900i32..2100, month in 1u32..=12, n in -48i32..48) {
            let start = ym(year, month);
            let moved = start.offset(n);
            prop_assert!((1..=12).contains(&moved.month()));
            prop_assert_eq!(moved.offset(-n), start);
        }
    }
}
