use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use paytv_core::{BillingMonth, Entity, PeriodId, SubscriberId};

use crate::error::BillingError;

/// Prefix that routes a textual reference to the synthesized variant.
pub const SYNTHESIZED_PREFIX: &str = "virtual-";

/// Status of a single billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Paid,
    Pending,
    Overdue,
}

/// A persisted billing period ("mensalidade"): one month of service for one
/// subscriber.
///
/// `amount` is copied from the branch price when the period is created and
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    id: PeriodId,
    subscriber_id: SubscriberId,
    billing_month: BillingMonth,
    /// Amount in smallest currency unit.
    amount: u64,
    status: PeriodStatus,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BillingPeriod {
    /// A pending period, as issued by seeding or imports.
    pub fn issue(
        id: PeriodId,
        subscriber_id: SubscriberId,
        billing_month: BillingMonth,
        amount: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subscriber_id,
            billing_month,
            amount,
            status: PeriodStatus::Pending,
            paid_at: None,
            created_at,
        }
    }

    /// A period created directly in the paid state (reconciliation of a
    /// synthesized period).
    pub fn materialize_paid(
        id: PeriodId,
        subscriber_id: SubscriberId,
        billing_month: BillingMonth,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subscriber_id,
            billing_month,
            amount,
            status: PeriodStatus::Paid,
            paid_at: Some(now),
            created_at: now,
        }
    }

    pub fn id_typed(&self) -> &PeriodId {
        &self.id
    }

    pub fn subscriber_id(&self) -> &SubscriberId {
        &self.subscriber_id
    }

    pub fn billing_month(&self) -> BillingMonth {
        self.billing_month
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn status(&self) -> PeriodStatus {
        self.status
    }

    pub fn due_date(&self) -> NaiveDate {
        self.billing_month.due_date()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_paid(&self) -> bool {
        self.status == PeriodStatus::Paid
    }

    /// Whether the period counts as debt on `today`: explicitly overdue, or
    /// pending with a due date strictly in the past.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.status {
            PeriodStatus::Overdue => true,
            PeriodStatus::Pending => self.due_date() < today,
            PeriodStatus::Paid => false,
        }
    }

    /// Mark paid. Re-marking an already paid period overwrites `paid_at`.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.status = PeriodStatus::Paid;
        self.paid_at = Some(now);
    }

    /// Flip a pending period to overdue; other statuses are left alone.
    pub fn mark_overdue(&mut self) -> bool {
        if self.status == PeriodStatus::Pending {
            self.status = PeriodStatus::Overdue;
            true
        } else {
            false
        }
    }
}

impl Entity for BillingPeriod {
    type Id = PeriodId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Reference to a period the operator can select.
///
/// Real periods are addressed by their stored id; synthesized ones by the
/// (subscriber, month) pair they would occupy once materialized. The textual
/// form (`Display`/`FromStr`, and serde) is `virtual-<subscriber>-<year>-<month>`
/// for synthesized references and the bare id for real ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PeriodRef {
    Real(PeriodId),
    Synthesized {
        subscriber_id: SubscriberId,
        month: BillingMonth,
    },
}

impl PeriodRef {
    pub fn synthesized(subscriber_id: SubscriberId, month: BillingMonth) -> Self {
        Self::Synthesized {
            subscriber_id,
            month,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::Synthesized { .. })
    }
}

impl core::fmt::Display for PeriodRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PeriodRef::Real(id) => f.write_str(id.as_str()),
            PeriodRef::Synthesized {
                subscriber_id,
                month,
            } => write!(
                f,
                "{SYNTHESIZED_PREFIX}{}-{}-{}",
                subscriber_id,
                month.year(),
                month.month()
            ),
        }
    }
}

impl FromStr for PeriodRef {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(rest) = s.strip_prefix(SYNTHESIZED_PREFIX) else {
            let id = PeriodId::parse(s)
                .map_err(|e| BillingError::invalid_selection(format!("{s:?}: {e}")))?;
            return Ok(PeriodRef::Real(id));
        };

        // The subscriber id may itself contain '-': year and month are the
        // last two segments, everything before them is the subscriber.
        let mut parts = rest.rsplitn(3, '-');
        let (Some(month), Some(year), Some(subscriber)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(BillingError::invalid_selection(format!(
                "{s:?}: expected virtual-<subscriber>-<year>-<month>"
            )));
        };

        let year = parse_digits(year)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| BillingError::invalid_selection(format!("{s:?}: bad year {year:?}")))?;
        let month = parse_digits(month)
            .filter(|_| !month.starts_with('0'))
            .and_then(|m| u32::try_from(m).ok())
            .ok_or_else(|| BillingError::invalid_selection(format!("{s:?}: bad month {month:?}")))?;
        let month = BillingMonth::new(year, month)
            .map_err(|e| BillingError::invalid_selection(format!("{s:?}: {e}")))?;
        let subscriber_id = SubscriberId::parse(subscriber)
            .map_err(|e| BillingError::invalid_selection(format!("{s:?}: {e}")))?;

        Ok(PeriodRef::Synthesized {
            subscriber_id,
            month,
        })
    }
}

/// Plain unsigned decimal, no sign, no whitespace.
fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || raw.len() > 9 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl TryFrom<String> for PeriodRef {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodRef> for String {
    fn from(value: PeriodRef) -> Self {
        value.to_string()
    }
}

/// A row of the payment window: a stored period or a synthesized placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPeriod {
    pub reference: PeriodRef,
    pub subscriber_id: SubscriberId,
    pub month: BillingMonth,
    pub amount: u64,
    pub status: PeriodStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
    /// Month strictly before the current one.
    pub is_past: bool,
    /// Month strictly after the current one.
    pub is_future: bool,
    /// Not in storage yet.
    pub is_virtual: bool,
}

impl DisplayPeriod {
    pub(crate) fn from_stored(period: &BillingPeriod, current: BillingMonth) -> Self {
        let month = period.billing_month();
        Self {
            reference: PeriodRef::Real(period.id_typed().clone()),
            subscriber_id: period.subscriber_id().clone(),
            month,
            amount: period.amount(),
            status: period.status(),
            due_date: period.due_date(),
            paid_at: period.paid_at(),
            is_past: month < current,
            is_future: month > current,
            is_virtual: false,
        }
    }

    pub(crate) fn placeholder(
        subscriber_id: &SubscriberId,
        month: BillingMonth,
        amount: u64,
        current: BillingMonth,
    ) -> Self {
        Self {
            reference: PeriodRef::synthesized(subscriber_id.clone(), month),
            subscriber_id: subscriber_id.clone(),
            month,
            amount,
            status: PeriodStatus::Pending,
            due_date: month.due_date(),
            paid_at: None,
            is_past: month < current,
            is_future: month > current,
            is_virtual: true,
        }
    }

    pub fn label(&self) -> String {
        self.month.label()
    }

    pub fn is_paid(&self) -> bool {
        self.status == PeriodStatus::Paid
    }
}
