use thiserror::Error;

use paytv_core::{PeriodId, SubscriberId};

pub type BillingResult<T> = Result<T, BillingError>;

/// Failures of the reconciliation engine.
///
/// Any of these aborts the whole batch: callers never see a partially
/// applied selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// A period reference could not be decoded.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// A real period id is not present in the snapshot.
    #[error("unknown billing period: {0}")]
    UnknownPeriod(PeriodId),

    /// A synthesized reference names a subscriber that does not exist.
    #[error("unknown subscriber: {0}")]
    UnknownSubscriber(SubscriberId),

    /// A reference belongs to a different subscriber than the one being billed.
    #[error("period {reference} does not belong to subscriber {subscriber_id}")]
    ForeignPeriod {
        reference: String,
        subscriber_id: SubscriberId,
    },
}

impl BillingError {
    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }
}
