//! `paytv-core`: shared building blocks for the subscriber billing back office.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the calendar month used as billing key, the clock seam and the
//! domain error model.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod month;
pub mod value_object;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BranchId, PeriodId, SubscriberId};
pub use month::BillingMonth;
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
