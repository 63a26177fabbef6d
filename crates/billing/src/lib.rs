//! Billing domain module: the status & reconciliation engine.
//!
//! Every operation here is a pure function over a snapshot of billing periods,
//! with `today`/`now` passed in explicitly:
//!
//! - [`classify`] derives a subscriber's payment verdict.
//! - [`build_window`] lays out the ten-month payment window, synthesizing the
//!   periods that do not exist in storage yet.
//! - [`selection`] holds the one-click shortcuts and the smart default.
//! - [`reconcile`] commits a batch of selected periods as paid.
//! - [`mark_overdue`] ages pending periods past their due date.
//! - [`summarize`] builds the dashboard figures.

pub mod aging;
pub mod classify;
pub mod error;
pub mod period;
pub mod reconcile;
pub mod selection;
pub mod summary;
pub mod window;

pub use aging::{AgingSweep, mark_overdue};
pub use classify::{PaymentStatus, Verdict, classify};
pub use error::{BillingError, BillingResult};
pub use period::{BillingPeriod, DisplayPeriod, PeriodRef, PeriodStatus};
pub use reconcile::{Reconciliation, ensure_selection_belongs_to, reconcile};
pub use selection::{AdvanceHorizon, Selection, SelectionBuckets, SelectionState, Shortcut};
pub use summary::{BranchSummary, DashboardSummary, StatusCounts, summarize};
pub use window::{BillingWindow, IntegrityWarning, build_window, window_months};
