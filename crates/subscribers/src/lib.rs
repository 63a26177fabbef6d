//! Subscribers domain module (branches and the subscribers attached to them).
//!
//! Plain records with validating constructors; billing rules live in
//! `paytv-billing`. No IO, no HTTP, no storage.

pub mod branch;
pub mod directory;
pub mod subscriber;

pub use branch::{Branch, BranchStatus};
pub use directory::SubscriberDirectory;
pub use subscriber::{ContactInfo, LifecycleStatus, Subscriber};
