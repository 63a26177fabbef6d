//! Infrastructure layer: stores, config and the billing application service.

pub mod billing_service;
pub mod config;
pub mod store;
