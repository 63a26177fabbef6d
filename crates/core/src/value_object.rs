//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two
/// `BillingMonth { 2024, 6 }` are the same month wherever they come from,
/// while two subscribers with identical names are still different entities.
/// To "modify" a value object, create a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
