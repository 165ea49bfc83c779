//! Event list filtering.
//!
//! # Responsibility
//! - Evaluate conjunctive display predicates against the event collection.
//!
//! # Invariants
//! - Filtering is pure and order-preserving; callers may re-run it freely.

pub mod filter;
