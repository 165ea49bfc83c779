//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate dataset mutation, invitation reconciliation and persistence.
//! - Keep presentation collaborators decoupled from storage details.

pub mod detail;
pub mod entity_store;
pub mod invitation;
pub mod session;
