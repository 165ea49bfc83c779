//! Persistence adapter over the key-value collaborator.
//!
//! # Responsibility
//! - Serialize the full dataset and the current-user identity to fixed keys.
//! - Seed a demo dataset on first load.
//!
//! # Invariants
//! - Every save fully overwrites the stored record; there are no partial
//!   writes.
//! - serialize -> deserialize -> serialize is byte-identical.

pub mod dataset_repo;
pub mod seed;
