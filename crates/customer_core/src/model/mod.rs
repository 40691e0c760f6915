//! Customer domain model.
//!
//! # Invariants
//! - `Customer` is the only persisted entity.
//! - Deletion is a hard delete; there are no tombstones.

pub mod customer;
