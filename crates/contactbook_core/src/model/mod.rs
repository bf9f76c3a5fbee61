//! Domain model for the contact directory.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation so every layer applies the same rules.
//!
//! # Invariants
//! - Every persisted contact is identified by a store-assigned `ContactId`.
//! - Deletion is permanent; there are no tombstones.

pub mod contact;
