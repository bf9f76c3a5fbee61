//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record store contract consumed by the contact service.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Contact::validate()` before persistence,
//!   except address-only updates.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod cached_repo;
pub mod contact_repo;
