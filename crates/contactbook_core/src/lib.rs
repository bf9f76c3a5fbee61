//! Core domain logic for the contact book.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_logging, logging_status, sanitize_log_value, MAX_LOGGED_VALUE_CHARS,
};
pub use model::contact::{Address, Contact, ContactField, ContactId, ContactValidationError};
pub use repo::cached_repo::{CachedContactRepository, ContactCache};
pub use repo::contact_repo::{
    ContactListQuery, ContactRepository, RepoError, RepoResult, SqliteContactRepository,
};
pub use service::contact_service::{
    ContactService, ContactServiceError, PageRequest, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
