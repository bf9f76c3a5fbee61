//! HTTP transport adapter for the contact directory.
//!
//! # Responsibility
//! - Route `/api/contacts` requests onto `ContactService` calls.
//! - Own the shared connection and cache handed to every request.
//!
//! # Invariants
//! - One SQLite connection is shared; each request holds its lock for the
//!   whole service call and never across an `.await`.
//! - The contact cache outlives individual requests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod negotiate;

use axum::routing::get;
use axum::Router;
use contactbook_core::{
    CachedContactRepository, ContactCache, ContactService, ServiceResult,
    SqliteContactRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;

/// Route prefix of the contact resource.
pub const CONTACTS_PATH: &str = "/api/contacts";

/// Route serving the OpenAPI document.
pub const OPENAPI_PATH: &str = "/api/openapi";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    cache: Arc<ContactCache>,
    page_size: u32,
}

impl AppState {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection, cache: ContactCache, page_size: u32) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            cache: Arc::new(cache),
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cache(&self) -> &ContactCache {
        &self.cache
    }
}

type RequestService<'a> =
    ContactService<CachedContactRepository<'a, SqliteContactRepository<'a>>>;

/// Runs `f` against a service bound to the shared connection and cache.
///
/// # Errors
/// - `ApiError::Internal` when the connection lock is poisoned.
/// - `ApiError::Service` for repository setup failures and service errors.
pub(crate) fn with_contact_service<T>(
    state: &AppState,
    f: impl FnOnce(&RequestService<'_>) -> ServiceResult<T>,
) -> Result<T, ApiError> {
    let conn = state
        .conn
        .lock()
        .map_err(|_| ApiError::Internal("database connection lock poisoned".to_string()))?;
    let repo = SqliteContactRepository::try_new(&conn).map_err(ApiError::from)?;
    let service = ContactService::new(CachedContactRepository::new(repo, &state.cache));
    f(&service).map_err(ApiError::Service)
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(OPENAPI_PATH, get(handlers::openapi))
        .route(
            CONTACTS_PATH,
            get(handlers::list_contacts).post(handlers::create_contact),
        )
        .route(
            "/api/contacts/:id",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .patch(handlers::update_address)
                .delete(handlers::delete_contact),
        )
        .with_state(state)
}
