use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
pub type DbPool = Pool<SqliteConnectionManager>;

use identity::IdentityProvider;
use models::db_operations::documents_db_operations::DocumentStore;
use session_store::SessionStore;

/// Shared by every worker. The session store is the single process-wide
/// instance; `main` calls `init` before serving and `teardown` after.
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub session: Arc<SessionStore>,
}

impl AppState {
    pub fn new(documents: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let session = Arc::new(SessionStore::new(identity.clone(), documents.clone()));
        AppState { documents, identity, session }
    }
}

pub mod config;
pub mod helper;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session_store;
pub mod setup;
pub mod views;
