use crate::models::db_operations::documents_db_operations::{DbError, RedbDocumentStore};
use crate::models::document::Collection;
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Redb error: {0}")]
    Redb(#[from] DbError),
}

pub fn setup_identity_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    log::info!("Creating 'accounts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            uid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT
        )",
        [],
    )?;
    tx.commit()?;
    Ok(())
}

/// Creates the documents file with one table per collection.
pub fn setup_documents_db(path: &Path) -> Result<RedbDocumentStore, SetupError> {
    let store = RedbDocumentStore::open(path)?;
    let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
    log::info!("Documents database ready with collections: {}", names.join(", "));
    Ok(store)
}
