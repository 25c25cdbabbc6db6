use crate::models::document::{Collection, Document, DocumentWrite};
use chrono::{SecondsFormat, Utc};
use redb::{CommitError, Database, ReadableTable, StorageError, TableDefinition, TableError, TransactionError};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),
    #[error("Redb storage error: {0}")]
    RedbStorage(#[from] StorageError),
    #[error("Redb transaction error: {0}")]
    RedbTransaction(#[from] TransactionError),
    #[error("Redb table error: {0}")]
    RedbTable(#[from] TableError),
    #[error("Redb commit error: {0}")]
    RedbCommit(#[from] CommitError),
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Document is not a JSON object: {0}")]
    NotAnObject(String),
    #[error("Item not found in database: {0}")]
    NotFound(String),
}

/// Document database seam. Every call is a single transaction; there is no
/// batching and no concurrency token, so concurrent writers resolve by
/// last-write-wins.
pub trait DocumentStore: Send + Sync {
    fn list(&self, collection: Collection) -> Result<Vec<Document>, DbError>;

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, DbError>;

    /// Stores a new document under a server-generated id and returns that id.
    fn create(&self, collection: Collection, write: &DocumentWrite) -> Result<String, DbError>;

    /// Writes a whole document at a caller-chosen id, replacing any previous one.
    fn set(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError>;

    /// Merges `write` into an existing document. Missing ids are `NotFound`.
    fn update(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError>;

    /// Hard delete. Removing an id that does not exist is not an error.
    fn delete(&self, collection: Collection, id: &str) -> Result<(), DbError>;
}

fn table(collection: Collection) -> TableDefinition<'static, &'static str, &'static str> {
    TableDefinition::new(collection.name())
}

fn server_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_fields(id: &str, raw: &str) -> Result<Map<String, Value>, DbError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(DbError::NotAnObject(id.to_string())),
    }
}

pub struct RedbDocumentStore {
    db: Database,
}

impl RedbDocumentStore {
    /// Opens (or creates) the documents file and makes sure every collection table exists.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let db = Database::create(path)?;
        let store = RedbDocumentStore { db };
        store.ensure_collections()?;
        Ok(store)
    }

    pub fn ensure_collections(&self) -> Result<(), DbError> {
        let write_txn = self.db.begin_write()?;
        for collection in Collection::ALL {
            write_txn.open_table(table(collection))?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl DocumentStore for RedbDocumentStore {
    fn list(&self, collection: Collection) -> Result<Vec<Document>, DbError> {
        let read_txn = self.db.begin_read()?;
        let docs_table = read_txn.open_table(table(collection))?;

        let mut documents = Vec::new();
        for item in docs_table.iter()? {
            let (id, raw) = item?;
            let id = id.value().to_string();
            match parse_fields(&id, raw.value()) {
                Ok(fields) => documents.push(Document { id, fields }),
                Err(e) => log::warn!("Skipping unreadable document {}/{}: {}", collection.name(), id, e),
            }
        }
        Ok(documents)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, DbError> {
        let read_txn = self.db.begin_read()?;
        let docs_table = read_txn.open_table(table(collection))?;

        let found = match docs_table.get(id)? {
            Some(raw) => Some(Document {
                id: id.to_string(),
                fields: parse_fields(id, raw.value())?,
            }),
            None => None,
        };
        Ok(found)
    }

    fn create(&self, collection: Collection, write: &DocumentWrite) -> Result<String, DbError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut fields = Map::new();
        write.apply_to(&mut fields, &server_now());
        let json = serde_json::to_string(&Value::Object(fields))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut docs_table = write_txn.open_table(table(collection))?;
            docs_table.insert(id.as_str(), json.as_str())?;
        }
        write_txn.commit()?;
        Ok(id)
    }

    fn set(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError> {
        let mut fields = Map::new();
        write.apply_to(&mut fields, &server_now());
        let json = serde_json::to_string(&Value::Object(fields))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut docs_table = write_txn.open_table(table(collection))?;
            docs_table.insert(id, json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn update(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut docs_table = write_txn.open_table(table(collection))?;
            let mut fields = {
                let existing = docs_table
                    .get(id)?
                    .ok_or_else(|| DbError::NotFound(format!("{}/{}", collection.name(), id)))?;
                parse_fields(id, existing.value())?
            };
            write.apply_to(&mut fields, &server_now());
            let json = serde_json::to_string(&Value::Object(fields))?;
            docs_table.insert(id, json.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), DbError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut docs_table = write_txn.open_table(table(collection))?;
            docs_table.remove(id)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::path::PathBuf;

    /// A unique file path under the system temp directory, removed on drop.
    pub(crate) struct TempPath(PathBuf);

    impl TempPath {
        pub(crate) fn new(label: &str) -> Self {
            TempPath(std::env::temp_dir().join(format!("portfoliozz-{}-{}.redb", label, Uuid::new_v4())))
        }

        pub(crate) fn as_path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    /// A redb store whose file is deleted when the store is dropped.
    pub(crate) struct TempStore {
        // Declared first so the database closes before the file is removed.
        store: RedbDocumentStore,
        path: TempPath,
    }

    impl TempStore {
        pub(crate) fn path(&self) -> &Path {
            self.path.as_path()
        }
    }

    pub(crate) fn temp_store() -> TempStore {
        let path = TempPath::new("test");
        let store = RedbDocumentStore::open(path.as_path()).expect("temp document store");
        TempStore { store, path }
    }

    impl DocumentStore for TempStore {
        fn list(&self, collection: Collection) -> Result<Vec<Document>, DbError> {
            self.store.list(collection)
        }
        fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, DbError> {
            self.store.get(collection, id)
        }
        fn create(&self, collection: Collection, write: &DocumentWrite) -> Result<String, DbError> {
            self.store.create(collection, write)
        }
        fn set(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError> {
            self.store.set(collection, id, write)
        }
        fn update(&self, collection: Collection, id: &str, write: &DocumentWrite) -> Result<(), DbError> {
            self.store.update(collection, id, write)
        }
        fn delete(&self, collection: Collection, id: &str) -> Result<(), DbError> {
            self.store.delete(collection, id)
        }
    }

    /// Fails every call; used to exercise the log-and-swallow paths.
    pub(crate) struct UnavailableStore;

    impl DocumentStore for UnavailableStore {
        fn list(&self, _: Collection) -> Result<Vec<Document>, DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
        fn get(&self, _: Collection, _: &str) -> Result<Option<Document>, DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
        fn create(&self, _: Collection, _: &DocumentWrite) -> Result<String, DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
        fn set(&self, _: Collection, _: &str, _: &DocumentWrite) -> Result<(), DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
        fn update(&self, _: Collection, _: &str, _: &DocumentWrite) -> Result<(), DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
        fn delete(&self, _: Collection, _: &str) -> Result<(), DbError> {
            Err(DbError::NotFound("backend unavailable".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use super::*;
    use serde_json::json;

    #[test]
    fn create_assigns_distinct_ids_and_list_returns_every_document() {
        let store = temp_store();
        let a = store.create(Collection::Services, &DocumentWrite::new().set("title", "A")).unwrap();
        let b = store.create(Collection::Services, &DocumentWrite::new().set("title", "B")).unwrap();
        assert_ne!(a, b);

        let mut titles: Vec<String> = store
            .list(Collection::Services)
            .unwrap()
            .into_iter()
            .map(|d| d.fields["title"].as_str().unwrap().to_string())
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["A", "B"]);
        assert!(store.list(Collection::News).unwrap().is_empty());
    }

    #[test]
    fn update_merges_fields_and_rejects_missing_ids() {
        let store = temp_store();
        let id = store
            .create(Collection::News, &DocumentWrite::new().set("title", "T").set("isActive", true))
            .unwrap();

        store.update(Collection::News, &id, &DocumentWrite::new().set("isActive", false)).unwrap();
        let doc = store.get(Collection::News, &id).unwrap().unwrap();
        assert_eq!(doc.fields["title"], json!("T"));
        assert_eq!(doc.fields["isActive"], json!(false));

        let missing = store.update(Collection::News, "nope", &DocumentWrite::new().set("isActive", true));
        assert!(matches!(missing, Err(DbError::NotFound(_))));
    }

    #[test]
    fn server_timestamp_is_resolved_on_create() {
        let store = temp_store();
        let id = store
            .create(Collection::News, &DocumentWrite::new().server_timestamp("createdAt"))
            .unwrap();
        let doc = store.get(Collection::News, &id).unwrap().unwrap();
        let stamp = doc.fields["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn delete_is_hard_and_idempotent() {
        let store = temp_store();
        let id = store.create(Collection::Services, &DocumentWrite::new().set("title", "X")).unwrap();
        store.delete(Collection::Services, &id).unwrap();
        assert!(store.get(Collection::Services, &id).unwrap().is_none());
        store.delete(Collection::Services, &id).unwrap();
    }

    #[test]
    fn temp_store_file_is_removed_on_drop() {
        let store = temp_store();
        let path = store.path().to_path_buf();
        assert!(path.exists());
        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn set_writes_at_the_given_id() {
        let store = temp_store();
        store.set(Collection::Admins, "uid-1", &DocumentWrite::new().set("email", "a@b.c")).unwrap();
        assert!(store.get(Collection::Admins, "uid-1").unwrap().is_some());
        assert!(store.get(Collection::Admins, "uid-2").unwrap().is_none());
    }
}
