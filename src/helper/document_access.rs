//! List/Create/Update/Delete with the console's failure policy: backend
//! errors are logged and swallowed, and the caller sees only that the action
//! did not complete.

use crate::models::db_operations::documents_db_operations::DocumentStore;
use crate::models::document::{Collection, Document, DocumentWrite};
use crate::models::{NewsItem, Service};
use serde::de::DeserializeOwned;

pub fn list(store: &dyn DocumentStore, collection: Collection) -> Option<Vec<Document>> {
    match store.list(collection) {
        Ok(documents) => Some(documents),
        Err(e) => {
            log::error!("Error fetching {}: {}", collection.name(), e);
            None
        }
    }
}

pub fn create(store: &dyn DocumentStore, collection: Collection, write: &DocumentWrite) -> bool {
    match store.create(collection, write) {
        Ok(id) => {
            log::info!("Created {}/{}", collection.name(), id);
            true
        }
        Err(e) => {
            log::error!("Error adding to {}: {}", collection.name(), e);
            false
        }
    }
}

pub fn update(store: &dyn DocumentStore, collection: Collection, id: &str, write: &DocumentWrite) -> bool {
    match store.update(collection, id, write) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Error updating {}/{}: {}", collection.name(), id, e);
            false
        }
    }
}

pub fn delete(store: &dyn DocumentStore, collection: Collection, id: &str) -> bool {
    match store.delete(collection, id) {
        Ok(()) => {
            log::info!("Deleted {}/{}", collection.name(), id);
            true
        }
        Err(e) => {
            log::error!("Error deleting {}/{}: {}", collection.name(), id, e);
            false
        }
    }
}

fn decode_all<T: DeserializeOwned>(collection: Collection, documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed {}/{}: {}", collection.name(), doc.id, e);
                None
            }
        })
        .collect()
}

/// Unordered; callers sort.
pub fn list_services(store: &dyn DocumentStore) -> Option<Vec<Service>> {
    list(store, Collection::Services).map(|docs| decode_all(Collection::Services, docs))
}

pub fn list_news(store: &dyn DocumentStore) -> Option<Vec<NewsItem>> {
    list(store, Collection::News).map(|docs| decode_all(Collection::News, docs))
}

pub fn find_service(store: &dyn DocumentStore, id: &str) -> Option<Service> {
    match store.get(Collection::Services, id) {
        Ok(doc) => doc.and_then(|d| d.decode().ok()),
        Err(e) => {
            log::error!("Error fetching services/{}: {}", id, e);
            None
        }
    }
}

pub fn find_news(store: &dyn DocumentStore, id: &str) -> Option<NewsItem> {
    match store.get(Collection::News, id) {
        Ok(doc) => doc.and_then(|d| d.decode().ok()),
        Err(e) => {
            log::error!("Error fetching news/{}: {}", id, e);
            None
        }
    }
}

/// Writes `isActive = !current_status`, where `current_status` is the state
/// the admin was shown. No other field is touched.
pub fn toggle_news_active(store: &dyn DocumentStore, id: &str, current_status: bool) -> bool {
    update(store, Collection::News, id, &DocumentWrite::new().set("isActive", !current_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::db_operations::documents_db_operations::test_support::{temp_store, UnavailableStore};
    use crate::models::Impact;

    #[test]
    fn failures_are_swallowed() {
        let store = UnavailableStore;
        assert!(list(&store, Collection::Services).is_none());
        assert!(!create(&store, Collection::Services, &DocumentWrite::new().set("title", "x")));
        assert!(!update(&store, Collection::News, "id", &DocumentWrite::new().set("title", "x")));
        assert!(!delete(&store, Collection::News, "id"));
        assert!(find_service(&store, "id").is_none());
    }

    #[test]
    fn toggling_twice_restores_state_and_leaves_other_fields() {
        let store = temp_store();
        let write = DocumentWrite::new()
            .set("title", "Rates")
            .set("content", "Central bank holds")
            .set("impact", "high")
            .server_timestamp("createdAt")
            .set("isActive", true);
        assert!(create(&store, Collection::News, &write));
        let original = list_news(&store).unwrap().pop().unwrap();

        assert!(toggle_news_active(&store, &original.id, original.is_active));
        let once = find_news(&store, &original.id).unwrap();
        assert!(!once.is_active);

        assert!(toggle_news_active(&store, &once.id, once.is_active));
        let twice = find_news(&store, &original.id).unwrap();
        assert_eq!(twice, original);
        assert_eq!(twice.impact, Impact::High);
    }

    #[test]
    fn malformed_documents_are_skipped_on_list() {
        let store = temp_store();
        create(&store, Collection::Services, &DocumentWrite::new().set("title", "Good").set("order", 1));
        create(&store, Collection::Services, &DocumentWrite::new().set("title", "Bad").set("order", "first"));
        let services = list_services(&store).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].title, "Good");
    }
}
