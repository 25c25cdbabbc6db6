use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The collections the console reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Services,
    News,
    Admins,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Services, Collection::News, Collection::Admins];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Services => "services",
            Collection::News => "news",
            Collection::Admins => "admins",
        }
    }
}

/// A stored document: its id plus the JSON object it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decodes the fields into `T`, injecting the document id under `"id"`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Replaced by the store with the current UTC time when written.
    ServerTimestamp,
}

/// An ordered set of field writes for create, set, and update calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentWrite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), FieldValue::Value(value.into()));
        self
    }

    pub fn server_timestamp(mut self, key: &str) -> Self {
        self.fields.insert(key.to_string(), FieldValue::ServerTimestamp);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Resolves sentinels against `now` and merges the writes into `target`.
    pub fn apply_to(&self, target: &mut Map<String, Value>, now: &str) {
        for (key, value) in &self.fields {
            let resolved = match value {
                FieldValue::Value(v) => v.clone(),
                FieldValue::ServerTimestamp => Value::String(now.to_string()),
            };
            target.insert(key.clone(), resolved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;
    use serde_json::json;

    #[test]
    fn apply_resolves_server_timestamp_and_keeps_other_fields() {
        let mut target = Map::new();
        target.insert("title".into(), json!("Old"));
        target.insert("isActive".into(), json!(true));

        DocumentWrite::new()
            .set("title", "New")
            .server_timestamp("createdAt")
            .apply_to(&mut target, "2024-05-01T10:00:00+00:00");

        assert_eq!(target["title"], json!("New"));
        assert_eq!(target["isActive"], json!(true));
        assert_eq!(target["createdAt"], json!("2024-05-01T10:00:00+00:00"));
    }

    #[test]
    fn decode_injects_id_and_defaults_missing_fields() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("Consult"));
        fields.insert("order".into(), json!(3));
        let doc = Document { id: "abc".into(), fields };

        let service: Service = doc.decode().unwrap();
        assert_eq!(service.id, "abc");
        assert_eq!(service.title, "Consult");
        assert_eq!(service.order, 3);
        assert!(service.highlights.is_empty());
        assert_eq!(service.price, 0.0);
    }

    #[test]
    fn service_contact_number_reads_the_whatsapp_key() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("Consult"));
        fields.insert("whatsappNumber".into(), json!("+1555"));
        let doc = Document { id: "abc".into(), fields };

        let service: Service = doc.decode().unwrap();
        assert_eq!(service.contact_number, "+1555");
        assert_eq!(serde_json::to_value(&service).unwrap()["whatsappNumber"], json!("+1555"));
    }
}
