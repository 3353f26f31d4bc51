//! Document store abstraction
//!
//! Schemaless per-collection documents addressed by id, with equality
//! filters for listings. The production backend is the Firestore REST
//! API; the in-memory backend exists for tests and credential-less
//! local runs. Collection arguments are slash-separated paths, so one
//! level of subcollection (`users/{uid}/buddies`) works everywhere.

pub mod firestore;
pub mod memory;
pub mod notes;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use notes::NoteStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Top-level fields of a document.
pub type Fields = serde_json::Map<String, Value>;

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Auth error: {0}")]
    Auth(String),
}

/// A document plus its collection-assigned id.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(|v| v.as_bool())
    }
}

/// Equality filter on a top-level document field. Nothing here needs
/// range or array queries, so equality is the whole vocabulary.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Per-collection document operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id. `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully overwrite a document at a known id.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Create a document with a store-assigned id; returns the id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Merge the given top-level fields into a document, leaving other
    /// fields untouched.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete by id. Deleting an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// List documents matching every filter (no filters lists all).
    async fn stream(
        &self,
        collection: &str,
        filters: &[FieldFilter],
    ) -> Result<Vec<Document>, StoreError>;
}

/// Convenience for building `Fields` from a `json!` object literal.
/// Non-object values produce an empty field map.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}
