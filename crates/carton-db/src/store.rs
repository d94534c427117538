//! # Document Store
//!
//! The storage seam of Carton POS: named collections of JSON documents,
//! addressed by id, with an all-or-nothing write batch.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Collection   │  id          │  fields (JSON object)                   │
//! │ ──────────────┼──────────────┼──────────────────────────────────────── │
//! │  Items        │  uuid        │  {name, category, cartons, pieces, ...} │
//! │  Sales        │  Sale-42     │  {saleId, timestamp, items, total, ...} │
//! │  Credits      │  uuid        │  {name, credit, timestamp}              │
//! │  Users        │  uuid        │  {email, displayName, passwordHash}     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`crate::Database`] implements [`DocumentStore`] over SQLite. Anything
//! else that can apply a batch atomically can stand in for it.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DbError, DbResult};

/// A document's fields.
pub type Fields = serde_json::Map<String, Value>;

// =============================================================================
// Collection
// =============================================================================

/// The fixed set of collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Sales,
    Credits,
    Users,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Items => "Items",
            Collection::Sales => "Sales",
            Collection::Credits => "Credits",
            Collection::Users => "Users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document
// =============================================================================

/// A stored document: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: Collection,
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Deserializes the fields into a record.
    pub fn decode<T: DeserializeOwned>(&self) -> DbResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| DbError::invalid(self.collection.as_str(), &self.id, e))
    }
}

/// Serializes a record into document fields.
///
/// ## Errors
/// `Serialization` when the record does not serialize to a JSON object.
pub fn to_fields<T: Serialize>(record: &T) -> DbResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DbError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Shallow merge: keys in `patch` overwrite keys in `base`.
pub fn merge_fields(base: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        base.insert(key, value);
    }
}

// =============================================================================
// Write Batch
// =============================================================================

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or replace (`merge = false`) or create or patch (`merge = true`).
    Set {
        collection: Collection,
        id: String,
        fields: Fields,
        merge: bool,
    },

    /// Patch an existing document. Fails the batch if it does not exist.
    Update {
        collection: Collection,
        id: String,
        fields: Fields,
    },

    /// Remove a document. Removing a missing document is not an error.
    Delete { collection: Collection, id: String },
}

/// Writes applied together or not at all.
///
/// ## Example
/// ```rust
/// use carton_db::store::{Collection, Fields, WriteBatch};
///
/// let mut batch = WriteBatch::new();
/// batch
///     .update(Collection::Credits, "acct-1", Fields::new())
///     .set(Collection::Sales, "Sale-1", Fields::new(), false);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        fields: Fields,
        merge: bool,
    ) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection,
            id: id.into(),
            fields,
            merge,
        });
        self
    }

    pub fn update(&mut self, collection: Collection, id: impl Into<String>, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection,
            id: id.into(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: Collection, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// Document Store Trait
// =============================================================================

/// Async access to collections of documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection, oldest first.
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Document>>;

    /// A single document, or `None` when it does not exist.
    async fn get_one(&self, collection: Collection, id: &str) -> DbResult<Option<Document>>;

    /// Creates or replaces a document; with `merge`, patches it instead.
    async fn set(&self, collection: Collection, id: &str, fields: Fields, merge: bool)
        -> DbResult<()>;

    /// Patches an existing document.
    ///
    /// ## Errors
    /// `NotFound` when the document does not exist.
    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> DbResult<()>;

    /// Removes a document if present.
    async fn delete(&self, collection: Collection, id: &str) -> DbResult<()>;

    /// Creates a document under a fresh id and returns the id.
    async fn add(&self, collection: Collection, fields: Fields) -> DbResult<String>;

    /// Applies every write in `batch`, or none of them.
    async fn commit(&self, batch: WriteBatch) -> DbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        body_text: String,
    }

    #[test]
    fn test_fields_round_trip_through_document() {
        let fields = to_fields(&Note {
            body_text: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(fields["bodyText"], json!("hello"));

        let doc = Document {
            collection: Collection::Items,
            id: "n1".to_string(),
            fields,
        };
        assert_eq!(doc.decode::<Note>().unwrap().body_text, "hello");
    }

    #[test]
    fn test_decode_failure_names_document() {
        let doc = Document {
            collection: Collection::Sales,
            id: "Sale-1".to_string(),
            fields: Fields::new(),
        };
        let err = doc.decode::<Note>().unwrap_err();
        assert!(err.to_string().starts_with("Invalid Sales document Sale-1"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(to_fields(&42), Err(DbError::Serialization(_))));
    }

    #[test]
    fn test_merge_overwrites_only_patched_keys() {
        let mut base = to_fields(&json!({"a": 1, "b": 2})).unwrap();
        merge_fields(&mut base, to_fields(&json!({"b": 3, "c": 4})).unwrap());
        assert_eq!(serde_json::Value::Object(base), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_batch_builder() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.delete(Collection::Items, "x");
        assert!(matches!(batch.ops()[0], WriteOp::Delete { .. }));
    }
}
