//! Document storage
//!
//! A `DocumentStore` holds schema-less JSON documents grouped in named
//! collections. Typed access goes through [`Repository`], which owns
//! validation and timestamps; backends only move documents around.

pub mod json_store;
pub mod mongo_store;
pub mod repository;
pub mod users;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};

pub use json_store::JsonDocumentStore;
pub use mongo_store::MongoDocumentStore;
pub use repository::Repository;
pub use users::UserStore;

/// A stored document: a JSON object whose `_id` is an ObjectId hex string
pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Fresh 24-hex-digit document id
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Whether `key` looks like a document id rather than a slug
pub fn is_document_id(key: &str) -> bool {
    ObjectId::parse_str(key).is_ok()
}

/// Equality filter over top-level fields. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::all().eq(ID_FIELD, id)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, value)| doc.get(field) == Some(value))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` matching `filter`, in insertion order
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Insert `doc`, assigning `_id` when missing. Returns the stored document.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document>;

    /// Replace the document with `id`. `None` when it does not exist.
    async fn replace(&self, collection: &str, id: &str, doc: Document) -> Result<Option<Document>>;

    /// Remove the document with `id`, returning it. `None` when it does not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Declare `field` unique within `collection`
    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()>;
}
