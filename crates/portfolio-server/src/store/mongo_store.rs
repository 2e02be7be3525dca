//! MongoDB document store
//!
//! Documents cross the boundary as JSON objects; `_id` is stored as a
//! native ObjectId and surfaced as its hex string.

use super::{new_id, Document, DocumentStore, Filter, ID_FIELD};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document as BsonDocument};
use mongodb::options::{ClientOptions, FindOneAndReplaceOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

/// MongoDB-backed store.
///
/// Constructing the store does no I/O. The client is created and pinged on
/// the first operation; that connection is kept for the life of the store
/// and shared by every request. A failed first connection is not cached, so
/// the next operation retries it.
pub struct MongoDocumentStore {
    uri: String,
    database: String,
    db: OnceCell<Database>,
}

impl MongoDocumentStore {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            db: OnceCell::new(),
        }
    }

    async fn db(&self) -> Result<&Database> {
        self.db
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(&self.uri)
                    .await
                    .context("Invalid MongoDB URI")?;
                options.app_name = Some("portfolio-server".to_string());

                let client = Client::with_options(options)?;
                let db = client.database(&self.database);
                db.run_command(doc! { "ping": 1 }, None)
                    .await
                    .context("MongoDB ping failed")?;

                info!("Connected to MongoDB database {}", self.database);
                Ok::<_, anyhow::Error>(db)
            })
            .await
    }

    async fn collection(&self, name: &str) -> Result<Collection<BsonDocument>> {
        Ok(self.db().await?.collection::<BsonDocument>(name))
    }
}

fn id_to_bson(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

fn id_filter(id: &str) -> BsonDocument {
    let mut filter = BsonDocument::new();
    filter.insert(ID_FIELD, id_to_bson(id));
    filter
}

pub(crate) fn to_bson(doc: &Document) -> Result<BsonDocument> {
    let mut out = bson::to_document(doc)?;
    if let Some(Bson::String(id)) = out.get(ID_FIELD).cloned() {
        out.insert(ID_FIELD, id_to_bson(&id));
    }
    Ok(out)
}

pub(crate) fn from_bson(mut doc: BsonDocument) -> Result<Document> {
    if let Ok(oid) = doc.get_object_id(ID_FIELD) {
        doc.insert(ID_FIELD, oid.to_hex());
    }
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => bail!("Expected a document, got {}", other),
    }
}

pub(crate) fn filter_to_bson(filter: &Filter) -> Result<BsonDocument> {
    let mut out = BsonDocument::new();
    for (field, value) in filter.clauses() {
        let value = match (field.as_str(), value) {
            (ID_FIELD, Value::String(id)) => id_to_bson(id),
            _ => bson::to_bson(value)?,
        };
        out.insert(field.clone(), value);
    }
    Ok(out)
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let coll = self.collection(collection).await?;
        let cursor = coll.find(filter_to_bson(filter)?, None).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        docs.into_iter().map(from_bson).collect()
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let coll = self.collection(collection).await?;
        coll.find_one(filter_to_bson(filter)?, None)
            .await?
            .map(from_bson)
            .transpose()
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let has_id = matches!(doc.get(ID_FIELD), Some(Value::String(id)) if !id.is_empty());
        if !has_id {
            doc.insert(ID_FIELD.to_string(), Value::String(new_id()));
        }

        let coll = self.collection(collection).await?;
        coll.insert_one(to_bson(&doc)?, None).await?;
        Ok(doc)
    }

    async fn replace(&self, collection: &str, id: &str, mut doc: Document) -> Result<Option<Document>> {
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let coll = self.collection(collection).await?;
        let options = FindOneAndReplaceOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        coll.find_one_and_replace(id_filter(id), to_bson(&doc)?, options)
            .await?
            .map(from_bson)
            .transpose()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let coll = self.collection(collection).await?;
        coll.find_one_and_delete(id_filter(id), None)
            .await?
            .map(from_bson)
            .transpose()
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        let coll = self.collection(collection).await?;
        let mut keys = BsonDocument::new();
        keys.insert(field, 1);

        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        coll.create_index(index, None).await?;
        Ok(())
    }
}
