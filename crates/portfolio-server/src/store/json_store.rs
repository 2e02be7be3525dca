//! JSON file document store
//!
//! Each collection is one `<collection>.json` file holding an array of
//! documents. Collections are loaded lazily and cached; every mutation is
//! written back atomically (temp file + rename). The cache only changes
//! once the write has succeeded.

use super::{new_id, Document, DocumentStore, Filter, ID_FIELD};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct JsonDocumentStore {
    dir: PathBuf,
    /// In-memory cache of loaded collections
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl JsonDocumentStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;

        info!("JSON document store at {:?}", dir);

        Ok(Self {
            dir,
            collections: RwLock::new(HashMap::new()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }

    async fn load_from_disk(path: &Path) -> Result<Vec<Document>> {
        if !fs::try_exists(path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await?;
        let docs: Vec<Document> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse collection file {:?}", path))?;
        Ok(docs)
    }

    async fn save_to_disk(&self, collection: &str, docs: &[Document]) -> Result<()> {
        let path = self.collection_path(collection);
        let temp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(docs)?;
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    /// Make sure `collection` is cached. Call with the write lock held.
    async fn ensure_loaded<'a>(
        &self,
        collections: &'a mut HashMap<String, Vec<Document>>,
        collection: &str,
    ) -> Result<&'a mut Vec<Document>> {
        if !collections.contains_key(collection) {
            let docs = Self::load_from_disk(&self.collection_path(collection)).await?;
            collections.insert(collection.to_string(), docs);
        }
        collections
            .get_mut(collection)
            .context("collection vanished from cache")
    }

    fn position(docs: &[Document], id: &str) -> Option<usize> {
        docs.iter()
            .position(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }

    async fn with_collection<R>(
        &self,
        collection: &str,
        read: impl FnOnce(&[Document]) -> R,
    ) -> Result<R> {
        {
            let collections = self.collections.read().await;
            if let Some(docs) = collections.get(collection) {
                return Ok(read(docs.as_slice()));
            }
        }

        let mut collections = self.collections.write().await;
        let docs = self.ensure_loaded(&mut collections, collection).await?;
        Ok(read(docs.as_slice()))
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.with_collection(collection, |docs| {
            docs.iter().filter(|d| filter.matches(d)).cloned().collect()
        })
        .await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        self.with_collection(collection, |docs| {
            docs.iter().find(|d| filter.matches(d)).cloned()
        })
        .await
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<Document> {
        let has_id = matches!(doc.get(ID_FIELD), Some(Value::String(id)) if !id.is_empty());
        if !has_id {
            doc.insert(ID_FIELD.to_string(), Value::String(new_id()));
        }

        let mut collections = self.collections.write().await;
        let docs = self.ensure_loaded(&mut collections, collection).await?;

        if docs.iter().any(|d| d.get(ID_FIELD) == doc.get(ID_FIELD)) {
            anyhow::bail!("Duplicate document id in {}", collection);
        }

        let mut next = docs.clone();
        next.push(doc.clone());
        self.save_to_disk(collection, &next).await?;
        *docs = next;

        Ok(doc)
    }

    async fn replace(&self, collection: &str, id: &str, mut doc: Document) -> Result<Option<Document>> {
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        let docs = self.ensure_loaded(&mut collections, collection).await?;

        let Some(pos) = Self::position(docs, id) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        next[pos] = doc.clone();
        self.save_to_disk(collection, &next).await?;
        *docs = next;

        Ok(Some(doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let mut collections = self.collections.write().await;
        let docs = self.ensure_loaded(&mut collections, collection).await?;

        let Some(pos) = Self::position(docs, id) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        let removed = next.remove(pos);
        self.save_to_disk(collection, &next).await?;
        *docs = next;

        Ok(Some(removed))
    }

    async fn ensure_unique_index(&self, collection: &str, field: &str) -> Result<()> {
        // Uniqueness is checked by the repositories before insert; just
        // report existing violations so they are visible at startup.
        let dupes = self
            .with_collection(collection, |docs| {
                let mut seen = std::collections::HashSet::new();
                docs.iter()
                    .filter_map(|d| d.get(field))
                    .filter(|v| !seen.insert(v.to_string()))
                    .count()
            })
            .await?;
        if dupes > 0 {
            warn!(
                "{} duplicate value(s) for unique field {}.{}",
                dupes, collection, field
            );
        }
        Ok(())
    }
}
