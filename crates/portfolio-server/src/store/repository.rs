//! Typed access to one collection

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::{is_document_id, Document, DocumentStore, Filter, ID_FIELD};
use crate::error::{Error, Result};
use crate::models::Entity;

/// Fields the server owns; request bodies cannot overwrite them
const MANAGED_FIELDS: &[&str] = &[ID_FIELD, "createdAt", "updatedAt"];

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

fn decode<T: Entity>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

fn encode<T: Entity>(entity: &T) -> Result<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Internal(anyhow::anyhow!(
            "{} did not serialize to an object: {}",
            T::LABEL,
            other
        ))),
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// All matching documents in list order
    pub async fn get_all(&self, filter: &Filter) -> Result<Vec<T>> {
        let docs = self.store.find(T::COLLECTION, filter).await?;
        let mut items = docs.into_iter().map(decode).collect::<Result<Vec<T>>>()?;
        T::sort(&mut items);
        Ok(items)
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(decode)
            .transpose()
    }

    /// Look up by id. Malformed ids are simply not found.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        if !is_document_id(id) {
            return Ok(None);
        }
        self.find_one(&Filter::by_id(id)).await
    }

    /// `key` is treated as an id when it parses as one, otherwise as a slug
    pub async fn get_by_slug_or_id(&self, key: &str) -> Result<Option<T>> {
        if is_document_id(key) {
            return self.get_by_id(key).await;
        }
        if !T::HAS_SLUG {
            return Ok(None);
        }
        self.find_one(&Filter::all().eq("slug", key)).await
    }

    /// Fill defaults, validate and insert. The store assigns the id.
    pub async fn create(&self, mut entity: T) -> Result<T> {
        entity.prepare();
        entity.validate()?;

        let now = Utc::now();
        let meta = entity.meta_mut();
        meta.id.clear();
        meta.created_at = Some(now);
        meta.updated_at = Some(now);

        let doc = encode(&entity)?;
        self.check_unique(&doc, None).await?;

        let stored = self.store.insert(T::COLLECTION, doc).await?;
        let created: T = decode(stored)?;
        debug!("Created {} {}", T::LABEL, created.meta().id);
        Ok(created)
    }

    /// Merge `changes` into the stored document and re-validate the result.
    /// `None` when no document has `id`.
    pub async fn update(&self, id: &str, changes: Document) -> Result<Option<T>> {
        if !is_document_id(id) {
            return Ok(None);
        }
        let Some(mut doc) = self.store.find_one(T::COLLECTION, &Filter::by_id(id)).await? else {
            return Ok(None);
        };

        for (field, value) in changes {
            if !MANAGED_FIELDS.contains(&field.as_str()) {
                doc.insert(field, value);
            }
        }

        let entity: T = serde_json::from_value(Value::Object(doc)).map_err(|e| {
            Error::validation(format!("Invalid {} data: {}", T::LABEL.to_lowercase(), e))
        })?;
        self.save(&entity).await
    }

    /// Re-validate `entity` and write it over the stored copy with the same id
    pub async fn save(&self, entity: &T) -> Result<Option<T>> {
        let mut entity = entity.clone();
        entity.prepare();
        entity.validate()?;
        entity.meta_mut().updated_at = Some(Utc::now());

        let id = entity.meta().id.clone();
        if !is_document_id(&id) {
            return Ok(None);
        }

        let doc = encode(&entity)?;
        self.check_unique(&doc, Some(&id)).await?;

        self.store
            .replace(T::COLLECTION, &id, doc)
            .await?
            .map(decode)
            .transpose()
    }

    /// Remove and return the document with `id`
    pub async fn delete(&self, id: &str) -> Result<Option<T>> {
        if !is_document_id(id) {
            return Ok(None);
        }
        self.store
            .delete(T::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    async fn check_unique(&self, doc: &Document, own_id: Option<&str>) -> Result<()> {
        for field in T::UNIQUE {
            let Some(value) = doc.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            let existing = self
                .store
                .find_one(T::COLLECTION, &Filter::all().eq(*field, value.clone()))
                .await?;
            let clash = existing
                .as_ref()
                .and_then(|d| d.get(ID_FIELD))
                .and_then(Value::as_str)
                .is_some_and(|existing_id| Some(existing_id) != own_id);
            if clash {
                return Err(Error::validation(format!(
                    "{} with this {} already exists",
                    T::LABEL,
                    field
                )));
            }
        }
        Ok(())
    }
}
