//! Generic CRUD handlers for site content
//!
//! Posts, services, media, projects and experience share one shape:
//! public reads, admin writes, and a single boolean list filter.

use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::AppState;
use crate::ctx::AdminCtx;
use crate::error::{Error, Result};
use crate::models::Entity;
use crate::response::{JsonBody, QueryParams, Reply};
use crate::store::{Document, Filter};

/// List filters. Each resource honours at most one of these.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

pub(crate) fn list_filter<T: Entity>(query: &ListQuery) -> Filter {
    let value = match T::LIST_FLAG {
        Some("featured") => query.featured,
        Some("active") => query.active,
        _ => None,
    };
    match (T::LIST_FLAG, value) {
        (Some(flag), Some(value)) => Filter::all().eq(flag, value),
        _ => Filter::all(),
    }
}

pub(crate) fn body_object(body: Value) -> Result<Document> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation("Request body must be a JSON object")),
    }
}

/// Every required field must be present and non-empty
pub(crate) fn require_fields<T: Entity>(body: &Document) -> Result<()> {
    let missing: Vec<&str> = T::REQUIRED
        .iter()
        .copied()
        .filter(|field| match body.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Decode a creation body into `T`
pub(crate) fn decode_new<T: Entity>(body: Document) -> Result<T> {
    serde_json::from_value(Value::Object(body)).map_err(|e| {
        Error::validation(format!("Invalid {} data: {}", T::LABEL.to_lowercase(), e))
    })
}

pub(crate) fn not_found<T: Entity>() -> Error {
    Error::not_found(format!("{} not found", T::LABEL))
}

/// GET /api/{resource}
pub async fn list<T: Entity>(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Reply<Vec<T>>> {
    let items = state.repo::<T>().get_all(&list_filter::<T>(&query)).await?;
    Ok(Reply::ok(
        format!("{} retrieved successfully", T::PLURAL),
        items,
    ))
}

/// GET /api/{resource}/{id}, where `id` may also be a slug
pub async fn get_one<T: Entity>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Reply<T>> {
    let item = state
        .repo::<T>()
        .get_by_slug_or_id(&key)
        .await?
        .ok_or_else(not_found::<T>)?;
    Ok(Reply::ok(format!("{} retrieved successfully", T::LABEL), item))
}

/// POST /api/{resource}
pub async fn create<T: Entity>(
    State(state): State<AppState>,
    AdminCtx(ctx): AdminCtx,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<T>> {
    let body = body_object(body)?;
    require_fields::<T>(&body)?;

    let item = state.repo::<T>().create(decode_new(body)?).await?;
    info!(
        "{} created {} {}",
        ctx.claims().email,
        T::LABEL,
        item.meta().id
    );
    Ok(Reply::created(
        format!("{} created successfully", T::LABEL),
        item,
    ))
}

/// PUT /api/{resource}/{id}
pub async fn update<T: Entity>(
    State(state): State<AppState>,
    AdminCtx(ctx): AdminCtx,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<T>> {
    let body = body_object(body)?;
    require_fields::<T>(&body)?;

    let item = state
        .repo::<T>()
        .update(&id, body)
        .await?
        .ok_or_else(not_found::<T>)?;
    info!("{} updated {} {}", ctx.claims().email, T::LABEL, id);
    Ok(Reply::ok(format!("{} updated successfully", T::LABEL), item))
}

/// DELETE /api/{resource}/{id}
pub async fn delete<T: Entity>(
    State(state): State<AppState>,
    AdminCtx(ctx): AdminCtx,
    Path(id): Path<String>,
) -> Result<Reply<()>> {
    state
        .repo::<T>()
        .delete(&id)
        .await?
        .ok_or_else(not_found::<T>)?;
    info!("{} deleted {} {}", ctx.claims().email, T::LABEL, id);
    Ok(Reply::message(format!("{} deleted successfully", T::LABEL)))
}
