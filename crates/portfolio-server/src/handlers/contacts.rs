//! Contact form handlers

use axum::extract::{Path, State};
use serde_json::Value;
use tracing::info;

use super::content::{body_object, decode_new, not_found, require_fields};
use crate::config::AppState;
use crate::ctx::AdminCtx;
use crate::error::Result;
use crate::models::Contact;
use crate::response::{JsonBody, Reply};
use crate::store::Filter;

/// POST /api/contacts
pub async fn submit(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<Contact>> {
    let body = body_object(body)?;
    require_fields::<Contact>(&body)?;

    let mut contact: Contact = decode_new(body)?;
    contact.read = false;

    let contact = state.repo::<Contact>().create(contact).await?;
    info!("New contact message from {}", contact.email);
    Ok(Reply::created("Message sent successfully", contact))
}

/// GET /api/contacts
pub async fn list(State(state): State<AppState>, _admin: AdminCtx) -> Result<Reply<Vec<Contact>>> {
    let contacts = state.repo::<Contact>().get_all(&Filter::all()).await?;
    Ok(Reply::ok("Contacts retrieved successfully", contacts))
}

/// GET /api/contacts/{id}
pub async fn get_one(
    State(state): State<AppState>,
    _admin: AdminCtx,
    Path(id): Path<String>,
) -> Result<Reply<Contact>> {
    let contact = state
        .repo::<Contact>()
        .get_by_id(&id)
        .await?
        .ok_or_else(not_found::<Contact>)?;
    Ok(Reply::ok("Contact retrieved successfully", contact))
}

/// PUT /api/contacts/{id}, typically `{"read": true}`
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminCtx,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<Contact>> {
    let contact = state
        .repo::<Contact>()
        .update(&id, body_object(body)?)
        .await?
        .ok_or_else(not_found::<Contact>)?;
    Ok(Reply::ok("Contact updated successfully", contact))
}

/// DELETE /api/contacts/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminCtx,
    Path(id): Path<String>,
) -> Result<Reply<()>> {
    state
        .repo::<Contact>()
        .delete(&id)
        .await?
        .ok_or_else(not_found::<Contact>)?;
    info!("Deleted contact {}", id);
    Ok(Reply::message("Contact deleted successfully"))
}
