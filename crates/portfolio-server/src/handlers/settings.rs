//! Site settings singleton

use axum::extract::State;
use serde_json::Value;
use tracing::info;

use super::content::{body_object, decode_new};
use crate::config::AppState;
use crate::ctx::AdminCtx;
use crate::error::{Error, Result};
use crate::models::{Entity, Settings};
use crate::response::{JsonBody, Reply};
use crate::store::Filter;

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Reply<Settings>> {
    let settings = state
        .repo::<Settings>()
        .find_one(&Filter::all())
        .await?
        .unwrap_or_default();
    Ok(Reply::ok("Settings retrieved successfully", settings))
}

/// PUT /api/settings: update the stored document, or create it from defaults
pub async fn update_settings(
    State(state): State<AppState>,
    AdminCtx(ctx): AdminCtx,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<Settings>> {
    let changes = body_object(body)?;
    let repo = state.repo::<Settings>();

    let settings = match repo.find_one(&Filter::all()).await? {
        Some(existing) => repo
            .update(&existing.meta().id, changes)
            .await?
            .ok_or_else(|| Error::not_found("Settings not found"))?,
        None => {
            let mut doc = body_object(serde_json::to_value(Settings::default())?)?;
            doc.extend(changes);
            repo.create(decode_new(doc)?).await?
        }
    };

    info!("{} updated site settings", ctx.claims().email);
    Ok(Reply::ok("Settings updated successfully", settings))
}
