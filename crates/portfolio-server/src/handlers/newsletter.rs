//! Newsletter subscription handlers
//!
//! Unsubscribe links carry the subscriber's email as plain standard base64.
//! The token is neither signed nor expiring, so anyone who knows an address
//! can unsubscribe it.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::content::{body_object, not_found};
use crate::config::AppState;
use crate::error::{Error, Result};
use crate::models::{is_valid_email, normalize_email, Subscriber};
use crate::response::{JsonBody, QueryParams, Reply};
use crate::store::{Filter, Repository};

/// Token for an unsubscribe link
pub fn encode_unsubscribe_token(email: &str) -> String {
    STANDARD.encode(normalize_email(email))
}

/// Email carried by an unsubscribe token, if it decodes to a plausible address
pub fn decode_unsubscribe_token(token: &str) -> Option<String> {
    // '+' arrives as a space when the query string was not percent-encoded
    let token = token.trim().replace(' ', "+");
    let bytes = STANDARD.decode(token).ok()?;
    let email = String::from_utf8(bytes).ok()?;
    is_valid_email(&email).then(|| normalize_email(&email))
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStatus {
    pub email: String,
    pub subscribed: bool,
}

fn checked_email(email: &str) -> Result<String> {
    if email.trim().is_empty() {
        return Err(Error::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(Error::validation("Please provide a valid email address"));
    }
    Ok(normalize_email(email))
}

async fn find_subscriber(repo: &Repository<Subscriber>, email: &str) -> Result<Option<Subscriber>> {
    repo.find_one(&Filter::all().eq("email", email)).await
}

/// POST /api/newsletter/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SubscribeRequest>,
) -> Result<Reply<Subscriber>> {
    let email = checked_email(&req.email)?;
    info!("POST /api/newsletter/subscribe - {}", email);

    let repo = state.repo::<Subscriber>();
    match find_subscriber(&repo, &email).await? {
        Some(existing) if existing.active => Err(Error::validation("Email already subscribed")),
        Some(mut existing) => {
            existing.activate();
            if req.name.is_some() {
                existing.name = req.name;
            }
            let subscriber = repo
                .save(&existing)
                .await?
                .ok_or_else(not_found::<Subscriber>)?;
            info!("{} resubscribed", email);
            Ok(Reply::ok(
                "Successfully resubscribed to newsletter",
                subscriber,
            ))
        }
        None => {
            let subscriber = repo.create(Subscriber::new(&email, req.name)).await?;
            info!("{} subscribed", email);
            Ok(Reply::created(
                "Successfully subscribed to newsletter",
                subscriber,
            ))
        }
    }
}

/// GET /api/newsletter/subscribe?email=
pub async fn subscription_status(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EmailQuery>,
) -> Result<Reply<SubscriptionStatus>> {
    let email = checked_email(query.email.as_deref().unwrap_or_default())?;
    let subscribed = find_subscriber(&state.repo::<Subscriber>(), &email)
        .await?
        .is_some_and(|s| s.active);

    Ok(Reply::ok(
        "Subscription status retrieved successfully",
        SubscriptionStatus { email, subscribed },
    ))
}

/// GET /api/newsletter/unsubscribe?token=
///
/// Always answers with a redirect to the site's unsubscribe page.
pub async fn unsubscribe_via_link(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TokenQuery>,
) -> Redirect {
    let status = match query.token.as_deref().and_then(decode_unsubscribe_token) {
        None => {
            warn!("Unsubscribe link with an invalid token");
            "invalid"
        }
        Some(email) => match deactivate(&state, &email).await {
            Ok(Some(_)) => "success",
            Ok(None) => {
                warn!("Unsubscribe link for unknown address {}", email);
                "error"
            }
            Err(e) => {
                warn!("Unsubscribe via link failed for {}: {}", email, e);
                "error"
            }
        },
    };

    Redirect::temporary(&format!(
        "{}/newsletter/unsubscribe?status={}",
        state.config.site_url, status
    ))
}

/// POST /api/newsletter/unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SubscribeRequest>,
) -> Result<Reply<Subscriber>> {
    let email = checked_email(&req.email)?;
    info!("POST /api/newsletter/unsubscribe - {}", email);

    let subscriber = deactivate(&state, &email)
        .await?
        .ok_or_else(|| Error::not_found("Email not found in subscribers"))?;
    Ok(Reply::ok(
        "Successfully unsubscribed from newsletter",
        subscriber,
    ))
}

/// Mark `email` inactive. Already inactive subscribers are left as they are.
async fn deactivate(state: &AppState, email: &str) -> Result<Option<Subscriber>> {
    let repo = state.repo::<Subscriber>();
    let Some(mut subscriber) = find_subscriber(&repo, email).await? else {
        return Ok(None);
    };
    if !subscriber.active {
        return Ok(Some(subscriber));
    }
    subscriber.deactivate();
    let saved = repo.save(&subscriber).await?;
    info!("{} unsubscribed", email);
    Ok(saved)
}

/// PUT /api/admin/subscribers/{id}: partial update, no required fields
pub async fn update_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Reply<Subscriber>> {
    let subscriber = state
        .repo::<Subscriber>()
        .update(&id, body_object(body)?)
        .await?
        .ok_or_else(not_found::<Subscriber>)?;
    Ok(Reply::ok("Subscriber updated successfully", subscriber))
}
