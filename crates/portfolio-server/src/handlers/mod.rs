//! Route handlers
//!
//! Every handler answers with the `{success, message, data?}` envelope.

pub mod contacts;
pub mod content;
pub mod newsletter;
pub mod settings;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::response::{Envelope, Reply};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health
pub async fn health_check() -> Reply<Health> {
    Reply::ok(
        "Server is running",
        Health {
            status: "ok",
            timestamp: Utc::now(),
        },
    )
}

/// Fallback for paths no route matches
pub async fn route_not_found() -> Error {
    Error::not_found("Route not found")
}

/// Fallback for a known path called with an unsupported method
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Envelope::<()>::failure("Method not allowed")),
    )
        .into_response()
}
