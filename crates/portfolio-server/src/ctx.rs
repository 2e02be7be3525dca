//! Request context extractors

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{require_role, verify_session, SessionClaims};
use crate::config::AppState;
use crate::error::{Error, Result};
use crate::models::Role;

/// The signed-in caller
#[derive(Clone, Debug)]
pub struct Ctx {
    claims: SessionClaims,
}

impl Ctx {
    pub fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> &str {
        &self.claims.id
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }
}

impl FromRequestParts<AppState> for Ctx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Already resolved by middleware
        if let Some(ctx) = parts.extensions.get::<Ctx>() {
            return Ok(ctx.clone());
        }

        let claims = verify_session(&state.keys, &parts.headers)?
            .ok_or_else(|| Error::unauthorized("Not authenticated"))?;
        let ctx = Ctx::new(claims);
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

/// A signed-in caller holding the admin role
#[derive(Clone, Debug)]
pub struct AdminCtx(pub Ctx);

impl FromRequestParts<AppState> for AdminCtx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let ctx = Ctx::from_request_parts(parts, state).await?;
        require_role(ctx.claims(), Role::Admin)?;
        Ok(AdminCtx(ctx))
    }
}
