use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::{require_role, verify_session};
use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::models::Role;

/// Gate a router on an admin session. The resolved `Ctx` is stored in
/// request extensions for the handlers.
pub async fn mw_require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_admin {}", req.uri().path());

    let claims = verify_session(&state.keys, req.headers())?
        .ok_or_else(|| Error::unauthorized("Not authenticated"))?;
    require_role(&claims, Role::Admin)?;

    req.extensions_mut().insert(Ctx::new(claims));

    Ok(next.run(req).await)
}
