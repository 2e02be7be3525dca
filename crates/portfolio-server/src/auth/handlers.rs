//! Auth handlers

use axum::extract::State;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::auth::{clear_session_cookie, session_cookie, verify_password};
use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::models::{Role, UserInfo};
use crate::response::{JsonBody, Reply};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub secret_key: String,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Sign `user` in: a token in the session cookie plus the public profile
fn signed_in(state: &AppState, reply: Reply<UserInfo>, user: &UserInfo) -> Result<Reply<UserInfo>> {
    let token = state.keys.issue_token(user)?;
    Ok(reply.with_cookie(session_cookie(&token, state.config.secure_cookies)))
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<Reply<UserInfo>> {
    info!("POST /api/auth/signup - {}", req.email);

    if blank(&req.name) || blank(&req.email) || blank(&req.password) {
        return Err(Error::validation("Name, email and password are required"));
    }

    let user = state
        .users()
        .create_user(&req.name, &req.email, &req.password, Role::User)
        .await
        .inspect_err(|e| warn!("Signup failed for {}: {}", req.email, e))?;

    let user = UserInfo::from(user);
    info!("User {} registered successfully", user.email);
    signed_in(&state, Reply::created("User created successfully", user.clone()), &user)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Reply<UserInfo>> {
    info!("POST /api/auth/login - {}", req.email);

    if blank(&req.email) || blank(&req.password) {
        return Err(Error::validation("Email and password are required"));
    }

    let user = match state.users().find_by_email(&req.email).await? {
        Some(user) if verify_password(&req.password, &user.password) => user,
        _ => {
            warn!("Login failed for {}", req.email);
            return Err(Error::unauthorized("Invalid email or password"));
        }
    };

    let user = UserInfo::from(user);
    info!("User {} logged in successfully", user.email);
    signed_in(&state, Reply::ok("Login successful", user.clone()), &user)
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> Reply<()> {
    info!("POST /api/auth/logout");
    Reply::message("Logged out successfully")
        .with_cookie(clear_session_cookie(state.config.secure_cookies))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, ctx: Ctx) -> Result<Reply<UserInfo>> {
    let user = state
        .users()
        .get(ctx.user_id())
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    Ok(Reply::ok("User retrieved successfully", UserInfo::from(user)))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    ctx: Ctx,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Reply<()>> {
    info!("POST /api/auth/change-password - {}", ctx.claims().email);

    if blank(&req.current_password) || blank(&req.new_password) {
        return Err(Error::validation(
            "Current password and new password are required",
        ));
    }

    let users = state.users();
    let user = users
        .get(ctx.user_id())
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    if !verify_password(&req.current_password, &user.password) {
        warn!("Wrong current password for {}", user.email);
        return Err(Error::validation("Current password is incorrect"));
    }

    users
        .set_password(ctx.user_id(), &req.new_password)
        .await?
        .ok_or_else(|| Error::not_found("User not found"))?;

    Ok(Reply::message("Password changed successfully"))
}

/// Compares fixed-length digests without short-circuiting
fn secrets_match(expected: &str, given: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let given = Sha256::digest(given.as_bytes());
    expected
        .iter()
        .zip(given.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// POST /api/auth/create-admin
///
/// Bootstraps an admin account. Refused unless `ADMIN_SECRET_KEY` is
/// configured and matches `secretKey`.
pub async fn create_admin(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateAdminRequest>,
) -> Result<Reply<UserInfo>> {
    info!("POST /api/auth/create-admin - {}", req.email);

    let authorized = state
        .config
        .admin_secret_key
        .as_deref()
        .is_some_and(|key| secrets_match(key, &req.secret_key));
    if !authorized {
        warn!("create-admin refused for {}: bad secret key", req.email);
        return Err(Error::unauthorized("Invalid secret key"));
    }

    if blank(&req.name) || blank(&req.email) || blank(&req.password) {
        return Err(Error::validation("Name, email and password are required"));
    }

    let user = state
        .users()
        .create_user(&req.name, &req.email, &req.password, Role::Admin)
        .await?;

    info!("Admin {} created", user.email);
    Ok(Reply::created(
        "Admin user created successfully",
        UserInfo::from(user),
    ))
}
