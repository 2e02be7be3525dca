//! Authentication Module
//!
//! Password hashing, stateless session tokens and the session cookie.
//! Sessions are HS256 JWTs; there is no server-side session table, so
//! logout only clears the cookie.

pub mod handlers;
pub mod middleware;

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use headers::{Cookie, HeaderMapExt};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Role, UserInfo};

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_TTL_DAYS: i64 = 7;

pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).context("Failed to hash password")
}

/// Constant-time bcrypt check. A malformed hash is a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

/// Identity carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_token(&self, user: &UserInfo) -> Result<String> {
        self.issue_token_at(user, Utc::now().timestamp())
    }

    pub fn issue_token_at(&self, user: &UserInfo, now: i64) -> Result<String> {
        let claims = SessionClaims {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + Duration::days(SESSION_TTL_DAYS).num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign session token")
    }

    pub fn verify_token(&self, token: &str) -> Result<Option<SessionClaims>> {
        self.verify_token_at(token, Utc::now().timestamp())
    }

    /// Claims of `token` if its signature checks out and `now <= exp`.
    /// Only a key problem is an error; bad tokens are `None`.
    pub fn verify_token_at(&self, token: &str, now: i64) -> Result<Option<SessionClaims>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::InvalidKeyFormat) => {
                return Err(anyhow::Error::new(e).context("Session key is unusable"));
            }
            Err(e) => {
                debug!("Rejected session token: {}", e);
                return Ok(None);
            }
        };

        if now > claims.exp {
            debug!("Session token for {} expired", claims.email);
            return Ok(None);
        }
        Ok(Some(claims))
    }
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        Duration::days(SESSION_TTL_DAYS).num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.typed_get::<Cookie>()?;
    cookie
        .get(SESSION_COOKIE)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Session claims from the request cookie, if any valid session is present
pub fn verify_session(keys: &SessionKeys, headers: &HeaderMap) -> Result<Option<SessionClaims>> {
    let Some(token) = token_from_headers(headers) else {
        return Ok(None);
    };
    let claims = keys.verify_token(&token)?;
    if claims.is_none() {
        warn!("Request carried an invalid or expired session token");
    }
    Ok(claims)
}

/// The one authorization check: does the session hold `role`?
pub fn require_role(claims: &SessionClaims, role: Role) -> crate::error::Result<()> {
    match (role, claims.role) {
        (Role::User, _) | (Role::Admin, Role::Admin) => Ok(()),
        (Role::Admin, Role::User) => {
            warn!("{} attempted an admin action", claims.email);
            Err(crate::error::Error::unauthorized("Unauthorized"))
        }
    }
}
