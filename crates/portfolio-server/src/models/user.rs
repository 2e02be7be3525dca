use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_email, max_len, normalize_email, require, DocMeta, Entity};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// A stored account. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

fn looks_like_bcrypt(hash: &str) -> bool {
    hash.len() == 60 && hash.starts_with("$2")
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "User";
    const PLURAL: &'static str = "Users";
    const REQUIRED: &'static [&'static str] = &["name", "email", "password"];
    const UNIQUE: &'static [&'static str] = &["email"];

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
    }

    fn validate(&self) -> Result<()> {
        require("Name", &self.name)?;
        max_len("Name", &self.name, 50)?;
        require("Email", &self.email)?;
        check_email("Email", &self.email)?;
        require("Password", &self.password)?;
        if !looks_like_bcrypt(&self.password) {
            return Err(Error::Internal(anyhow::anyhow!(
                "refusing to store an unhashed password"
            )));
        }
        Ok(())
    }
}

/// The public view of a user; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.meta.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.meta.created_at,
        }
    }
}
