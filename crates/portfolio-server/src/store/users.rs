//! Account storage. Passwords are hashed before they reach the store.

use std::sync::Arc;

use tracing::info;

use super::{DocumentStore, Filter, Repository};
use crate::auth::hash_password;
use crate::error::{Error, Result};
use crate::models::{normalize_email, DocMeta, Role, User};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UserStore {
    repo: Repository<User>,
    cost: u32,
}

impl UserStore {
    pub fn new(store: Arc<dyn DocumentStore>, cost: u32) -> Self {
        Self {
            repo: Repository::new(store),
            cost,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.repo
            .find_one(&Filter::all().eq("email", normalize_email(email)))
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        self.repo.get_by_id(id).await
    }

    /// Create an account, hashing `password` first
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        check_password(password)?;
        if self.find_by_email(email).await?.is_some() {
            return Err(Error::validation("User with this email already exists"));
        }

        let user = User {
            meta: DocMeta::default(),
            name: name.to_string(),
            email: email.to_string(),
            password: hash_password(password, self.cost)?,
            role,
        };
        let user = self.repo.create(user).await?;
        info!("Created {} account {}", user.role.as_str(), user.email);
        Ok(user)
    }

    /// Store a new hash for `id`. `None` when the user is gone.
    pub async fn set_password(&self, id: &str, new_password: &str) -> Result<Option<User>> {
        check_password(new_password)?;
        let Some(mut user) = self.repo.get_by_id(id).await? else {
            return Ok(None);
        };
        user.password = hash_password(new_password, self.cost)?;
        self.repo.save(&user).await
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
