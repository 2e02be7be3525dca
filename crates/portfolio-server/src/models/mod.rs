//! Document schemas
//!
//! Each entity is a flat document with its own required fields, defaults
//! and limits. Shared bookkeeping (`_id`, timestamps) lives in [`DocMeta`].

pub mod content;
pub mod inbox;
pub mod settings;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Error, Result};

pub use content::{Experience, MediaItem, MediaType, Post, Project, Service};
pub use inbox::{Contact, Subscriber};
pub use settings::{Settings, SocialLinks};
pub use user::{Role, User, UserInfo};

/// Fields every stored document carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A typed document stored in one collection
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Singular name used in messages, e.g. "Post"
    const LABEL: &'static str;
    /// Plural name used in messages, e.g. "Posts"
    const PLURAL: &'static str;
    /// Body fields that create and full update requests must supply
    const REQUIRED: &'static [&'static str] = &[];
    /// Fields whose values must not repeat within the collection
    const UNIQUE: &'static [&'static str] = &[];
    /// Boolean field that list requests may filter on
    const LIST_FLAG: Option<&'static str> = None;
    /// Whether non-id lookup keys are matched against `slug`
    const HAS_SLUG: bool = false;

    fn meta(&self) -> &DocMeta;
    fn meta_mut(&mut self) -> &mut DocMeta;

    /// Pre-save hook: derive and normalize fields before validation
    fn prepare(&mut self) {}

    fn validate(&self) -> Result<()>;

    /// List order; newest first unless overridden
    fn sort(items: &mut [Self]) {
        items.sort_by(|a, b| b.meta().created_at.cmp(&a.meta().created_at));
    }
}

/// Sort by an explicit `order` ascending, newest first on ties
pub(crate) fn sort_by_order<T: Entity>(items: &mut [T], order: impl Fn(&T) -> i32) {
    items.sort_by(|a, b| {
        order(a)
            .cmp(&order(b))
            .then_with(|| b.meta().created_at.cmp(&a.meta().created_at))
    });
}

pub(crate) fn require(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", label)));
    }
    Ok(())
}

pub(crate) fn max_len(label: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(format!(
            "{} cannot exceed {} characters",
            label, max
        )));
    }
    Ok(())
}

pub(crate) fn max_len_opt(label: &str, value: &Option<String>, max: usize) -> Result<()> {
    match value {
        Some(v) => max_len(label, v, max),
        None => Ok(()),
    }
}

pub(crate) fn check_email(label: &str, value: &str) -> Result<()> {
    if !is_valid_email(value) {
        return Err(Error::validation(format!(
            "{} must be a valid email address",
            label
        )));
    }
    Ok(())
}

/// Loose `local@domain.tld` check
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Lowercase, ASCII alphanumerics separated by single hyphens
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Trim entries and drop empty ones
pub(crate) fn tidy_list(items: &mut Vec<String>) {
    for item in items.iter_mut() {
        *item = item.trim().to_string();
    }
    items.retain(|s| !s.is_empty());
}

/// Turn blank optional strings into `None`
pub(crate) fn tidy_opt(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}
