//! Inbound messages and newsletter subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_email, max_len, max_len_opt, normalize_email, require, tidy_opt, DocMeta, Entity};
use crate::error::Result;

fn default_true() -> bool {
    true
}

/// A message sent through the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
}

impl Entity for Contact {
    const COLLECTION: &'static str = "contacts";
    const LABEL: &'static str = "Contact";
    const PLURAL: &'static str = "Contacts";
    const REQUIRED: &'static [&'static str] = &["name", "email", "message"];

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        tidy_opt(&mut self.phone);
        tidy_opt(&mut self.subject);
    }

    fn validate(&self) -> Result<()> {
        require("Name", &self.name)?;
        max_len("Name", &self.name, 100)?;
        require("Email", &self.email)?;
        check_email("Email", &self.email)?;
        max_len_opt("Subject", &self.subject, 200)?;
        require("Message", &self.message)?;
        max_len("Message", &self.message, 5000)?;
        Ok(())
    }
}

/// A newsletter subscription. Unsubscribing flips `active`; the record stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn new(email: &str, name: Option<String>) -> Self {
        Self {
            meta: DocMeta::default(),
            email: email.to_string(),
            name,
            active: true,
            subscribed_at: Some(Utc::now()),
            unsubscribed_at: None,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.subscribed_at = Some(Utc::now());
        self.unsubscribed_at = None;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.unsubscribed_at = Some(Utc::now());
    }
}

impl Entity for Subscriber {
    const COLLECTION: &'static str = "subscribers";
    const LABEL: &'static str = "Subscriber";
    const PLURAL: &'static str = "Subscribers";
    const REQUIRED: &'static [&'static str] = &["email"];
    const UNIQUE: &'static [&'static str] = &["email"];
    const LIST_FLAG: Option<&'static str> = Some("active");

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.email = normalize_email(&self.email);
        tidy_opt(&mut self.name);
        if self.active {
            self.subscribed_at.get_or_insert_with(Utc::now);
            self.unsubscribed_at = None;
        } else {
            self.unsubscribed_at.get_or_insert_with(Utc::now);
        }
    }

    fn validate(&self) -> Result<()> {
        require("Email", &self.email)?;
        check_email("Email", &self.email)?;
        max_len_opt("Name", &self.name, 100)?;
        Ok(())
    }
}
