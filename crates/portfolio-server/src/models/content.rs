//! Public site content: posts, services, media, projects, experience

use serde::{Deserialize, Serialize};

use super::{
    max_len, max_len_opt, require, slugify, sort_by_order, tidy_list, tidy_opt, DocMeta, Entity,
};
use crate::error::{Error, Result};

fn default_true() -> bool {
    true
}

fn default_author() -> String {
    "Admin".to_string()
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub title: String,
    /// Derived from the title when left empty
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default = "default_author")]
    pub author: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub published: bool,
}

impl Entity for Post {
    const COLLECTION: &'static str = "posts";
    const LABEL: &'static str = "Post";
    const PLURAL: &'static str = "Posts";
    const REQUIRED: &'static [&'static str] = &["title", "content"];
    const UNIQUE: &'static [&'static str] = &["slug"];
    const LIST_FLAG: Option<&'static str> = Some("featured");
    const HAS_SLUG: bool = true;

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        self.slug = if self.slug.trim().is_empty() {
            slugify(&self.title)
        } else {
            slugify(&self.slug)
        };
        if self.author.trim().is_empty() {
            self.author = default_author();
        }
        tidy_opt(&mut self.excerpt);
        tidy_opt(&mut self.cover_image);
        tidy_list(&mut self.tags);
    }

    fn validate(&self) -> Result<()> {
        require("Title", &self.title)?;
        max_len("Title", &self.title, 200)?;
        require("Content", &self.content)?;
        require("Slug", &self.slug)?;
        max_len_opt("Excerpt", &self.excerpt, 500)?;
        max_len("Author", &self.author, 100)?;
        Ok(())
    }
}

/// A service offered on the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Entity for Service {
    const COLLECTION: &'static str = "services";
    const LABEL: &'static str = "Service";
    const PLURAL: &'static str = "Services";
    const REQUIRED: &'static [&'static str] = &["title", "description"];
    const LIST_FLAG: Option<&'static str> = Some("active");

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        tidy_opt(&mut self.icon);
        tidy_opt(&mut self.price);
        tidy_list(&mut self.features);
    }

    fn validate(&self) -> Result<()> {
        require("Title", &self.title)?;
        max_len("Title", &self.title, 100)?;
        require("Description", &self.description)?;
        max_len("Description", &self.description, 1000)?;
        Ok(())
    }

    fn sort(items: &mut [Self]) {
        sort_by_order(items, |s| s.order);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    Document,
}

/// An already-hosted image, video or document shown in the gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub media_type: MediaType,
    pub description: Option<String>,
    pub alt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Entity for MediaItem {
    const COLLECTION: &'static str = "media";
    const LABEL: &'static str = "Media item";
    const PLURAL: &'static str = "Media items";
    const REQUIRED: &'static [&'static str] = &["title", "url"];
    const LIST_FLAG: Option<&'static str> = Some("featured");

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        self.url = self.url.trim().to_string();
        tidy_opt(&mut self.description);
        tidy_opt(&mut self.alt);
        tidy_list(&mut self.tags);
    }

    fn validate(&self) -> Result<()> {
        require("Title", &self.title)?;
        max_len("Title", &self.title, 200)?;
        require("URL", &self.url)?;
        if !(self.url.starts_with("http://") || self.url.starts_with("https://") || self.url.starts_with('/')) {
            return Err(Error::validation("URL must be absolute or site-relative"));
        }
        max_len_opt("Description", &self.description, 1000)?;
        Ok(())
    }
}

/// A portfolio project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub content: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: i32,
}

impl Entity for Project {
    const COLLECTION: &'static str = "projects";
    const LABEL: &'static str = "Project";
    const PLURAL: &'static str = "Projects";
    const REQUIRED: &'static [&'static str] = &["title", "description"];
    const UNIQUE: &'static [&'static str] = &["slug"];
    const LIST_FLAG: Option<&'static str> = Some("featured");
    const HAS_SLUG: bool = true;

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.title = self.title.trim().to_string();
        self.slug = if self.slug.trim().is_empty() {
            slugify(&self.title)
        } else {
            slugify(&self.slug)
        };
        tidy_opt(&mut self.content);
        tidy_opt(&mut self.image);
        tidy_opt(&mut self.live_url);
        tidy_opt(&mut self.github_url);
        tidy_list(&mut self.technologies);
    }

    fn validate(&self) -> Result<()> {
        require("Title", &self.title)?;
        max_len("Title", &self.title, 200)?;
        require("Slug", &self.slug)?;
        require("Description", &self.description)?;
        max_len("Description", &self.description, 2000)?;
        Ok(())
    }

    fn sort(items: &mut [Self]) {
        sort_by_order(items, |p| p.order);
    }
}

/// A position on the experience timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    pub location: Option<String>,
    /// Free text such as `2021-03`
    #[serde(default)]
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub order: i32,
}

impl Entity for Experience {
    const COLLECTION: &'static str = "experiences";
    const LABEL: &'static str = "Experience";
    const PLURAL: &'static str = "Experiences";
    const REQUIRED: &'static [&'static str] = &["company", "position", "startDate"];

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.company = self.company.trim().to_string();
        self.position = self.position.trim().to_string();
        self.start_date = self.start_date.trim().to_string();
        tidy_opt(&mut self.location);
        tidy_opt(&mut self.end_date);
        tidy_opt(&mut self.description);
        tidy_list(&mut self.achievements);
        // A current role has no end date
        if self.current {
            self.end_date = None;
        }
    }

    fn validate(&self) -> Result<()> {
        require("Company", &self.company)?;
        max_len("Company", &self.company, 100)?;
        require("Position", &self.position)?;
        max_len("Position", &self.position, 100)?;
        require("Start date", &self.start_date)?;
        Ok(())
    }

    fn sort(items: &mut [Self]) {
        sort_by_order(items, |e| e.order);
    }
}
