use serde::{Deserialize, Serialize};

use super::{max_len, require, tidy_opt, DocMeta, Entity};
use crate::error::Result;

fn default_site_name() -> String {
    "My Portfolio".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

/// Site-wide settings. There is at most one stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(flatten)]
    pub meta: DocMeta,
    #[serde(default = "default_site_name")]
    pub site_name: String,
    pub site_description: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub about_text: Option<String>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub maintenance_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            meta: DocMeta::default(),
            site_name: default_site_name(),
            site_description: None,
            contact_email: None,
            phone: None,
            address: None,
            hero_title: None,
            hero_subtitle: None,
            about_text: None,
            resume_url: None,
            social_links: SocialLinks::default(),
            maintenance_mode: false,
        }
    }
}

impl Entity for Settings {
    const COLLECTION: &'static str = "settings";
    const LABEL: &'static str = "Settings";
    const PLURAL: &'static str = "Settings";

    fn meta(&self) -> &DocMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DocMeta {
        &mut self.meta
    }

    fn prepare(&mut self) {
        self.site_name = self.site_name.trim().to_string();
        tidy_opt(&mut self.contact_email);
        let links = &mut self.social_links;
        for link in [
            &mut links.github,
            &mut links.linkedin,
            &mut links.twitter,
            &mut links.instagram,
        ] {
            tidy_opt(link);
        }
    }

    fn validate(&self) -> Result<()> {
        require("Site name", &self.site_name)?;
        max_len("Site name", &self.site_name, 100)?;
        Ok(())
    }
}
