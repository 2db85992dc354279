use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::Category;

const FALLBACK_ID_PREFIX: &str = "article-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A news article as held by the stores and persisted in favorites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_to_image: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Article {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            url: String::new(),
            url_to_image: String::new(),
            published_at: String::new(),
            content: None,
            source: Source::default(),
            category: None,
            author: None,
        }
    }

    /// Deterministic id for articles the API returns without a url.
    pub fn generate_fallback_id(title: &str, source_name: &str, published_at: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"|");
        hasher.update(source_name.as_bytes());
        hasher.update(b"|");
        hasher.update(published_at.as_bytes());
        format!("{}{}", FALLBACK_ID_PREFIX, hex::encode(hasher.finalize()))
    }

    pub fn has_fallback_id(&self) -> bool {
        self.id.starts_with(FALLBACK_ID_PREFIX)
    }

    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Get the best available body text for display
    pub fn display_content(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.description)
    }
}
