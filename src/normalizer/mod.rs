use html_escape::decode_html_entities;
use serde::Deserialize;
use serde_json::Value;

use crate::app::NetworkError;
use crate::domain::{Article, Category, Source};

/// Article as returned by the news API. It carries no id of its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    articles: Vec<RawArticle>,
}

fn decode(text: Option<String>) -> String {
    text.map(|t| decode_html_entities(&t).to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Pull the `articles` array out of a response body.
    pub fn parse_articles(&self, body: Value) -> Result<Vec<RawArticle>, NetworkError> {
        serde_json::from_value::<ArticlesResponse>(body)
            .map(|response| response.articles)
            .map_err(|e| NetworkError::Parse(e.to_string()))
    }

    /// Map a raw article to an [`Article`], synthesizing its id.
    ///
    /// The id is the article url when present, otherwise a hash of title,
    /// source name and publication time.
    pub fn normalize(&self, raw: RawArticle, category: Option<Category>) -> Article {
        let source = raw.source.unwrap_or_default();
        let source = Source {
            id: source.id.unwrap_or_default(),
            name: source.name.unwrap_or_default(),
        };
        let title = decode(raw.title);
        let published_at = raw.published_at.unwrap_or_default();
        let url = raw.url.filter(|u| !u.trim().is_empty()).unwrap_or_default();

        let id = if url.is_empty() {
            Article::generate_fallback_id(&title, &source.name, &published_at)
        } else {
            url.clone()
        };

        Article {
            id,
            title,
            description: decode(raw.description),
            url,
            url_to_image: raw.url_to_image.unwrap_or_default(),
            published_at,
            content: raw.content.map(|c| decode_html_entities(&c).to_string()),
            source,
            category,
            author: raw.author,
        }
    }

    pub fn normalize_all(&self, body: Value, category: Option<Category>) -> Result<Vec<Article>, NetworkError> {
        Ok(self
            .parse_articles(body)?
            .into_iter()
            .map(|raw| self.normalize(raw, category))
            .collect())
    }
}
