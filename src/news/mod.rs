//! News query functions.
//!
//! Both functions stop network failures at this boundary: callers get a
//! [`QueryOutcome`] with `status == false` and empty data, never an error.

use std::sync::Arc;

use url::Url;

use crate::app::NetworkError;
use crate::domain::{Article, Category};
use crate::fetcher::ApiClient;
use crate::normalizer::Normalizer;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_PAGE: u32 = 1;

const TOP_HEADLINES_PATH: &str = "/top-headlines";
const EVERYTHING_PATH: &str = "/everything";

/// Result of a query function: a success flag plus data that is empty on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<T> {
    pub status: bool,
    pub data: T,
}

impl<T> QueryOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self { status: true, data }
    }
}

impl<T: Default> QueryOutcome<T> {
    pub fn failed() -> Self {
        Self {
            status: false,
            data: T::default(),
        }
    }
}

pub struct NewsService {
    client: Arc<dyn ApiClient + Send + Sync>,
    normalizer: Normalizer,
    language: String,
}

impl NewsService {
    pub fn new(client: Arc<dyn ApiClient + Send + Sync>) -> Self {
        Self::with_language(client, "en")
    }

    pub fn with_language(client: Arc<dyn ApiClient + Send + Sync>, language: impl Into<String>) -> Self {
        Self {
            client,
            normalizer: Normalizer::new(),
            language: language.into(),
        }
    }

    /// Current top headlines for `category`.
    pub async fn top_headlines(
        &self,
        category: Category,
        page_size: u32,
        page: u32,
    ) -> QueryOutcome<Vec<Article>> {
        match self.fetch_headlines(category, page_size, page).await {
            Ok(articles) => {
                tracing::info!(%category, page, count = articles.len(), "fetched headlines");
                QueryOutcome::ok(articles)
            }
            Err(err) => {
                tracing::warn!(%category, page, error = %err, "failed to fetch headlines");
                QueryOutcome::failed()
            }
        }
    }

    async fn fetch_headlines(
        &self,
        category: Category,
        page_size: u32,
        page: u32,
    ) -> Result<Vec<Article>, NetworkError> {
        let query = [
            ("category", category.to_string()),
            ("pageSize", page_size.to_string()),
            ("page", page.to_string()),
        ];
        let body = self.client.get(TOP_HEADLINES_PATH, &query).await?;
        self.normalizer.normalize_all(body, Some(category))
    }

    /// Best-effort lookup of a single article.
    ///
    /// The API has no fetch-by-id endpoint, so this is a title search. A
    /// returned article is probably, not certainly, the one asked for.
    pub async fn article_by_id(&self, id: &str) -> QueryOutcome<Option<Article>> {
        match self.search_article(id).await {
            Ok(Some(article)) => QueryOutcome::ok(Some(article)),
            Ok(None) => {
                tracing::debug!(id, "no search result for article");
                QueryOutcome::failed()
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to look up article");
                QueryOutcome::failed()
            }
        }
    }

    async fn search_article(&self, id: &str) -> Result<Option<Article>, NetworkError> {
        let id_url = parse_http_url(id);
        let terms = match &id_url {
            Some(url) => keyword_from_url(url),
            None => id.to_string(),
        };

        let query = [
            ("qInTitle", terms),
            ("pageSize", "1".to_string()),
            ("language", self.language.clone()),
        ];
        let body = self.client.get(EVERYTHING_PATH, &query).await?;
        let mut results = self.normalizer.normalize_all(body, None)?;
        if results.is_empty() {
            return Ok(None);
        }

        let index = results.iter().position(|a| a.url == id).unwrap_or(0);
        let mut article = results.swap_remove(index);
        article.id = if id_url.is_some() || article.url.is_empty() {
            id.to_string()
        } else {
            article.url.clone()
        };
        Ok(Some(article))
    }
}

fn parse_http_url(id: &str) -> Option<Url> {
    Url::parse(id)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Search keywords from the last path segment of an article URL.
///
/// `https://example.com/news/rates-rise-again.html` becomes `rates rise again`.
pub fn keyword_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    let stem = match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => stem,
        _ => segment,
    };

    let keywords = stem
        .split(['-', '_', '+'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if keywords.is_empty() {
        url.host_str().unwrap_or_default().to_string()
    } else {
        keywords
    }
}
