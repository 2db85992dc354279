use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::app::Result;
use crate::config::CacheConfig;
use crate::domain::{Article, Category};
use crate::news::{NewsService, QueryOutcome, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::query::{QueryCache, QueryKey};
use crate::state::{ArticleStore, StoreEvent};

/// Cached news queries.
///
/// Successful results feed the [`ArticleStore`] session cache; single
/// articles are looked up in the store before going to the network.
pub struct NewsQueries {
    news: Arc<NewsService>,
    store: Arc<ArticleStore>,
    headlines: QueryCache<Vec<Article>>,
    articles: QueryCache<Option<Article>>,
    favorites: QueryCache<Vec<Article>>,
    article_retries: u32,
}

impl NewsQueries {
    pub fn new(news: Arc<NewsService>, store: Arc<ArticleStore>, config: &CacheConfig) -> Self {
        Self {
            news,
            store,
            headlines: QueryCache::new(config.headlines_stale()),
            articles: QueryCache::new(config.article_stale()),
            favorites: QueryCache::new(config.favorites_stale()),
            article_retries: config.article_retries,
        }
    }

    pub async fn top_headlines(&self, category: Category, page_size: u32, page: u32) -> QueryOutcome<Vec<Article>> {
        let category = category.request_category();
        let key = QueryKey::TopHeadlines {
            category,
            page_size,
            page,
        };
        let news = self.news.clone();
        let outcome = self
            .headlines
            .fetch(key, async move { news.top_headlines(category, page_size, page).await })
            .await;

        if outcome.status {
            self.store.cache_articles(outcome.data.iter().cloned());
        }
        outcome
    }

    /// Headlines for the category currently selected in the store.
    pub async fn selected_headlines(&self) -> QueryOutcome<Vec<Article>> {
        self.top_headlines(self.store.selected_category(), DEFAULT_PAGE_SIZE, DEFAULT_PAGE)
            .await
    }

    pub async fn article(&self, id: &str) -> QueryOutcome<Option<Article>> {
        let key = QueryKey::Article(id.to_string());
        let store = self.store.clone();
        let news = self.news.clone();
        let retries = self.article_retries;
        let id = id.to_string();

        let outcome = self
            .articles
            .fetch(key, async move {
                if let Some(local) = store.get_article_by_id(&id) {
                    return QueryOutcome::ok(Some(local));
                }
                let mut outcome = news.article_by_id(&id).await;
                for attempt in 1..=retries {
                    if outcome.status {
                        break;
                    }
                    tracing::debug!(id = %id, attempt, "retrying article lookup");
                    outcome = news.article_by_id(&id).await;
                }
                outcome
            })
            .await;

        if let (true, Some(article)) = (outcome.status, &outcome.data) {
            self.store.cache_article(article.clone());
        }
        outcome
    }

    /// All favorites, resolved through the store. Keyed by the favorite id
    /// list, so any favorites change produces a new key.
    pub async fn favorite_articles(&self) -> QueryOutcome<Vec<Article>> {
        let key = QueryKey::FavoriteArticles(self.store.favorite_article_ids());
        let store = self.store.clone();
        self.favorites
            .fetch(key, async move {
                QueryOutcome::ok(store.load_all_favorite_articles().await)
            })
            .await
    }

    /// Toggle a favorite and drop cached favorites lists.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let now_favorite = self.store.try_toggle_favorite(id).await?;
        self.favorites.invalidate_all();
        Ok(now_favorite)
    }

    pub async fn clear_favorites(&self) -> Result<()> {
        self.store.try_clear_favorites().await?;
        self.favorites.invalidate_all();
        Ok(())
    }

    pub fn invalidate_headlines(&self, category: Category) {
        let category = category.request_category();
        self.headlines.invalidate_where(|key| {
            matches!(key, QueryKey::TopHeadlines { category: c, .. } if *c == category)
        });
    }

    /// Re-fetch headlines whenever the store's selected category changes.
    pub fn spawn_category_listener(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::CategoryChanged(category)) => {
                        self.invalidate_headlines(category);
                        let outcome = self
                            .top_headlines(category, DEFAULT_PAGE_SIZE, DEFAULT_PAGE)
                            .await;
                        tracing::debug!(%category, status = outcome.status, "refetched headlines");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "category listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
