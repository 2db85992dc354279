use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{ApiClient, HttpApiClient};
use crate::news::NewsService;
use crate::query::NewsQueries;
use crate::state::{ArticleStore, SettingsStore};
use crate::store::{KvStore, MemoryKvStore, SqliteKvStore};

/// Application state handed to the presentation layer.
///
/// Lifecycle: construct with [`create`](Self::create) (or one of the
/// variants), call [`load`](Self::load) once inside the runtime, and
/// [`dispose`](Self::dispose) when done. Stores are readable before `load`
/// completes and report defaults until then.
pub struct AppContext {
    pub config: Config,
    pub kv: Arc<dyn KvStore>,
    pub settings: Arc<SettingsStore>,
    pub news: Arc<NewsService>,
    pub articles: Arc<ArticleStore>,
    pub queries: Arc<NewsQueries>,
    category_listener: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Open the SQLite database named by the config and talk to the real API.
    pub fn create(config: Config) -> Result<Self> {
        let db_path = config.database_path()?;
        tracing::debug!(path = %db_path.display(), "opening database");
        let kv: Arc<dyn KvStore> = Arc::new(SqliteKvStore::new(&db_path)?);
        Self::with_store(config, kv)
    }

    /// Keep everything in memory for this process only.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryKvStore::new()))
    }

    pub fn with_store(config: Config, kv: Arc<dyn KvStore>) -> Result<Self> {
        let settings = Arc::new(SettingsStore::new(kv.clone()));
        let client: Arc<dyn ApiClient + Send + Sync> =
            Arc::new(HttpApiClient::new(&config.api, settings.subscribe())?);
        Ok(Self::assemble(config, kv, settings, client))
    }

    /// Use a caller-provided API client. Offline gating is then up to that client.
    pub fn with_client(
        config: Config,
        kv: Arc<dyn KvStore>,
        client: Arc<dyn ApiClient + Send + Sync>,
    ) -> Self {
        let settings = Arc::new(SettingsStore::new(kv.clone()));
        Self::assemble(config, kv, settings, client)
    }

    fn assemble(
        config: Config,
        kv: Arc<dyn KvStore>,
        settings: Arc<SettingsStore>,
        client: Arc<dyn ApiClient + Send + Sync>,
    ) -> Self {
        let news = Arc::new(NewsService::with_language(client, config.api.language.clone()));
        let articles = Arc::new(ArticleStore::new(kv.clone(), news.clone()));
        let queries = Arc::new(NewsQueries::new(news.clone(), articles.clone(), &config.cache));

        Self {
            config,
            kv,
            settings,
            news,
            articles,
            queries,
            category_listener: Mutex::new(None),
        }
    }

    /// Load persisted settings and favorites.
    pub async fn load(&self) {
        tokio::join!(self.settings.load(), self.articles.load_favorites());
    }

    /// Re-fetch headlines whenever the selected category changes. Long-lived
    /// front ends call this once after [`load`](Self::load); repeated calls
    /// keep the first listener.
    pub fn watch_categories(&self) {
        let mut listener = self
            .category_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if listener.is_none() {
            *listener = Some(self.queries.clone().spawn_category_listener());
        }
    }

    /// Stop background work. In-flight requests that finish later only
    /// upsert into the stores.
    pub fn dispose(&self) {
        let handle = self
            .category_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("category listener stopped");
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.dispose();
    }
}
