use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use tokio::sync::{broadcast, Mutex};

use crate::app::{NewsdeskError, PersistenceError, Result};
use crate::domain::{Article, Category};
use crate::news::{NewsService, QueryOutcome, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::state::persisted;
use crate::store::{KvStore, FAVORITE_DATA_KEY, FAVORITE_IDS_KEY};

const EVENT_CAPACITY: usize = 64;

/// Change notifications emitted by [`ArticleStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ArticlesChanged,
    FavoritesChanged,
    CategoryChanged(Category),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub is_loading: bool,
    pub error: Option<String>,
}

enum FavoriteChange {
    Add(Article),
    Remove,
}

#[derive(Debug, Default)]
struct ArticleState {
    articles: Vec<Article>,
    favorite_ids: Vec<String>,
    favorite_data: HashMap<String, Article>,
    favorites_loaded: bool,
    selected_category: Category,
    status: StoreStatus,
}

impl ArticleState {
    fn is_favorite(&self, id: &str) -> bool {
        self.favorite_ids.iter().any(|f| f == id)
    }

    fn cached(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    fn find(&self, id: &str) -> Option<&Article> {
        self.cached(id).or_else(|| self.favorite_data.get(id))
    }

    /// Returns true when the article is a favorite and its data was refreshed.
    fn upsert(&mut self, article: Article) -> bool {
        let refreshed = self.is_favorite(&article.id);
        if refreshed {
            self.favorite_data.insert(article.id.clone(), article.clone());
        }
        match self.articles.iter_mut().find(|a| a.id == article.id) {
            Some(existing) => *existing = article,
            None => self.articles.push(article),
        }
        refreshed
    }

    /// Favorites as they would look after `change`, without touching `self`.
    fn preview(&self, id: &str, change: &FavoriteChange) -> (Vec<String>, HashMap<String, Article>) {
        let mut ids = self.favorite_ids.clone();
        let mut data = self.favorite_data.clone();
        match change {
            FavoriteChange::Add(article) => {
                ids.push(id.to_string());
                data.insert(id.to_string(), article.clone());
            }
            FavoriteChange::Remove => {
                ids.retain(|f| f != id);
                data.remove(id);
            }
        }
        (ids, data)
    }

    /// Apply `change` as a delta so concurrent cache refreshes survive.
    fn apply(&mut self, id: &str, change: FavoriteChange) {
        match change {
            FavoriteChange::Add(article) => {
                if !self.is_favorite(id) {
                    self.favorite_ids.push(id.to_string());
                }
                self.favorite_data.insert(id.to_string(), article);
            }
            FavoriteChange::Remove => {
                self.favorite_ids.retain(|f| f != id);
                self.favorite_data.remove(id);
            }
        }
    }
}

/// Session article cache plus the persisted favorites.
///
/// Reads are synchronous. Every write to the two favorites keys is
/// serialized by `persist_lock` and committed to memory only after storage
/// accepted it.
pub struct ArticleStore {
    state: RwLock<ArticleState>,
    persist_lock: Mutex<()>,
    kv: Arc<dyn KvStore>,
    news: Arc<NewsService>,
    events: broadcast::Sender<StoreEvent>,
}

impl ArticleStore {
    pub fn new(kv: Arc<dyn KvStore>, news: Arc<NewsService>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(ArticleState::default()),
            persist_lock: Mutex::new(()),
            kv,
            news,
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ArticleState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ArticleState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ----- reads -----

    pub fn articles(&self) -> Vec<Article> {
        self.read().articles.clone()
    }

    pub fn get_article_by_id(&self, id: &str) -> Option<Article> {
        self.read().find(id).cloned()
    }

    pub fn is_article_favorite(&self, id: &str) -> bool {
        self.read().is_favorite(id)
    }

    pub fn favorite_article_ids(&self) -> Vec<String> {
        self.read().favorite_ids.clone()
    }

    pub fn favorite_articles_data(&self) -> HashMap<String, Article> {
        self.read().favorite_data.clone()
    }

    /// Favorites resolvable right now, in favorite order.
    pub fn favorite_articles(&self) -> Vec<Article> {
        let state = self.read();
        state
            .favorite_ids
            .iter()
            .filter_map(|id| state.favorite_data.get(id).or_else(|| state.cached(id)))
            .cloned()
            .collect()
    }

    pub fn selected_category(&self) -> Category {
        self.read().selected_category
    }

    pub fn status(&self) -> StoreStatus {
        self.read().status.clone()
    }

    // ----- session cache -----

    /// Upsert into the session cache. A favorite's data is refreshed in
    /// memory too, but that refresh is not persisted.
    pub fn cache_article(&self, article: Article) {
        self.cache_articles(std::iter::once(article));
    }

    pub fn cache_articles(&self, articles: impl IntoIterator<Item = Article>) {
        let mut changed = false;
        let mut favorites_refreshed = false;
        {
            let mut state = self.write();
            for article in articles {
                if article.id.is_empty() {
                    tracing::debug!("ignoring article without id");
                    continue;
                }
                favorites_refreshed |= state.upsert(article);
                changed = true;
            }
        }
        if changed {
            self.notify(StoreEvent::ArticlesChanged);
        }
        if favorites_refreshed {
            self.notify(StoreEvent::FavoritesChanged);
        }
    }

    pub fn set_selected_category(&self, category: Category) {
        {
            let mut state = self.write();
            if state.selected_category == category {
                return;
            }
            state.selected_category = category;
        }
        tracing::debug!(%category, "selected category changed");
        self.notify(StoreEvent::CategoryChanged(category));
    }

    /// Fetch headlines for the selected category into the session cache.
    pub async fn fetch_articles(&self) -> QueryOutcome<Vec<Article>> {
        let category = {
            let mut state = self.write();
            state.status = StoreStatus {
                is_loading: true,
                error: None,
            };
            state.selected_category
        };

        let outcome = self
            .news
            .top_headlines(category.request_category(), DEFAULT_PAGE_SIZE, DEFAULT_PAGE)
            .await;

        if outcome.status {
            self.cache_articles(outcome.data.iter().cloned());
        }
        self.write().status = StoreStatus {
            is_loading: false,
            error: (!outcome.status).then(|| "Failed to fetch articles".to_string()),
        };
        outcome
    }

    // ----- favorites -----

    /// Read both favorites keys. Missing or corrupt data in either one
    /// leaves both collections empty.
    ///
    /// If storage cannot be read at all, the collections are empty too but
    /// not marked loaded, so the next mutation reads again instead of
    /// overwriting what is on disk.
    pub async fn load_favorites(&self) {
        let _guard = self.persist_lock.lock().await;
        // Already logged; mutations retry the read
        let _ = self.load_favorites_locked().await;
    }

    async fn load_favorites_locked(&self) -> Result<()> {
        let (ids, data, loaded, result) = match self.read_persisted_favorites().await {
            Ok((ids, data)) => (ids, data, true, Ok(())),
            Err(err) => {
                tracing::warn!(error = %err, "favorites storage unreadable, starting empty");
                (Vec::new(), HashMap::new(), false, Err(err))
            }
        };

        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        let data: HashMap<String, Article> = data
            .into_iter()
            .filter(|(id, _)| unique.contains(id))
            .collect();

        if loaded {
            tracing::info!(favorites = unique.len(), with_data = data.len(), "loaded favorites");
        }
        {
            let mut state = self.write();
            state.favorite_ids = unique;
            state.favorite_data = data;
            state.favorites_loaded = loaded;
        }
        self.notify(StoreEvent::FavoritesChanged);
        result
    }

    /// Decoded favorites. Only a failed storage read is an error; absent,
    /// half-present or corrupt keys decode to empty collections.
    async fn read_persisted_favorites(&self) -> Result<(Vec<String>, HashMap<String, Article>)> {
        let ids = self.kv.get(FAVORITE_IDS_KEY).await?;
        let data = self.kv.get(FAVORITE_DATA_KEY).await?;

        let decoded = match (ids, data) {
            (None, None) => None,
            (Some(ids), Some(data)) => {
                match (persisted::decode_ids(&ids), persisted::decode_data(&data)) {
                    (Ok(ids), Ok(data)) => Some((ids, data)),
                    (Err(err), _) | (_, Err(err)) => {
                        tracing::warn!(error = %err, "corrupt favorites, starting empty");
                        None
                    }
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("only one favorites key present, starting empty");
                None
            }
        };
        Ok(decoded.unwrap_or_default())
    }

    async fn ensure_favorites_loaded(&self) -> Result<()> {
        let loaded = self.read().favorites_loaded;
        if loaded {
            return Ok(());
        }
        self.load_favorites_locked().await
    }

    async fn persist_favorites(&self, ids: &[String], data: &HashMap<String, Article>) -> Result<()> {
        let entries = [
            (FAVORITE_IDS_KEY, persisted::encode_ids(ids).map_err(PersistenceError::from)?),
            (FAVORITE_DATA_KEY, persisted::encode_data(data).map_err(PersistenceError::from)?),
        ];
        self.kv.set_many(&entries).await?;
        Ok(())
    }

    /// Flip favorite membership of `id`. Returns whether it is now a favorite.
    ///
    /// Fails with `NotFound` when the article was never seen and is not a
    /// favorite, and with a persistence error when saved favorites cannot be
    /// read. On any failure memory is left untouched.
    pub async fn try_toggle_favorite(&self, id: &str) -> Result<bool> {
        let _guard = self.persist_lock.lock().await;
        self.ensure_favorites_loaded().await?;

        let (change, ids, data) = {
            let state = self.read();
            let change = if state.is_favorite(id) {
                FavoriteChange::Remove
            } else {
                match state.find(id) {
                    Some(article) => FavoriteChange::Add(article.clone()),
                    None => return Err(NewsdeskError::NotFound(id.to_string())),
                }
            };
            let (ids, data) = state.preview(id, &change);
            (change, ids, data)
        };

        self.persist_favorites(&ids, &data).await?;

        let now_favorite = matches!(change, FavoriteChange::Add(_));
        self.write().apply(id, change);
        tracing::debug!(id, now_favorite, "favorite toggled");
        self.notify(StoreEvent::FavoritesChanged);
        Ok(now_favorite)
    }

    /// [`try_toggle_favorite`](Self::try_toggle_favorite) reduced to a success flag.
    pub async fn toggle_favorite(&self, id: &str) -> bool {
        match self.try_toggle_favorite(id).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to toggle favorite");
                false
            }
        }
    }

    /// Resolve every favorite to a full article.
    ///
    /// Ids missing from the favorites data are taken from the session cache
    /// or looked up over the network, concurrently. Lookups that fail are
    /// dropped. The data map is persisted only if it grew.
    pub async fn load_all_favorite_articles(&self) -> Vec<Article> {
        {
            let _guard = self.persist_lock.lock().await;
            if let Err(err) = self.ensure_favorites_loaded().await {
                self.set_loading(false, Some(format!("Failed to load favorite articles: {err}")));
                return Vec::new();
            }
        }

        let (has_favorites, mut resolved, missing) = {
            let state = self.read();
            let mut resolved = state.favorite_data.clone();
            let mut missing = Vec::new();
            for id in &state.favorite_ids {
                if resolved.contains_key(id) {
                    continue;
                }
                match state.cached(id) {
                    Some(article) => {
                        resolved.insert(id.clone(), article.clone());
                    }
                    None => missing.push(id.clone()),
                }
            }
            (!state.favorite_ids.is_empty(), resolved, missing)
        };

        if !has_favorites {
            return Vec::new();
        }

        if !missing.is_empty() {
            self.set_loading(true, None);
            tracing::info!(count = missing.len(), "fetching missing favorite articles");
        }

        let lookups = missing.iter().map(|id| async move {
            let outcome = self.news.article_by_id(id).await;
            (id.clone(), outcome)
        });
        for (id, outcome) in join_all(lookups).await {
            match outcome.data {
                Some(mut article) if outcome.status => {
                    // Keep the favorite id even if the search resolved another url
                    article.id = id.clone();
                    resolved.insert(id, article);
                }
                _ => tracing::debug!(id = %id, "dropping unresolved favorite"),
            }
        }

        let error = self.merge_favorite_data(&resolved).await.err();
        if !missing.is_empty() || error.is_some() {
            self.set_loading(false, error.map(|e| format!("Failed to load favorite articles: {e}")));
        }

        // Favorites may have changed while the lookups ran
        let state = self.read();
        let articles = state
            .favorite_ids
            .iter()
            .filter_map(|id| resolved.get(id).or_else(|| state.favorite_data.get(id)))
            .cloned()
            .collect();
        articles
    }

    /// Add entries of `resolved` that are still favorites and not yet in the
    /// data map, persisting the map if it grew.
    async fn merge_favorite_data(&self, resolved: &HashMap<String, Article>) -> Result<()> {
        let _guard = self.persist_lock.lock().await;

        let (additions, data) = {
            let state = self.read();
            let additions: Vec<(String, Article)> = resolved
                .iter()
                .filter(|(id, _)| state.is_favorite(id) && !state.favorite_data.contains_key(*id))
                .map(|(id, a)| (id.clone(), a.clone()))
                .collect();
            if additions.is_empty() {
                return Ok(());
            }
            let mut data = state.favorite_data.clone();
            data.extend(additions.iter().cloned());
            (additions, data)
        };

        let encoded = persisted::encode_data(&data).map_err(PersistenceError::from)?;
        self.kv.set(FAVORITE_DATA_KEY, &encoded).await?;

        {
            let mut state = self.write();
            for (id, article) in additions {
                state.favorite_data.entry(id).or_insert(article);
            }
        }
        self.notify(StoreEvent::FavoritesChanged);
        Ok(())
    }

    fn set_loading(&self, is_loading: bool, error: Option<String>) {
        self.write().status = StoreStatus { is_loading, error };
    }

    /// Remove all favorites. On failure memory is left untouched.
    pub async fn try_clear_favorites(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        self.ensure_favorites_loaded().await?;
        self.kv
            .remove_many(&[FAVORITE_IDS_KEY, FAVORITE_DATA_KEY])
            .await?;

        {
            let mut state = self.write();
            state.favorite_ids.clear();
            state.favorite_data.clear();
            state.favorites_loaded = true;
        }
        tracing::info!("cleared favorites");
        self.notify(StoreEvent::FavoritesChanged);
        Ok(())
    }

    pub async fn clear_favorites(&self) -> bool {
        match self.try_clear_favorites().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to clear favorites");
                false
            }
        }
    }
}
