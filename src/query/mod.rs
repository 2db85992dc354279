//! Key-based query caching.
//!
//! - [`QueryCache`]: fresh-hit serving, in-flight de-duplication, invalidation
//! - [`NewsQueries`](news::NewsQueries): the news queries wired to the article store

pub mod news;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::domain::Category;
use crate::news::QueryOutcome;

pub use news::NewsQueries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TopHeadlines {
        category: Category,
        page_size: u32,
        page: u32,
    },
    Article(String),
    FavoriteArticles(Vec<String>),
}

struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

type InFlight<T> = Shared<BoxFuture<'static, QueryOutcome<T>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Successful query results, served without re-fetching while younger than
/// the staleness window. Failed outcomes are never cached.
pub struct QueryCache<T> {
    stale_time: Duration,
    entries: Mutex<HashMap<QueryKey, CacheEntry<T>>>,
    in_flight: Mutex<HashMap<QueryKey, InFlight<T>>>,
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub fn get_fresh(&self, key: &QueryKey) -> Option<T> {
        lock(&self.entries)
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_time)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: QueryKey, value: T) {
        lock(&self.entries).insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &QueryKey) {
        lock(&self.entries).remove(key);
    }

    pub fn invalidate_where(&self, mut predicate: impl FnMut(&QueryKey) -> bool) {
        lock(&self.entries).retain(|key, _| !predicate(key));
    }

    pub fn invalidate_all(&self) {
        lock(&self.entries).clear();
    }

    /// Serve `key` from cache, or run `fetcher`.
    ///
    /// Callers asking for a key that is already being fetched share the
    /// running request; their own `fetcher` is dropped unpolled.
    pub async fn fetch<F>(&self, key: QueryKey, fetcher: F) -> QueryOutcome<T>
    where
        F: Future<Output = QueryOutcome<T>> + Send + 'static,
    {
        if let Some(value) = self.get_fresh(&key) {
            tracing::debug!(?key, "query cache hit");
            return QueryOutcome::ok(value);
        }

        let shared = lock(&self.in_flight)
            .entry(key.clone())
            .or_insert_with(|| fetcher.boxed().shared())
            .clone();

        let outcome = shared.clone().await;

        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.get(&key).is_some_and(|f| f.ptr_eq(&shared)) {
                in_flight.remove(&key);
            }
        }

        if outcome.status {
            self.set(key, outcome.data.clone());
        }
        outcome
    }
}
