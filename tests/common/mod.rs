//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use newsdesk::app::{NetworkError, PersistenceError};
use newsdesk::fetcher::{ApiClient, QueryParams};
use newsdesk::news::NewsService;
use newsdesk::state::ArticleStore;
use newsdesk::store::{KvResult, KvStore, MemoryKvStore};

type Handler = dyn Fn(&str, &[(String, String)]) -> Result<Value, NetworkError> + Send + Sync;

/// A recorded API request.
#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-process API client answering through a handler closure.
pub struct FakeApi {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new(
        handler: impl Fn(&str, &[(String, String)]) -> Result<Value, NetworkError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every request answers with `body`.
    pub fn returning(body: Value) -> Arc<Self> {
        Self::new(move |_, _| Ok(body.clone()))
    }

    /// Every request fails with `err`.
    pub fn failing(err: NetworkError) -> Arc<Self> {
        Self::new(move |_, _| Err(err.clone()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn get(&self, path: &str, query: &QueryParams<'_>) -> Result<Value, NetworkError> {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let response = (self.handler)(path, &query);
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            query,
        });
        response
    }
}

/// API client that holds every request until [`release`](Self::release).
pub struct GatedApi {
    body: Value,
    gate: Semaphore,
    requests: AtomicUsize,
}

impl GatedApi {
    pub fn new(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body,
            gate: Semaphore::new(0),
            requests: AtomicUsize::new(0),
        })
    }

    /// Requests received so far, including held ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }
}

#[async_trait]
impl ApiClient for GatedApi {
    async fn get(&self, _path: &str, _query: &QueryParams<'_>) -> Result<Value, NetworkError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Ok(self.body.clone())
    }
}

/// Memory store whose writes can be made to fail per key.
#[derive(Default)]
pub struct FlakyKv {
    pub inner: MemoryKvStore,
    fail_set: Mutex<HashSet<String>>,
    fail_remove: Mutex<HashSet<String>>,
    fail_get: Mutex<bool>,
}

impl FlakyKv {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_set_on(&self, key: &str) {
        self.fail_set.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_remove_on(&self, key: &str) {
        self.fail_remove.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_reads(&self, fail: bool) {
        *self.fail_get.lock().unwrap() = fail;
    }

    pub fn heal(&self) {
        self.fail_set.lock().unwrap().clear();
        self.fail_remove.lock().unwrap().clear();
        self.fail_reads(false);
    }
}

#[async_trait]
impl KvStore for FlakyKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        if *self.fail_get.lock().unwrap() {
            return Err(PersistenceError::Unavailable(format!("read {key}")));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        if self.fail_set.lock().unwrap().contains(key) {
            return Err(PersistenceError::Unavailable(format!("write {key}")));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        if self.fail_remove.lock().unwrap().contains(key) {
            return Err(PersistenceError::Unavailable(format!("remove {key}")));
        }
        self.inner.remove(key).await
    }
}

/// A raw API article with a url.
pub fn raw_article(url: &str, title: &str) -> Value {
    json!({
        "source": { "id": "wire", "name": "Wire" },
        "author": "Reporter",
        "title": title,
        "description": format!("About {title}"),
        "url": url,
        "urlToImage": "https://img.example.com/a.jpg",
        "publishedAt": "2024-05-01T12:00:00Z",
        "content": "Body text"
    })
}

pub fn articles_body(articles: Vec<Value>) -> Value {
    json!({
        "status": "ok",
        "totalResults": articles.len(),
        "articles": articles
    })
}

pub fn store_with(api: Arc<dyn ApiClient + Send + Sync>, kv: Arc<dyn KvStore>) -> Arc<ArticleStore> {
    let news = Arc::new(NewsService::new(api));
    Arc::new(ArticleStore::new(kv, news))
}
