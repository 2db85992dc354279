//! Query caching and lifecycle through a fully wired AppContext.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{articles_body, raw_article, FakeApi};
use newsdesk::app::{AppContext, NetworkError};
use newsdesk::config::Config;
use newsdesk::domain::Category;
use newsdesk::store::MemoryKvStore;

fn context(api: Arc<FakeApi>) -> AppContext {
    AppContext::with_client(Config::default(), Arc::new(MemoryKvStore::new()), api)
}

fn headlines_api() -> Arc<FakeApi> {
    FakeApi::new(|path, _| match path {
        "/top-headlines" => Ok(articles_body(vec![
            raw_article("https://news.example/1", "First"),
            raw_article("https://news.example/2", "Second"),
        ])),
        _ => Ok(articles_body(vec![raw_article(
            "https://news.example/searched",
            "Searched",
        )])),
    })
}

async fn wait_for_calls(api: &FakeApi, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while api.call_count() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for API calls");
}

#[tokio::test]
async fn test_headlines_served_from_cache() {
    let api = headlines_api();
    let ctx = context(api.clone());
    ctx.load().await;

    let first = ctx.queries.top_headlines(Category::Health, 20, 1).await;
    let second = ctx.queries.top_headlines(Category::Health, 20, 1).await;

    assert!(first.status);
    assert_eq!(first, second);
    assert_eq!(api.call_count(), 1);
    assert_eq!(ctx.articles.articles().len(), 2);
}

#[tokio::test]
async fn test_all_and_general_share_cache_entry() {
    let api = headlines_api();
    let ctx = context(api.clone());

    ctx.queries.top_headlines(Category::All, 20, 1).await;
    ctx.queries.top_headlines(Category::General, 20, 1).await;

    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn test_concurrent_headlines_share_one_request() {
    let api = headlines_api();
    let ctx = context(api.clone());

    let (a, b) = tokio::join!(
        ctx.queries.top_headlines(Category::Sports, 20, 1),
        ctx.queries.top_headlines(Category::Sports, 20, 1)
    );

    assert_eq!(a, b);
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn test_article_query_prefers_store() {
    let api = headlines_api();
    let ctx = context(api.clone());
    ctx.queries.top_headlines(Category::General, 20, 1).await;

    let outcome = ctx.queries.article("https://news.example/2").await;

    assert_eq!(outcome.data.unwrap().title, "Second");
    assert_eq!(api.call_count(), 1, "no search for a cached article");
}

#[tokio::test]
async fn test_article_query_retries_and_does_not_cache_failure() {
    let api = FakeApi::failing(NetworkError::Timeout);
    let ctx = context(api.clone());

    let outcome = ctx.queries.article("https://news.example/missing").await;
    assert!(!outcome.status);
    assert_eq!(api.call_count(), 2, "one retry by default");

    ctx.queries.article("https://news.example/missing").await;
    assert_eq!(api.call_count(), 4);
}

#[tokio::test]
async fn test_favorites_query_refreshes_after_toggle() {
    let api = headlines_api();
    let ctx = context(api.clone());
    ctx.load().await;
    ctx.queries.top_headlines(Category::General, 20, 1).await;

    assert!(ctx.queries.favorite_articles().await.data.is_empty());

    assert!(ctx.queries.toggle_favorite("https://news.example/1").await.unwrap());
    let favorites = ctx.queries.favorite_articles().await.data;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, "https://news.example/1");

    ctx.queries.clear_favorites().await.unwrap();
    assert!(ctx.queries.favorite_articles().await.data.is_empty());
}

#[tokio::test]
async fn test_category_change_refetches_headlines() {
    let api = headlines_api();
    let ctx = context(api.clone());
    ctx.load().await;
    ctx.watch_categories();

    ctx.articles.set_selected_category(Category::Technology);
    wait_for_calls(&api, 1).await;

    let call = &api.calls()[0];
    assert_eq!(call.path, "/top-headlines");
    assert_eq!(call.param("category"), Some("technology"));

    // Selecting it again is not a change
    ctx.articles.set_selected_category(Category::Technology);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.call_count(), 1);
}

#[tokio::test]
async fn test_dispose_stops_category_listener() {
    let api = headlines_api();
    let ctx = context(api.clone());
    ctx.load().await;
    ctx.watch_categories();
    ctx.dispose();

    ctx.articles.set_selected_category(Category::Business);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_load_reads_persisted_settings() {
    let kv = Arc::new(MemoryKvStore::new());
    {
        let ctx = AppContext::with_client(Config::default(), kv.clone(), headlines_api());
        ctx.settings.set_dark_mode(true).await.unwrap();
    }

    let ctx = AppContext::with_client(Config::default(), kv, headlines_api());
    assert!(!ctx.settings.dark_mode());
    ctx.load().await;
    assert!(ctx.settings.dark_mode());
}

#[tokio::test]
async fn test_offline_setting_blocks_real_client() {
    let ctx = AppContext::in_memory(Config::default()).unwrap();
    ctx.settings.set_offline_reading(true).await.unwrap();

    let outcome = ctx.queries.top_headlines(Category::General, 20, 1).await;

    assert!(!outcome.status);
    assert!(outcome.data.is_empty());
}
