//! Settings and favorites surviving a restart on an on-disk database.

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::{store_with, FakeApi, FlakyKv};
use newsdesk::app::NetworkError;
use newsdesk::domain::{Article, Settings};
use newsdesk::state::SettingsStore;
use newsdesk::store::{KvStore, SqliteKvStore, FAVORITE_DATA_KEY, FAVORITE_IDS_KEY, SETTINGS_KEY};

fn open(dir: &TempDir) -> Arc<SqliteKvStore> {
    Arc::new(SqliteKvStore::new(dir.path().join("newsdesk.db")).unwrap())
}

#[tokio::test]
async fn test_settings_survive_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let settings = SettingsStore::new(open(&dir));
        settings.load().await;
        settings.set_dark_mode(true).await.unwrap();
        settings.set_offline_reading(true).await.unwrap();
    }

    let settings = SettingsStore::new(open(&dir));
    assert!(!settings.dark_mode(), "defaults until load finishes");
    settings.load().await;
    assert!(settings.dark_mode());
    assert!(settings.offline_reading());
}

#[tokio::test]
async fn test_settings_blob_shape() {
    let kv = Arc::new(SqliteKvStore::in_memory().unwrap());
    let settings = SettingsStore::new(kv.clone());

    settings.set_offline_reading(true).await.unwrap();

    let raw = kv.get(SETTINGS_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["offlineReading"], true);
    assert_eq!(value["darkMode"], false);
    assert_eq!(value["version"], 1);
}

#[tokio::test]
async fn test_corrupt_settings_keep_defaults() {
    let kv = Arc::new(SqliteKvStore::in_memory().unwrap());
    kv.set(SETTINGS_KEY, "{broken").await.unwrap();

    let settings = SettingsStore::new(kv);
    settings.load().await;

    assert_eq!(settings.current(), Settings::default());
}

#[tokio::test]
async fn test_settings_subscribers_see_changes() {
    let settings = SettingsStore::new(Arc::new(SqliteKvStore::in_memory().unwrap()));
    let mut rx = settings.subscribe();

    settings.set_dark_mode(true).await.unwrap();

    rx.changed().await.unwrap();
    assert!(rx.borrow().dark_mode);
}

#[tokio::test]
async fn test_settings_write_failure_reports_error() {
    let kv = FlakyKv::new();
    kv.fail_set_on(SETTINGS_KEY);
    let settings = SettingsStore::new(kv.clone());

    assert!(settings.set_dark_mode(true).await.is_err());
    assert!(!kv.inner.contains_key(SETTINGS_KEY));
}

#[tokio::test]
async fn test_favorites_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let api = FakeApi::failing(NetworkError::OfflineModeActive);

    {
        let store = store_with(api.clone(), open(&dir));
        store.load_favorites().await;
        let mut article = Article::new("https://a.example/1");
        article.title = "Kept".into();
        store.cache_article(article);
        assert!(store.toggle_favorite("https://a.example/1").await);
    }

    let kv = open(&dir);
    let mut keys = kv.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec![FAVORITE_IDS_KEY, FAVORITE_DATA_KEY]);

    let store = store_with(api.clone(), kv);
    store.load_favorites().await;
    let favorites = store.load_all_favorite_articles().await;

    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "Kept");
    assert_eq!(api.call_count(), 0);
}
