pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::app::PersistenceError;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub const FAVORITE_IDS_KEY: &str = "favoriteArticles";
pub const FAVORITE_DATA_KEY: &str = "favoriteArticlesData";
pub const SETTINGS_KEY: &str = "appSettings";

pub type KvResult<T> = std::result::Result<T, PersistenceError>;

/// Async string key-value storage.
///
/// Single-key operations carry no cross-key guarantee. `set_many` and
/// `remove_many` apply several keys as one unit: backends with transactions
/// override them, the defaults compensate by restoring the previous values.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> KvResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;
    async fn remove(&self, key: &str) -> KvResult<()>;

    async fn set_many(&self, entries: &[(&str, String)]) -> KvResult<()> {
        let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
        let previous = snapshot(self, &keys).await?;
        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(err) = self.set(key, value).await {
                restore(self, &previous[..written]).await;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> KvResult<()> {
        let previous = snapshot(self, keys).await?;
        for (removed, key) in keys.iter().enumerate() {
            if let Err(err) = self.remove(key).await {
                restore(self, &previous[..removed]).await;
                return Err(err);
            }
        }
        Ok(())
    }
}

async fn snapshot<'k, S>(store: &S, keys: &[&'k str]) -> KvResult<Vec<(&'k str, Option<String>)>>
where
    S: KvStore + ?Sized,
{
    let mut previous = Vec::with_capacity(keys.len());
    for &key in keys {
        previous.push((key, store.get(key).await?));
    }
    Ok(previous)
}

async fn restore<S>(store: &S, previous: &[(&str, Option<String>)])
where
    S: KvStore + ?Sized,
{
    for (key, value) in previous {
        let result = match value {
            Some(value) => store.set(key, value).await,
            None => store.remove(key).await,
        };
        if let Err(err) = result {
            tracing::error!(key = %key, error = %err, "failed to restore key after partial write");
        }
    }
}
