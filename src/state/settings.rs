use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::app::{PersistenceError, Result};
use crate::domain::Settings;
use crate::store::{KvStore, SETTINGS_KEY};

/// Dark mode and offline reading, persisted together under `appSettings`.
///
/// Readable immediately; both flags are `false` until [`load`](Self::load)
/// finishes. Subscribers get a `watch` receiver that always holds the
/// current value.
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
    kv: Arc<dyn KvStore>,
    persist_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        let (tx, _) = watch::channel(Settings::default());
        Self {
            tx,
            kv,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Settings {
        *self.tx.borrow()
    }

    pub fn dark_mode(&self) -> bool {
        self.current().dark_mode
    }

    pub fn offline_reading(&self) -> bool {
        self.current().offline_reading
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub async fn load(&self) {
        let _guard = self.persist_lock.lock().await;
        match self.kv.get(SETTINGS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Settings>(&raw) {
                Ok(settings) => {
                    tracing::debug!(?settings, "loaded settings");
                    self.tx.send_replace(settings);
                }
                Err(err) => tracing::warn!(error = %err, "corrupt settings, keeping defaults"),
            },
            Ok(None) => tracing::debug!("no saved settings"),
            Err(err) => tracing::error!(error = %err, "error loading settings"),
        }
    }

    pub async fn set_dark_mode(&self, value: bool) -> Result<()> {
        self.update(|s| s.dark_mode = value).await
    }

    pub async fn set_offline_reading(&self, value: bool) -> Result<()> {
        self.update(|s| s.offline_reading = value).await
    }

    /// Write the field, then persist the whole blob. Last write wins.
    async fn update(&self, modify: impl FnOnce(&mut Settings)) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        self.tx.send_modify(modify);

        let snapshot = self.current();
        let encoded = serde_json::to_string(&snapshot).map_err(PersistenceError::from)?;
        if let Err(err) = self.kv.set(SETTINGS_KEY, &encoded).await {
            tracing::error!(error = %err, "error saving settings");
            return Err(err.into());
        }
        Ok(())
    }
}
