pub mod articles;
pub mod persisted;
pub mod settings;

pub use articles::{ArticleStore, StoreEvent, StoreStatus};
pub use settings::SettingsStore;
