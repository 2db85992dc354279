//! # Newsdesk
//!
//! A news reader core: top headlines from a NewsAPI-compatible service, a
//! session article cache, and locally persisted favorites and settings.
//!
//! ## Architecture
//!
//! ```text
//! ApiClient → NewsService → NewsQueries → CLI
//!                               ↕
//!                ArticleStore / SettingsStore → KvStore
//! ```
//!
//! - [`fetcher`]: HTTP client that injects the API key and honors offline mode
//! - [`normalizer`]: Converts raw API articles to [`Article`](domain::Article)
//! - [`news`]: Headline and single-article queries
//! - [`state`]: Article cache, favorites reconciliation, settings
//! - [`store`]: Key-value persistence (SQLite or in-memory)
//! - [`query`]: Cached, de-duplicated queries over the news service
//!
//! ## Quick Start
//!
//! ```bash
//! # Technology headlines
//! newsdesk headlines --category technology
//!
//! # Save an article
//! newsdesk favorite https://example.com/story
//!
//! # List favorites
//! newsdesk favorites
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// key-value store, API client, stores and queries.
pub mod app;

/// Command-line interface using clap.
///
/// - `headlines [--category <c>]` - List top headlines
/// - `show <id>` / `open <id>` - Show or open an article
/// - `favorite <id>` - Toggle a favorite
/// - `favorites` / `clear-favorites` - List or clear favorites
/// - `settings [--dark-mode on|off] [--offline on|off]` - Settings
pub mod cli;

/// Configuration loaded from `~/.config/newsdesk/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article): Normalized article with a stable id
/// - [`Category`](domain::Category): Headline categories
/// - [`Settings`](domain::Settings): Persisted user preferences
pub mod domain;

/// HTTP access to the news API.
///
/// - [`ApiClient`](fetcher::ApiClient): Async trait for GET requests
/// - [`HttpApiClient`](fetcher::HttpApiClient): reqwest-based implementation
pub mod fetcher;

/// Headline and article lookups against the news API.
pub mod news;

pub mod normalizer;

/// Query cache with staleness windows and in-flight de-duplication.
pub mod query;

/// Observable application state.
///
/// - [`ArticleStore`](state::ArticleStore): Session cache and favorites
/// - [`SettingsStore`](state::SettingsStore): Dark mode and offline reading
pub mod state;

/// Key-value persistence.
///
/// - [`KvStore`](store::KvStore): Async trait with multi-key writes
/// - [`SqliteKvStore`](store::SqliteKvStore): SQLite implementation
/// - [`MemoryKvStore`](store::MemoryKvStore): In-memory implementation
pub mod store;
