pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::Category;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Top headlines and saved articles from a news API", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List top headlines
    Headlines {
        /// all, business, entertainment, general, health, science, sports, technology
        #[arg(short, long, default_value = "all")]
        category: Category,

        /// Articles per page (default from config)
        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one article
    Show {
        /// Article id (usually its URL)
        id: String,
    },
    /// Add or remove an article from favorites
    Favorite {
        /// Article id (usually its URL)
        id: String,
    },
    /// List favorite articles
    Favorites,
    /// Remove all favorites
    ClearFavorites,
    /// Show or change settings
    Settings {
        #[arg(long, value_enum)]
        dark_mode: Option<Switch>,

        /// Block all network requests
        #[arg(long, value_enum)]
        offline: Option<Switch>,
    },
    /// Open an article in the browser
    Open {
        /// Article id (usually its URL)
        id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> bool {
        switch == Switch::On
    }
}
