use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk::app::AppContext;
use newsdesk::cli::{commands, Cli, Commands};
use newsdesk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.database = Some(db);
    }

    let ctx = AppContext::create(config)?;
    ctx.load().await;

    match cli.command {
        Commands::Headlines {
            category,
            page_size,
            page,
        } => {
            commands::headlines(&ctx, category, page_size, page).await?;
        }
        Commands::Show { id } => {
            commands::show(&ctx, &id).await?;
        }
        Commands::Favorite { id } => {
            commands::favorite(&ctx, &id).await?;
        }
        Commands::Favorites => {
            commands::favorites(&ctx).await?;
        }
        Commands::ClearFavorites => {
            commands::clear_favorites(&ctx).await?;
        }
        Commands::Settings { dark_mode, offline } => {
            commands::settings(&ctx, dark_mode, offline).await?;
        }
        Commands::Open { id } => {
            commands::open_article(&ctx, &id).await?;
        }
    }

    ctx.dispose();
    Ok(())
}
