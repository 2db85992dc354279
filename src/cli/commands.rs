use crate::app::{AppContext, NewsdeskError, Result};
use crate::cli::Switch;
use crate::domain::{Article, Category};

fn format_published(article: &Article) -> String {
    article
        .published_at_utc()
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| article.published_at.clone())
}

fn print_summary(ctx: &AppContext, index: usize, article: &Article) {
    let marker = if ctx.articles.is_article_favorite(&article.id) {
        "*"
    } else {
        " "
    };
    println!("{:>3}.{} {}", index + 1, marker, article.display_title());
    println!("      {} | {}", article.source.name, format_published(article));
    println!("      {}", article.id);
}

fn print_detail(ctx: &AppContext, article: &Article) {
    println!("{}", article.display_title());
    if ctx.articles.is_article_favorite(&article.id) {
        println!("[favorite]");
    }
    println!();
    println!("Source:    {}", article.source.name);
    if let Some(author) = &article.author {
        println!("Author:    {}", author);
    }
    println!("Published: {}", format_published(article));
    println!("Link:      {}", article.url);
    println!();
    println!("{}", article.display_content());
}

fn offline_hint(ctx: &AppContext) -> &'static str {
    if ctx.settings.offline_reading() {
        " (offline mode is on)"
    } else {
        ""
    }
}

pub async fn headlines(ctx: &AppContext, category: Category, page_size: Option<u32>, page: u32) -> Result<()> {
    ctx.articles.set_selected_category(category);
    let page_size = page_size.unwrap_or(ctx.config.api.page_size);

    let outcome = ctx.queries.top_headlines(category, page_size, page).await;
    if !outcome.status {
        println!("Couldn't load {} headlines{}. Try again.", category, offline_hint(ctx));
        return Ok(());
    }

    if outcome.data.is_empty() {
        println!("No articles in {}", category);
        return Ok(());
    }

    for (i, article) in outcome.data.iter().enumerate() {
        print_summary(ctx, i, article);
    }
    Ok(())
}

async fn resolve(ctx: &AppContext, id: &str) -> Result<Article> {
    let outcome = ctx.queries.article(id).await;
    match outcome.data {
        Some(article) if outcome.status => Ok(article),
        _ => Err(NewsdeskError::NotFound(id.to_string())),
    }
}

pub async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    match resolve(ctx, id).await {
        Ok(article) => print_detail(ctx, &article),
        Err(NewsdeskError::NotFound(_)) => {
            println!("Article not found{}. Try again.", offline_hint(ctx));
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

pub async fn favorite(ctx: &AppContext, id: &str) -> Result<()> {
    // Removing needs no lookup; adding needs the article in the session cache
    let target = if ctx.articles.is_article_favorite(id) {
        id.to_string()
    } else {
        match resolve(ctx, id).await {
            Ok(article) => article.id,
            Err(NewsdeskError::NotFound(_)) => {
                println!("Article not found{}. Nothing saved.", offline_hint(ctx));
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    };

    match ctx.queries.toggle_favorite(&target).await {
        Ok(true) => println!("Saved to favorites: {}", target),
        Ok(false) => println!("Removed from favorites: {}", target),
        Err(e) => println!("Failed to save article to favorites: {}. Please try again.", e),
    }
    Ok(())
}

pub async fn favorites(ctx: &AppContext) -> Result<()> {
    let ids = ctx.articles.favorite_article_ids();
    if ids.is_empty() {
        println!("No favorites yet");
        return Ok(());
    }

    let articles = ctx.queries.favorite_articles().await.data;
    for (i, article) in articles.iter().enumerate() {
        print_summary(ctx, i, article);
    }

    let unresolved = ids.len().saturating_sub(articles.len());
    if unresolved > 0 {
        println!("{} favorite(s) could not be loaded{}", unresolved, offline_hint(ctx));
    }
    Ok(())
}

pub async fn clear_favorites(ctx: &AppContext) -> Result<()> {
    match ctx.queries.clear_favorites().await {
        Ok(()) => println!("Favorites cleared"),
        Err(e) => println!("Failed to clear favorites: {}", e),
    }
    Ok(())
}

pub async fn settings(ctx: &AppContext, dark_mode: Option<Switch>, offline: Option<Switch>) -> Result<()> {
    if let Some(value) = dark_mode {
        ctx.settings.set_dark_mode(value.into()).await?;
    }
    if let Some(value) = offline {
        ctx.settings.set_offline_reading(value.into()).await?;
    }

    let current = ctx.settings.current();
    let on_off = |v: bool| if v { "on" } else { "off" };
    println!("dark mode:       {}", on_off(current.dark_mode));
    println!("offline reading: {}", on_off(current.offline_reading));
    Ok(())
}

pub async fn open_article(ctx: &AppContext, id: &str) -> Result<()> {
    let article = resolve(ctx, id).await?;
    if article.url.is_empty() {
        println!("Article has no link");
        return Ok(());
    }
    open::that(&article.url)?;
    println!("Opened {}", article.url);
    Ok(())
}
