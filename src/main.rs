use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cinesearch::{
    config::Config,
    models::MovieSummary,
    services::{DebouncedQuery, Section, TmdbClient, ViewOrchestrator},
    store::{FavoritesStore, FileStorage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cinesearch=info")),
        )
        .init();

    let config = Config::from_env()?;
    let catalog = TmdbClient::from_config(&config).context("Failed to create catalog client")?;
    let favorites = FavoritesStore::load(Arc::new(FileStorage::new(config.data_dir.clone())));
    let orchestrator = Arc::new(ViewOrchestrator::new(Arc::new(catalog)));

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");

    if query.trim().is_empty() {
        orchestrator.load_home().await?;
        let state = orchestrator.snapshot();
        print_section("Trending", &state.visible_section(Section::Trending), &favorites);
        print_section("Top Rated", &state.visible_section(Section::TopRated), &favorites);
        print_section("Upcoming", &state.visible_section(Section::Upcoming), &favorites);
    } else {
        let debounced = DebouncedQuery::new(config.search_debounce());
        let mut settled = debounced.subscribe();
        debounced.set(query);
        settled.changed().await?;

        let settled_query = settled.borrow_and_update().clone();
        orchestrator.apply_query(&settled_query).await?;
        let state = orchestrator.snapshot();
        print_section("Search Results", &state.visible_search_results(), &favorites);
    }

    println!("{} favorite(s) saved", favorites.len());
    Ok(())
}

fn print_section(heading: &str, movies: &[MovieSummary], favorites: &FavoritesStore) {
    println!("== {} ({})", heading, movies.len());
    for movie in movies {
        let marker = if favorites.is_favorite(movie.id) { "*" } else { " " };
        let year = movie
            .release_year()
            .map_or_else(|| "----".to_string(), |y| y.to_string());
        let rating = movie
            .display_rating()
            .map_or_else(|| "N/A".to_string(), |r| format!("{:.1}/5", r));
        println!("{} {:>8}  {}  {}  {}", marker, movie.id, year, rating, movie.title);
    }
    println!();
}
