/// Movie catalog abstraction
///
/// The catalog is the third-party metadata service (TMDB) behind every listing,
/// search and detail lookup. Callers depend on the `MovieCatalog` trait so the
/// HTTP client can be swapped for a fake in tests.
use crate::{
    error::CatalogResult,
    models::{Genre, MovieDetail, MovieId, MovieSummary, PagedResult, Video},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// First page of any paginated listing
pub const FIRST_PAGE: u32 = 1;

/// Default image width requested from the CDN
pub const DEFAULT_IMAGE_WIDTH: u32 = 500;
pub const BACKDROP_IMAGE_WIDTH: u32 = 1280;
pub const PROFILE_IMAGE_WIDTH: u32 = 200;

pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Returned by `image_url` when a record has no image
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// Builds a CDN URL for an image path, or the placeholder when absent
pub fn image_url(path: Option<&str>, width: u32) -> String {
    image_url_with_base(IMAGE_BASE_URL, path, width)
}

pub(crate) fn image_url_with_base(base: &str, path: Option<&str>, width: u32) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{}/w{}{}", base, width, path),
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

/// Trait for movie catalog clients
///
/// Implementations issue one request per call and never retry; failures are
/// returned as `CatalogError` and retrying is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Movies trending this week
    async fn fetch_trending(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>>;

    async fn fetch_top_rated(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>>;

    async fn fetch_upcoming(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>>;

    async fn fetch_popular(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>>;

    /// Search movies by title
    ///
    /// The query is sent verbatim. Callers are expected not to issue blank queries.
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> CatalogResult<PagedResult<MovieSummary>>;

    /// Fetch full details, with videos and credits embedded in the same response
    async fn fetch_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetail>;

    /// Fetch the videos of a movie on their own
    async fn fetch_videos(&self, movie_id: MovieId) -> CatalogResult<Vec<Video>>;

    /// Genre catalogue offered by the filter panel
    async fn fetch_genres(&self) -> CatalogResult<Vec<Genre>>;

    /// Catalog name for logging and debugging
    fn name(&self) -> &'static str;
}

/// The three curated home-page listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CuratedLists {
    pub trending: Vec<MovieSummary>,
    pub top_rated: Vec<MovieSummary>,
    pub upcoming: Vec<MovieSummary>,
}

/// Fetches the curated listings concurrently as one fail-fast batch
///
/// All three requests are in flight at once; the first failure fails the
/// whole batch and no partial lists are returned.
pub async fn fetch_curated(catalog: &dyn MovieCatalog) -> CatalogResult<CuratedLists> {
    let result = tokio::try_join!(
        catalog.fetch_trending(FIRST_PAGE),
        catalog.fetch_top_rated(FIRST_PAGE),
        catalog.fetch_upcoming(FIRST_PAGE),
    );

    match result {
        Ok((trending, top_rated, upcoming)) => {
            let lists = CuratedLists {
                trending: trending.results,
                top_rated: top_rated.results,
                upcoming: upcoming.results,
            };

            tracing::info!(
                trending = lists.trending.len(),
                top_rated = lists.top_rated.len(),
                upcoming = lists.upcoming.len(),
                catalog = catalog.name(),
                "Curated lists fetched"
            );

            Ok(lists)
        }
        Err(e) => {
            tracing::error!(error = %e, kind = %e.kind(), "Curated batch failed");
            Err(e)
        }
    }
}
