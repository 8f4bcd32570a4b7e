/// TMDB API client
///
/// Implements the movie catalog against The Movie Database v3 REST API.
/// Every request carries the API key as the `api_key` query parameter.
///
/// API Flow:
/// 1. Listings: /trending/movie/week, /movie/top_rated, /movie/upcoming, /movie/popular
/// 2. Search: /search/movie?query=...
/// 3. Details: /movie/{id}?append_to_response=videos,credits → one round trip
///
/// /movie/{id}/videos is only needed when a detail response had no embedded videos.
use crate::{
    config::Config,
    error::{CatalogError, CatalogResult},
    models::{
        Genre, MovieDetail, MovieId, MovieSummary, PagedResult, TmdbGenreList, TmdbMovieDetails,
        TmdbVideoList, Video,
    },
    services::catalog::{image_url_with_base, MovieCatalog},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const DETAIL_APPEND: &str = "videos,credits";

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    image_url: String,
}

impl TmdbClient {
    /// Creates a client with default HTTP settings
    pub fn new(api_key: Option<String>, api_url: String, image_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_url,
        }
    }

    /// Creates a client from application configuration
    ///
    /// A missing API key is accepted here; it is reported as an auth error
    /// when the first request is made.
    pub fn from_config(config: &Config) -> CatalogResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CatalogError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        if config.tmdb_api_key.is_none() {
            tracing::warn!("TMDB_API_KEY is not set; catalog requests will fail");
        }

        Ok(Self {
            http_client,
            api_key: config.tmdb_api_key.clone(),
            api_url: config.tmdb_api_url.trim_end_matches('/').to_string(),
            image_url: config.tmdb_image_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds an image URL against the configured CDN
    pub fn image_url(&self, path: Option<&str>, width: u32) -> String {
        image_url_with_base(&self.image_url, path, width)
    }

    fn api_key(&self) -> CatalogResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CatalogError::Auth("TMDB API key is not configured".to_string()))
    }

    /// Issues a GET request and decodes the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> CatalogResult<T> {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.api_url, path);

        tracing::debug!(path = %path, params = ?params, "Catalog request");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path = %path,
                status = %status,
                "Catalog API request failed"
            );
            return Err(CatalogError::from_status(status, &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize catalog response");
            CatalogError::Malformed(format!("Failed to parse catalog response: {}", e))
        })
    }

    async fn get_page(&self, path: &str, page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
        let result: PagedResult<MovieSummary> =
            self.get(path, &[("page", page.to_string())]).await?;

        tracing::info!(
            path = %path,
            page = result.page,
            results = result.results.len(),
            "Listing fetched"
        );

        Ok(result)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbClient {
    async fn fetch_trending(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
        self.get_page("/trending/movie/week", page).await
    }

    async fn fetch_top_rated(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
        self.get_page("/movie/top_rated", page).await
    }

    async fn fetch_upcoming(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
        self.get_page("/movie/upcoming", page).await
    }

    async fn fetch_popular(&self, page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
        self.get_page("/movie/popular", page).await
    }

    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> CatalogResult<PagedResult<MovieSummary>> {
        let result: PagedResult<MovieSummary> = self
            .get(
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
            )
            .await?;

        tracing::info!(
            query = %query,
            results = result.results.len(),
            total_results = result.total_results,
            catalog = "tmdb",
            "Movie search completed"
        );

        Ok(result)
    }

    async fn fetch_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetail> {
        let raw: TmdbMovieDetails = self
            .get(
                &format!("/movie/{}", movie_id),
                &[("append_to_response", DETAIL_APPEND.to_string())],
            )
            .await?;
        let detail = MovieDetail::from(raw);

        tracing::info!(
            movie_id = movie_id,
            cast = detail.cast.len(),
            videos = detail.videos.as_ref().map_or(0, Vec::len),
            "Movie details fetched"
        );

        Ok(detail)
    }

    async fn fetch_videos(&self, movie_id: MovieId) -> CatalogResult<Vec<Video>> {
        let list: TmdbVideoList = self.get(&format!("/movie/{}/videos", movie_id), &[]).await?;
        Ok(list.results)
    }

    async fn fetch_genres(&self) -> CatalogResult<Vec<Genre>> {
        let list: TmdbGenreList = self.get("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
