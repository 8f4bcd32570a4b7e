/// View orchestration
///
/// Composes the catalog, the filter engine and the debounced query into the
/// state a movie browser renders: curated lists or search results for the
/// settled query, and the detail view for the selected movie.
///
/// Every fetch is stamped with a `RequestId`. A result is committed only while
/// its id is still the current one, so a slow response for an earlier query or
/// selection can never overwrite a later one.
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{
    error::{CatalogResult, FETCH_FAILED_MESSAGE},
    models::{find_trailer, FilterCriteria, MovieDetail, MovieId, MovieSummary, Video},
    services::{
        catalog::{fetch_curated, CuratedLists, MovieCatalog, FIRST_PAGE},
        filter::{filter_movies, with_posters},
        request_id::{fetch_span, RequestId},
    },
};

/// Curated home-page sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Trending,
    TopRated,
    Upcoming,
}

/// Movie currently open in the detail view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub movie_id: MovieId,
    pub request_id: RequestId,
}

/// Whether a finished fetch was applied to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Committed,
    /// A later query or selection replaced this one while it was in flight
    Superseded,
}

/// Observable view state
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Settled query the listing belongs to; blank means the curated home page
    pub query: String,
    pub curated: CuratedLists,
    pub search_results: Vec<MovieSummary>,
    pub criteria: FilterCriteria,
    pub loading: bool,
    /// User-facing message of the last failed listing fetch
    pub error: Option<String>,
    pub selection: Option<Selection>,
    pub detail: Option<MovieDetail>,
    pub trailers: Vec<Video>,
    listing_request: Option<RequestId>,
}

impl ViewState {
    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Search results after the active filters
    pub fn visible_search_results(&self) -> Vec<MovieSummary> {
        filter_movies(&self.search_results, &self.criteria)
    }

    /// A curated section after the active filters
    pub fn visible_section(&self, section: Section) -> Vec<MovieSummary> {
        let movies = match section {
            Section::Trending => &self.curated.trending,
            Section::TopRated => &self.curated.top_rated,
            Section::Upcoming => &self.curated.upcoming,
        };
        filter_movies(movies, &self.criteria)
    }

    /// Trailer to embed in the detail view
    pub fn trailer(&self) -> Option<&Video> {
        find_trailer(&self.trailers)
    }
}

pub struct ViewOrchestrator {
    catalog: Arc<dyn MovieCatalog>,
    state: watch::Sender<ViewState>,
}

impl ViewOrchestrator {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self { catalog, state }
    }

    /// Current view state
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receiver woken whenever the view state changes
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Replaces the filter criteria
    pub fn set_criteria(&self, criteria: FilterCriteria) {
        tracing::debug!(active_filters = criteria.active_count(), "Filter criteria updated");
        self.state.send_modify(|state| state.criteria = criteria);
    }

    /// Fetches the curated lists for the home page
    pub async fn load_home(&self) -> CatalogResult<FetchOutcome> {
        self.apply_query("").await
    }

    /// Reacts to a settled query
    ///
    /// A blank query loads the curated lists as one fail-fast batch; anything
    /// else runs a search. Posterless movies are dropped from either listing.
    pub async fn apply_query(&self, query: &str) -> CatalogResult<FetchOutcome> {
        let request_id = RequestId::new();
        let query = query.to_string();

        self.state.send_modify(|state| {
            state.query = query.clone();
            state.loading = true;
            state.error = None;
            state.listing_request = Some(request_id);
        });

        let searching = !query.trim().is_empty();
        let operation = if searching { "search" } else { "curated" };

        let result = async {
            if searching {
                self.catalog
                    .search_movies(&query, FIRST_PAGE)
                    .await
                    .map(|page| Listing::Search(with_posters(page.results)))
            } else {
                fetch_curated(self.catalog.as_ref())
                    .await
                    .map(|lists| {
                        Listing::Curated(CuratedLists {
                            trending: with_posters(lists.trending),
                            top_rated: with_posters(lists.top_rated),
                            upcoming: with_posters(lists.upcoming),
                        })
                    })
            }
        }
        .instrument(fetch_span(operation, request_id))
        .await;

        let mut failure = None;
        let committed = self.state.send_if_modified(|state| {
            if state.listing_request != Some(request_id) {
                return false;
            }

            state.loading = false;
            match &result {
                Ok(Listing::Search(results)) => {
                    state.search_results = results.clone();
                }
                Ok(Listing::Curated(lists)) => {
                    state.curated = lists.clone();
                    state.search_results.clear();
                }
                Err(e) => {
                    state.error = Some(FETCH_FAILED_MESSAGE.to_string());
                    failure = Some(e.clone());
                }
            }
            true
        });

        if !committed {
            tracing::debug!(
                request_id = %request_id,
                query = %query,
                "Discarding superseded listing result"
            );
            return Ok(FetchOutcome::Superseded);
        }

        match failure {
            Some(e) => {
                tracing::error!(error = %e, query = %query, "Listing fetch failed");
                Err(e)
            }
            None => Ok(FetchOutcome::Committed),
        }
    }

    /// Opens the detail view for `movie_id`
    ///
    /// Details are always fetched fresh. When the detail response did not embed
    /// videos they are fetched separately; a failed video request leaves the
    /// detail without trailers instead of failing the selection. The result is committed only if
    /// `movie_id` is still the selected movie for this request.
    pub async fn select_movie(&self, movie_id: MovieId) -> CatalogResult<FetchOutcome> {
        let request_id = RequestId::new();
        let selection = Selection {
            movie_id,
            request_id,
        };

        self.state.send_modify(|state| {
            state.selection = Some(selection);
            state.detail = None;
            state.trailers.clear();
        });

        let result = self
            .fetch_detail_with_videos(movie_id)
            .instrument(fetch_span("details", request_id))
            .await;

        let is_current = |state: &ViewState| state.selection == Some(selection);

        match result {
            Ok((detail, trailers)) => {
                let committed = self.state.send_if_modified(|state| {
                    if !is_current(&*state) {
                        return false;
                    }
                    state.detail = Some(detail);
                    state.trailers = trailers;
                    true
                });

                if committed {
                    Ok(FetchOutcome::Committed)
                } else {
                    tracing::debug!(
                        movie_id = movie_id,
                        request_id = %request_id,
                        "Discarding superseded movie details"
                    );
                    Ok(FetchOutcome::Superseded)
                }
            }
            Err(e) => {
                let still_current = is_current(&*self.state.borrow());
                if still_current {
                    tracing::error!(
                        error = %e,
                        movie_id = movie_id,
                        "Failed to fetch movie details"
                    );
                    Err(e)
                } else {
                    Ok(FetchOutcome::Superseded)
                }
            }
        }
    }

    async fn fetch_detail_with_videos(
        &self,
        movie_id: MovieId,
    ) -> CatalogResult<(MovieDetail, Vec<Video>)> {
        let mut detail = self.catalog.fetch_details(movie_id).await?;
        let videos = match detail.videos.take() {
            Some(videos) => videos,
            // The detail view is still shown, just without a trailer
            None => self
                .catalog
                .fetch_videos(movie_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        error = %e,
                        movie_id = movie_id,
                        "Failed to fetch movie videos"
                    );
                    Vec::new()
                }),
        };
        detail.videos = Some(videos.clone());
        Ok((detail, videos))
    }

    /// Closes the detail view; in-flight detail fetches are discarded
    pub fn close_detail(&self) {
        self.state.send_modify(|state| {
            state.selection = None;
            state.detail = None;
            state.trailers.clear();
        });
    }

    /// Runs `apply_query` for the current and every later settled query
    ///
    /// A newer settled value cancels the search still in flight for the
    /// previous one. Aborting the returned handle stops listening and cancels
    /// the in-flight fetch with it, so nothing is committed after teardown.
    pub fn spawn_query_listener(
        self: &Arc<Self>,
        mut settled: watch::Receiver<String>,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let query = settled.borrow_and_update().clone();

                // Failures are already recorded in the view state
                let interrupted = tokio::select! {
                    _ = orchestrator.apply_query(&query) => None,
                    changed = settled.changed() => Some(changed),
                };

                let changed = match interrupted {
                    Some(changed) => {
                        tracing::debug!(query = %query, "Newer query settled, cancelling search");
                        changed
                    }
                    None => settled.changed().await,
                };

                if changed.is_err() {
                    tracing::debug!("Query source closed, stopping listener");
                    break;
                }
            }
        })
    }
}

enum Listing {
    Search(Vec<MovieSummary>),
    Curated(CuratedLists),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, ErrorKind};
    use crate::models::{Genre, PagedResult};
    use crate::services::catalog::MockMovieCatalog;
    use crate::services::debounce::DebouncedQuery;
    use std::collections::{BTreeSet, HashMap};
    use std::time::Duration;

    fn movie(id: MovieId, poster: bool) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {}", id),
            poster_path: poster.then(|| format!("/{}.jpg", id)),
            release_date: "2015-05-15".to_string(),
            vote_average: 7.0,
            genre_ids: BTreeSet::from([28]),
        }
    }

    fn page(movies: Vec<MovieSummary>) -> PagedResult<MovieSummary> {
        PagedResult {
            total_results: movies.len() as u32,
            results: movies,
            page: 1,
            total_pages: 1,
        }
    }

    fn detail(id: MovieId, videos: Option<Vec<Video>>) -> MovieDetail {
        MovieDetail {
            summary: movie(id, true),
            overview: format!("Overview {}", id),
            runtime_minutes: Some(120),
            genres: vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
            backdrop_path: None,
            cast: vec![],
            videos,
        }
    }

    fn trailer(key: &str) -> Video {
        Video {
            key: key.to_string(),
            site: "YouTube".to_string(),
            video_type: "Trailer".to_string(),
        }
    }

    /// Catalog whose detail and search responses arrive after per-key delays
    struct DelayedCatalog {
        detail_delays: HashMap<MovieId, Duration>,
        search_delays: HashMap<String, Duration>,
    }

    #[async_trait::async_trait]
    impl MovieCatalog for DelayedCatalog {
        async fn fetch_trending(&self, _page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
            Ok(page(vec![movie(1, true)]))
        }

        async fn fetch_top_rated(&self, _page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
            Ok(page(vec![movie(2, true)]))
        }

        async fn fetch_upcoming(&self, _page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
            Ok(page(vec![movie(3, true)]))
        }

        async fn fetch_popular(&self, _page: u32) -> CatalogResult<PagedResult<MovieSummary>> {
            Ok(page(vec![]))
        }

        async fn search_movies(
            &self,
            query: &str,
            _page: u32,
        ) -> CatalogResult<PagedResult<MovieSummary>> {
            let delay = self.search_delays.get(query).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            let id = query.len() as MovieId * 100;
            Ok(page(vec![movie(id, true)]))
        }

        async fn fetch_details(&self, movie_id: MovieId) -> CatalogResult<MovieDetail> {
            let delay = self.detail_delays.get(&movie_id).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(detail(movie_id, Some(vec![trailer(&format!("t{}", movie_id))])))
        }

        async fn fetch_videos(&self, _movie_id: MovieId) -> CatalogResult<Vec<Video>> {
            Ok(vec![])
        }

        async fn fetch_genres(&self) -> CatalogResult<Vec<Genre>> {
            Ok(vec![])
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    fn delayed(
        details: &[(MovieId, u64)],
        searches: &[(&str, u64)],
    ) -> Arc<ViewOrchestrator> {
        let catalog = DelayedCatalog {
            detail_delays: details
                .iter()
                .map(|(id, ms)| (*id, Duration::from_millis(*ms)))
                .collect(),
            search_delays: searches
                .iter()
                .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                .collect(),
        };
        Arc::new(ViewOrchestrator::new(Arc::new(catalog)))
    }

    #[tokio::test]
    async fn test_load_home_populates_sections_without_posterless_movies() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_trending()
            .returning(|_| Ok(page(vec![movie(1, true), movie(2, false)])));
        catalog
            .expect_fetch_top_rated()
            .returning(|_| Ok(page(vec![movie(3, true)])));
        catalog
            .expect_fetch_upcoming()
            .returning(|_| Ok(page(vec![movie(4, true)])));
        catalog.expect_name().return_const("mock");

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        let outcome = orchestrator.load_home().await.unwrap();
        assert_eq!(outcome, FetchOutcome::Committed);

        let state = orchestrator.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(!state.is_searching());
        assert_eq!(state.visible_section(Section::Trending).len(), 1);
        assert_eq!(state.visible_section(Section::TopRated)[0].id, 3);
        assert_eq!(state.visible_section(Section::Upcoming)[0].id, 4);
    }

    #[tokio::test]
    async fn test_curated_failure_shows_no_partial_sections() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_trending()
            .returning(|_| Ok(page(vec![movie(1, true)])));
        catalog
            .expect_fetch_top_rated()
            .returning(|_| Err(CatalogError::Unknown("boom".to_string())));
        catalog
            .expect_fetch_upcoming()
            .returning(|_| Ok(page(vec![movie(4, true)])));
        catalog.expect_name().return_const("mock");

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        let err = orchestrator.load_home().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let state = orchestrator.snapshot();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(FETCH_FAILED_MESSAGE));
        assert!(state.curated.trending.is_empty());
        assert!(state.curated.upcoming.is_empty());
    }

    #[tokio::test]
    async fn test_search_applies_filters_to_results() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_search_movies()
            .withf(|query, page| query.to_string() == "heat" && *page == 1)
            .times(1)
            .returning(|_, _| {
                let mut old = movie(10, true);
                old.release_date = "1995-12-15".to_string();
                Ok(page(vec![old, movie(11, true), movie(12, false)]))
            });

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        orchestrator.apply_query("heat").await.unwrap();
        orchestrator.set_criteria(FilterCriteria::neutral().with_year_from(Some(2000)));

        let state = orchestrator.snapshot();
        assert!(state.is_searching());
        assert_eq!(state.search_results.len(), 2);
        let visible: Vec<MovieId> = state.visible_search_results().iter().map(|m| m.id).collect();
        assert_eq!(visible, vec![11]);
    }

    #[tokio::test]
    async fn test_select_movie_fetches_videos_when_not_embedded() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_details()
            .withf(|id| *id == 550)
            .returning(|id| Ok(detail(id, None)));
        catalog
            .expect_fetch_videos()
            .withf(|id| *id == 550)
            .times(1)
            .returning(|_| Ok(vec![trailer("SUXWAEX2jlg")]));

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        let outcome = orchestrator.select_movie(550).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Committed);

        let state = orchestrator.snapshot();
        assert_eq!(state.detail.as_ref().map(MovieDetail::id), Some(550));
        assert_eq!(state.trailer().map(|t| t.key.as_str()), Some("SUXWAEX2jlg"));
    }

    #[tokio::test]
    async fn test_select_movie_skips_video_request_when_embedded() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_details()
            .returning(|id| Ok(detail(id, Some(vec![trailer("embedded")]))));
        catalog.expect_fetch_videos().never();

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        orchestrator.select_movie(7).await.unwrap();
        assert_eq!(orchestrator.snapshot().trailers, vec![trailer("embedded")]);
    }

    #[tokio::test]
    async fn test_select_movie_keeps_detail_when_videos_fail() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_details()
            .returning(|id| Ok(detail(id, None)));
        catalog
            .expect_fetch_videos()
            .times(1)
            .returning(|_| Err(CatalogError::Network("connection reset".to_string())));

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        let outcome = orchestrator.select_movie(550).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Committed);

        let state = orchestrator.snapshot();
        assert_eq!(state.detail.as_ref().map(MovieDetail::id), Some(550));
        assert!(state.trailers.is_empty());
        assert!(state.trailer().is_none());
    }

    #[tokio::test]
    async fn test_select_movie_failure_surfaces_error() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_fetch_details()
            .returning(|_| Err(CatalogError::NotFound("no such movie".to_string())));

        let orchestrator = ViewOrchestrator::new(Arc::new(catalog));
        let err = orchestrator.select_movie(404).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(orchestrator.snapshot().detail.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_selection_wins_over_slow_earlier_one() {
        let orchestrator = delayed(&[(1, 500), (2, 50)], &[]);

        let slow = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.select_movie(1).await })
        };
        tokio::task::yield_now().await;
        let fast = orchestrator.select_movie(2).await.unwrap();
        let slow = slow.await.unwrap().unwrap();

        assert_eq!(fast, FetchOutcome::Committed);
        assert_eq!(slow, FetchOutcome::Superseded);

        let state = orchestrator.snapshot();
        assert_eq!(state.selection.map(|s| s.movie_id), Some(2));
        assert_eq!(state.detail.as_ref().map(MovieDetail::id), Some(2));
        assert_eq!(state.trailers, vec![trailer("t2")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_detail_discards_in_flight_fetch() {
        let orchestrator = delayed(&[(1, 200)], &[]);

        let pending = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.select_movie(1).await })
        };
        tokio::task::yield_now().await;
        orchestrator.close_detail();

        assert_eq!(pending.await.unwrap().unwrap(), FetchOutcome::Superseded);
        let state = orchestrator.snapshot();
        assert!(state.selection.is_none());
        assert!(state.detail.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_query_wins_over_slow_earlier_search() {
        let orchestrator = delayed(&[], &[("al", 500), ("alien", 20)]);

        let slow = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.apply_query("al").await })
        };
        tokio::task::yield_now().await;
        orchestrator.apply_query("alien").await.unwrap();

        assert_eq!(slow.await.unwrap().unwrap(), FetchOutcome::Superseded);
        let state = orchestrator.snapshot();
        assert_eq!(state.query, "alien");
        assert_eq!(state.search_results[0].id, 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_listener_follows_debounced_input() {
        let orchestrator = delayed(&[], &[]);
        let query = DebouncedQuery::new(Duration::from_millis(300));
        let listener = orchestrator.spawn_query_listener(query.subscribe());
        let mut view = orchestrator.subscribe();

        query.set("m");
        tokio::time::sleep(Duration::from_millis(100)).await;
        query.set("matrix");
        tokio::time::sleep(Duration::from_millis(500)).await;

        let state = view.borrow_and_update().clone();
        assert_eq!(state.query, "matrix");
        assert_eq!(state.search_results[0].id, 600);
        assert!(!state.loading);

        query.set("");
        tokio::time::sleep(Duration::from_millis(400)).await;
        let state = orchestrator.snapshot();
        assert!(!state.is_searching());
        assert!(state.search_results.is_empty());
        assert_eq!(state.curated.trending[0].id, 1);

        listener.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_listener_commits_nothing_afterwards() {
        let orchestrator = delayed(&[], &[("slow", 500)]);
        let query = DebouncedQuery::new(Duration::from_millis(300));
        let listener = orchestrator.spawn_query_listener(query.subscribe());

        query.set("slow");
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(orchestrator.snapshot().loading);

        listener.abort();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let state = orchestrator.snapshot();
        assert_eq!(state.query, "slow");
        assert!(state.search_results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_query_cancels_search_in_flight() {
        let orchestrator = delayed(&[], &[("al", 1000), ("alien", 10)]);
        let query = DebouncedQuery::new(Duration::from_millis(300));
        let listener = orchestrator.spawn_query_listener(query.subscribe());
        let mut view = orchestrator.subscribe();

        query.set("al");
        tokio::time::sleep(Duration::from_millis(400)).await;
        query.set("alien");
        tokio::time::sleep(Duration::from_millis(2000)).await;

        let state = view.borrow_and_update().clone();
        assert_eq!(state.query, "alien");
        assert_eq!(state.search_results.len(), 1);
        assert_eq!(state.search_results[0].id, 500);
        assert!(!state.loading);

        listener.abort();
    }
}
