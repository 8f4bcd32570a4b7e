pub mod catalog;
pub mod debounce;
pub mod filter;
pub mod orchestrator;
pub mod request_id;

pub use catalog::{fetch_curated, image_url, CuratedLists, MovieCatalog, TmdbClient};
pub use debounce::DebouncedQuery;
pub use orchestrator::{FetchOutcome, Section, ViewOrchestrator, ViewState};
