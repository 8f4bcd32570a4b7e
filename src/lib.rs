//! Data layer for a movie discovery front-end backed by TMDB.
//!
//! - [`services::catalog`]: typed catalog client and the `MovieCatalog` trait
//! - [`services::debounce`]: settles rapidly changing search input
//! - [`services::filter`]: genre / year / rating filtering of listings
//! - [`store`]: persisted favorites
//! - [`services::orchestrator`]: composes the above into observable view state

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
