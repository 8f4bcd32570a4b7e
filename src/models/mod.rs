use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

pub mod criteria;

pub use criteria::FilterCriteria;

/// TMDB movie identifier, stable across sessions
pub type MovieId = u64;

/// TMDB genre identifier
pub type GenreId = u32;

/// Number of cast members kept for display
pub const CAST_DISPLAY_LIMIT: usize = 8;

/// Movie as it appears in list endpoints and in the persisted favorites slot
///
/// Field names follow the TMDB wire format so the same shape round-trips
/// through the API and local storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    /// ISO date, possibly empty or invalid
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    /// Raw 0-10 score
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: BTreeSet<GenreId>,
}

/// Reads an explicit JSON `null` as the field's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl MovieSummary {
    /// Year component of `release_date`, `None` when empty or unparseable
    pub fn release_year(&self) -> Option<i32> {
        NaiveDate::parse_from_str(self.release_date.trim(), "%Y-%m-%d")
            .ok()
            .map(|date| date.year())
    }

    /// Rating on the 0-5 display scale, `None` when the movie has no votes
    pub fn display_rating(&self) -> Option<f64> {
        if self.vote_average > 0.0 {
            Some((self.vote_average / 2.0 * 10.0).round() / 10.0)
        } else {
            None
        }
    }

    pub fn has_poster(&self) -> bool {
        self.poster_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Genre as returned by the genre list and movie detail endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Credited cast member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Video attached to a movie (trailer, teaser, clip...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.video_type == "Trailer" && self.site == "YouTube"
    }

    /// Embeddable player URL; only meaningful for YouTube videos
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.key)
    }
}

/// First YouTube trailer in the list, if any
pub fn find_trailer(videos: &[Video]) -> Option<&Video> {
    videos.iter().find(|v| v.is_youtube_trailer())
}

/// Full movie record for the detail view
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub summary: MovieSummary,
    pub overview: String,
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<Genre>,
    pub backdrop_path: Option<String>,
    pub cast: Vec<CastMember>,
    /// `None` when the detail response carried no embedded videos
    pub videos: Option<Vec<Video>>,
}

impl MovieDetail {
    pub fn id(&self) -> MovieId {
        self.summary.id
    }

    /// Leading cast members shown in the detail view
    pub fn top_cast(&self) -> &[CastMember] {
        let end = self.cast.len().min(CAST_DISPLAY_LIMIT);
        &self.cast[..end]
    }
}

impl From<&MovieDetail> for MovieSummary {
    fn from(detail: &MovieDetail) -> Self {
        detail.summary.clone()
    }
}

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResult<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 0,
            total_results: 0,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw response from GET /movie/{id}?append_to_response=videos,credits
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub videos: Option<TmdbVideoList>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// Raw response from GET /movie/{id}/videos, also the embedded `videos` block
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

/// Raw response from GET /genre/movie/list
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    pub genres: Vec<Genre>,
}

impl From<TmdbMovieDetails> for MovieDetail {
    fn from(raw: TmdbMovieDetails) -> Self {
        let summary = MovieSummary {
            id: raw.id,
            title: raw.title,
            poster_path: raw.poster_path,
            release_date: raw.release_date.unwrap_or_default(),
            vote_average: raw.vote_average,
            genre_ids: raw.genres.iter().map(|g| g.id).collect(),
        };

        MovieDetail {
            summary,
            overview: raw.overview.unwrap_or_default(),
            runtime_minutes: raw.runtime.filter(|m| *m > 0),
            genres: raw.genres,
            backdrop_path: raw.backdrop_path,
            cast: raw.credits.map(|c| c.cast).unwrap_or_default(),
            videos: raw.videos.map(|v| v.results),
        }
    }
}
