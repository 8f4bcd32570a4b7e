use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::GenreId;

/// Highest value on the raw rating scale
pub const MAX_RATING: f64 = 10.0;

/// User-selected filter criteria for a movie listing
///
/// Every field has a neutral value (`genres` empty, year bounds unset,
/// `rating_min` zero). `rating_min` is on the raw 0-10 scale even though
/// ratings are displayed halved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    #[serde(default)]
    pub genres: BTreeSet<GenreId>,
    #[serde(default)]
    pub year_from: Option<i32>,
    #[serde(default)]
    pub year_to: Option<i32>,
    #[serde(default)]
    pub rating_min: f64,
}

impl FilterCriteria {
    /// Criteria that filter nothing
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of fields away from their neutral value
    ///
    /// A genre selection counts once regardless of how many genres it holds.
    pub fn active_count(&self) -> usize {
        [
            !self.genres.is_empty(),
            self.year_from.is_some(),
            self.year_to.is_some(),
            self.rating_min > 0.0,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Returns a copy with `genre_id` added, or removed if already selected
    pub fn toggle_genre(&self, genre_id: GenreId) -> Self {
        let mut next = self.clone();
        if !next.genres.remove(&genre_id) {
            next.genres.insert(genre_id);
        }
        next
    }

    pub fn with_genres<I: IntoIterator<Item = GenreId>>(mut self, genres: I) -> Self {
        self.genres = genres.into_iter().collect();
        self
    }

    pub fn with_year_from(mut self, year: Option<i32>) -> Self {
        self.year_from = year;
        self
    }

    pub fn with_year_to(mut self, year: Option<i32>) -> Self {
        self.year_to = year;
        self
    }

    /// Sets the minimum raw rating, clamped into `[0, 10]`
    pub fn with_rating_min(mut self, rating: f64) -> Self {
        self.rating_min = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, MAX_RATING)
        };
        self
    }

    /// The rating minimum as shown next to the slider (0-5 scale)
    pub fn display_rating_min(&self) -> f64 {
        self.rating_min / 2.0
    }
}
