use crate::models::{FilterCriteria, MovieSummary};

/// Returns true when `movie` satisfies every active criterion
///
/// A movie whose release date does not parse has no year and fails any active
/// year bound. Ratings compare on the raw 0-10 scale.
pub fn matches(movie: &MovieSummary, criteria: &FilterCriteria) -> bool {
    if !criteria.genres.is_empty() && criteria.genres.is_disjoint(&movie.genre_ids) {
        return false;
    }

    let year = movie.release_year();
    if let Some(from) = criteria.year_from {
        if !year.is_some_and(|y| y >= from) {
            return false;
        }
    }
    if let Some(to) = criteria.year_to {
        if !year.is_some_and(|y| y <= to) {
            return false;
        }
    }

    if criteria.rating_min > 0.0 && movie.vote_average < criteria.rating_min {
        return false;
    }

    true
}

/// Projects `movies` onto the subset passing `criteria`, preserving order
pub fn filter_movies(movies: &[MovieSummary], criteria: &FilterCriteria) -> Vec<MovieSummary> {
    if criteria.is_neutral() {
        return movies.to_vec();
    }

    let visible: Vec<MovieSummary> = movies
        .iter()
        .filter(|movie| matches(movie, criteria))
        .cloned()
        .collect();

    tracing::debug!(
        input = movies.len(),
        visible = visible.len(),
        active_filters = criteria.active_count(),
        "Applied movie filters"
    );

    visible
}

/// Drops entries without a poster image
pub fn with_posters(movies: Vec<MovieSummary>) -> Vec<MovieSummary> {
    movies.into_iter().filter(MovieSummary::has_poster).collect()
}
