use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::models::{MovieId, MovieSummary};
use crate::store::storage::{KeyValueStorage, StorageKey};

/// Ordered favorites, unique by movie id
#[derive(Debug, Default)]
struct FavoritesInner {
    entries: Vec<MovieSummary>,
    ids: HashSet<MovieId>,
}

impl FavoritesInner {
    fn from_entries(entries: Vec<MovieSummary>) -> Self {
        let mut inner = Self::default();
        for entry in entries {
            if inner.ids.insert(entry.id) {
                inner.entries.push(entry);
            }
        }
        inner
    }
}

/// Persisted favorites list
///
/// Loaded once from storage on construction. Every mutation writes the full
/// list back synchronously and then notifies subscribers. Storage failures are
/// logged and otherwise ignored: the in-memory list stays authoritative for the
/// session.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
    inner: RwLock<FavoritesInner>,
    changes: watch::Sender<Vec<MovieSummary>>,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("len", &self.len())
            .finish()
    }
}

impl FavoritesStore {
    /// Loads favorites from storage; an absent or unreadable slot yields an empty list
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let entries = Self::read_entries(storage.as_ref());
        tracing::info!(count = entries.len(), "Loaded favorites");

        let inner = FavoritesInner::from_entries(entries);
        let (changes, _) = watch::channel(inner.entries.clone());

        Self {
            storage,
            inner: RwLock::new(inner),
            changes,
        }
    }

    fn read_entries(storage: &dyn KeyValueStorage) -> Vec<MovieSummary> {
        let raw = match storage.get(StorageKey::Favorites) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read favorites, starting empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Corrupt favorites slot, starting empty");
            Vec::new()
        })
    }

    /// Appends `movie` unless a favorite with the same id exists
    ///
    /// Returns true when the list changed.
    pub fn add_favorite(&self, movie: MovieSummary) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.ids.insert(movie.id) {
            return false;
        }

        tracing::debug!(movie_id = movie.id, title = %movie.title, "Favorite added");
        inner.entries.push(movie);
        self.commit(&inner);
        true
    }

    /// Removes the favorite with `movie_id`; absent ids are a no-op
    ///
    /// Returns true when the list changed.
    pub fn remove_favorite(&self, movie_id: MovieId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.ids.remove(&movie_id) {
            return false;
        }

        inner.entries.retain(|m| m.id != movie_id);
        tracing::debug!(movie_id = movie_id, "Favorite removed");
        self.commit(&inner);
        true
    }

    /// Adds `movie` when absent, removes it when present
    ///
    /// Returns whether the movie is a favorite afterwards.
    pub fn toggle_favorite(&self, movie: MovieSummary) -> bool {
        if self.is_favorite(movie.id) {
            self.remove_favorite(movie.id);
            false
        } else {
            self.add_favorite(movie);
            true
        }
    }

    pub fn is_favorite(&self, movie_id: MovieId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ids
            .contains(&movie_id)
    }

    /// Snapshot of the favorites in insertion order
    pub fn favorites(&self) -> Vec<MovieSummary> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver woken after every mutation with the new list
    pub fn subscribe(&self) -> watch::Receiver<Vec<MovieSummary>> {
        self.changes.subscribe()
    }

    /// Persists and publishes the state; called with the write lock held
    fn commit(&self, inner: &FavoritesInner) {
        match serde_json::to_string(&inner.entries) {
            Ok(json) => {
                if let Err(e) = self.storage.set(StorageKey::Favorites, &json) {
                    tracing::warn!(error = %e, "Failed to persist favorites");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Favorites serialization error"),
        }

        self.changes.send_replace(inner.entries.clone());
    }
}
