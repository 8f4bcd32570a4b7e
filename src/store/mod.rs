pub mod favorites;
pub mod storage;

pub use favorites::FavoritesStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageKey};
