//! Local key-value persistence.
//!
//! The medium is abstracted behind [`KeyValueStore`] so the ingredient store can
//! run against files on disk or an in-memory map in tests.

mod file;
mod ingredients;
mod memory;

pub use file::FileStore;
pub use ingredients::{IngredientStore, SAVED_INGREDIENTS_KEY};
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// String key to string value storage, one value per key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Where local data lives.
///
/// `PANTRYCHEF_DATA_DIR` overrides the default of `~/.pantrychef/storage`.
pub fn data_dir_from_env() -> PathBuf {
    std::env::var("PANTRYCHEF_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir())
}

/// Get the default data directory: ~/.pantrychef/storage
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pantrychef").join("storage"))
        .unwrap_or_else(|| PathBuf::from("data/storage"))
}
