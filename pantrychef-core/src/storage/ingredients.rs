//! The saved ingredient list: one versioned record in a key-value store.

use chrono::Utc;

use super::KeyValueStore;
use crate::error::{PersistenceReadError, StorageError};
use crate::types::SavedIngredients;

/// Key of the single saved-ingredients record. Bump the suffix if the shape changes.
pub const SAVED_INGREDIENTS_KEY: &str = "savedIngredients_v1";

/// Save, load and clear the saved ingredient list.
pub struct IngredientStore<S> {
    store: S,
}

impl<S: KeyValueStore> IngredientStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Save `ingredients`, replacing any previous record. Empty lists are allowed.
    pub fn save(&self, ingredients: &[String]) -> Result<SavedIngredients, StorageError> {
        let record = SavedIngredients::new(ingredients.to_vec(), Utc::now().timestamp_millis());
        let json = serde_json::to_string(&record)?;
        self.store.set(SAVED_INGREDIENTS_KEY, &json)?;

        tracing::debug!(count = record.count, "Saved ingredients");
        Ok(record)
    }

    /// Load the saved record.
    ///
    /// A missing or unreadable record is `None`; corrupt local state never blocks the user.
    pub fn load(&self) -> Option<SavedIngredients> {
        match self.read() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable saved ingredients");
                None
            }
        }
    }

    /// Remove the saved record. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(SAVED_INGREDIENTS_KEY)?;
        tracing::debug!("Cleared saved ingredients");
        Ok(())
    }

    fn read(&self) -> Result<Option<SavedIngredients>, PersistenceReadError> {
        let Some(json) = self.store.get(SAVED_INGREDIENTS_KEY)? else {
            return Ok(None);
        };

        let mut record: SavedIngredients = serde_json::from_str(&json)?;
        if record.count != record.ingredients.len() {
            tracing::debug!(
                stored = record.count,
                actual = record.ingredients.len(),
                "Saved ingredient count out of date, recomputing"
            );
            record.count = record.ingredients.len();
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_save_then_load() {
        let store = IngredientStore::new(MemoryStore::new());
        let saved = store.save(&list(&["salt", "pepper"])).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.ingredients, list(&["salt", "pepper"]));
        assert_eq!(loaded.count, 2);
    }

    #[test]
    fn test_save_empty_list() {
        let store = IngredientStore::new(MemoryStore::new());
        store.save(&[]).unwrap();
        assert_eq!(store.load().unwrap().count, 0);
    }

    #[test]
    fn test_save_overwrites() {
        let store = IngredientStore::new(MemoryStore::new());
        store.save(&list(&["salt"])).unwrap();
        store.save(&list(&["basil", "garlic"])).unwrap();
        assert_eq!(store.load().unwrap().ingredients, list(&["basil", "garlic"]));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = IngredientStore::new(MemoryStore::new());
        store.save(&list(&["salt"])).unwrap();

        store.clear().unwrap();
        assert!(store.load().is_none());
        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_malformed_record_loads_as_none() {
        let memory = MemoryStore::new();
        memory.set(SAVED_INGREDIENTS_KEY, "{not json").unwrap();
        let store = IngredientStore::new(memory);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_wrong_shape_loads_as_none() {
        let memory = MemoryStore::new();
        memory
            .set(SAVED_INGREDIENTS_KEY, r#"{"ingredients": "salt", "timestamp": 1}"#)
            .unwrap();
        let store = IngredientStore::new(memory);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_stale_count_is_recomputed() {
        let memory = MemoryStore::new();
        memory
            .set(
                SAVED_INGREDIENTS_KEY,
                r#"{"ingredients": ["salt", "pepper"], "timestamp": 1700000000000, "count": 5}"#,
            )
            .unwrap();
        let store = IngredientStore::new(memory);
        assert_eq!(store.load().unwrap().count, 2);
    }

    #[test]
    fn test_missing_count_is_recomputed() {
        let memory = MemoryStore::new();
        memory
            .set(
                SAVED_INGREDIENTS_KEY,
                r#"{"ingredients": ["salt", "pepper", "basil"], "timestamp": 1700000000000}"#,
            )
            .unwrap();
        let store = IngredientStore::new(memory);

        let record = store.load().unwrap();
        assert_eq!(record.count, 3);
        assert_eq!(record.ingredients, list(&["salt", "pepper", "basil"]));
    }

    #[test]
    fn test_record_wire_format() {
        let memory = MemoryStore::new();
        let store = IngredientStore::new(memory);
        store.save(&list(&["salt"])).unwrap();

        let json = store.store.get(SAVED_INGREDIENTS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ingredients"][0], "salt");
        assert_eq!(value["count"], 1);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
