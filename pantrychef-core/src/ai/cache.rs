//! Disk-based AI response cache.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Disk-based AI response cache.
pub struct AiCache {
    cache_dir: PathBuf,
}

/// A cached response with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAiResponse<T> {
    pub response: T,
    pub cached_at: DateTime<Utc>,
    pub model: String,
}

/// Cache key components.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub prompt_name: String,
    pub model: String,
    pub input_hash: String,
}

impl CacheKey {
    /// Create a key from the prompt name, model and the serialized request.
    pub fn new<R: Serialize>(prompt_name: &str, model: &str, request: &R) -> Self {
        let input_json = serde_json::to_string(request).unwrap_or_default();
        let input_hash = sha256_hex(&input_json);

        Self {
            prompt_name: prompt_name.to_string(),
            model: model.to_string(),
            input_hash,
        }
    }

    /// Convert to a filesystem path relative to the cache directory.
    ///
    /// Format: {prompt_name}/{model_safe}/{hash[0:2]}/{hash}.json
    pub fn to_path(&self) -> PathBuf {
        let model_safe = self.model.replace(['/', ':'], "--");

        PathBuf::new()
            .join(&self.prompt_name)
            .join(&model_safe)
            .join(&self.input_hash[..2])
            .join(format!("{}.json", &self.input_hash))
    }
}

impl AiCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get a cached response if it exists and parses.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CachedAiResponse<T>> {
        let path = self.cache_dir.join(key.to_path());

        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            serde_json::from_str(&content).ok()
        } else {
            None
        }
    }

    /// Store a response in the cache.
    pub fn put<T: Serialize>(&self, key: &CacheKey, response: &T) -> std::io::Result<()> {
        let path = self.cache_dir.join(key.to_path());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let cached = CachedAiResponse {
            response,
            cached_at: Utc::now(),
            model: key.model.clone(),
        };

        let json = serde_json::to_string(&cached)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&path, json)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        if !self.cache_dir.exists() {
            return stats;
        }

        fn count_json_files(dir: &std::path::Path, count: &mut usize) {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.filter_map(|e| e.ok()) {
                    let path = entry.path();
                    if path.is_dir() {
                        count_json_files(&path, count);
                    } else if path.extension().is_some_and(|ext| ext == "json") {
                        *count += 1;
                    }
                }
            }
        }

        count_json_files(&self.cache_dir, &mut stats.cached_responses);
        stats
    }

    /// Clear all cached responses.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub cached_responses: usize,
}

/// Compute SHA256 hash and return as hex string.
fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key_path() {
        let key = CacheKey::new("recipe", "models/gemini:flash", &"test");

        let path = key.to_path();
        assert!(path.starts_with("recipe/models--gemini--flash/"));
        assert!(path.to_string_lossy().ends_with(".json"));
    }

    #[test]
    fn test_put_get_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = AiCache::new(dir.path().join("ai"));
        let key = CacheKey::new("recipe", "gemini-2.5-flash", &vec!["eggs"]);

        assert!(cache.get::<String>(&key).is_none());
        cache.put(&key, &"cached text".to_string()).unwrap();

        let cached = cache.get::<String>(&key).unwrap();
        assert_eq!(cached.response, "cached text");
        assert_eq!(cached.model, "gemini-2.5-flash");
        assert_eq!(cache.stats().cached_responses, 1);

        cache.clear().unwrap();
        assert_eq!(cache.stats().cached_responses, 0);
    }

    #[test]
    fn test_different_inputs_different_keys() {
        let a = CacheKey::new("recipe", "m", &vec!["eggs"]);
        let b = CacheKey::new("recipe", "m", &vec!["flour"]);
        assert_ne!(a.input_hash, b.input_hash);
    }
}
