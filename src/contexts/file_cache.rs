use crate::data::Cache;
use std::fs;
use std::path::PathBuf;

/// FileCache stores level 2 model responses on disk so repeated runs over
/// the same instruction set do not pay for the same calls twice.
///
/// The cache is organized as `{folder}/responses/{key}.cache` where key is
/// the hex-encoded hash of model name + prompt, already safe for file
/// names.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// The root folder path for the cache (defaults to ".relay")
    folder: String,
}

impl FileCache {
    /// Creates a new FileCache instance
    ///
    /// # Arguments
    /// * `folder` - Optional root folder path. If None, defaults to ".relay"
    pub fn new(folder: Option<String>) -> Self {
        Self {
            folder: folder.unwrap_or_else(|| ".relay".to_string()),
        }
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir().join(format!("{}.cache", key))
    }

    fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.folder).join("responses")
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.cache_path(key)) {
            Ok(contents) => Some(contents),
            Err(_) => {
                // File not found or read error - treat as cache miss
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let dir = self.cache_dir();
        if let Err(e) = fs::create_dir_all(&dir) {
            eprintln!("Failed to create cache directory {:?}: {}", dir, e);
            return;
        }
        let path = self.cache_path(key);
        if let Err(e) = fs::write(&path, value) {
            eprintln!("Failed to write cache file {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_path_construction() {
        let cache = FileCache::new(Some("/tmp/cache".to_string()));
        let path = cache.cache_path("abc123");
        assert_eq!(path.to_str().unwrap(), "/tmp/cache/responses/abc123.cache");
    }

    #[test]
    fn test_cache_get_set() {
        let test_dir = format!("/tmp/relay_cache_test_{}", std::process::id());
        let cache = FileCache::new(Some(test_dir.clone()));

        assert_eq!(cache.get("nonexistent"), None);

        cache.set("test_key", "test_value");
        assert_eq!(cache.get("test_key"), Some("test_value".to_string()));

        cache.set("test_key", "new_value");
        assert_eq!(cache.get("test_key"), Some("new_value".to_string()));

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_default_folder() {
        let cache = FileCache::new(None);
        assert_eq!(cache.folder, ".relay");
    }
}
