//! Key-value backends the local store persists through.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::debug;

use super::StorageError;

/// Durable string storage under fixed keys.
///
/// Mirrors what a browser or device key-value store offers: get, set and
/// remove of text values. Every call can fail; callers decide whether a
/// failure matters.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process backend. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &path)
        };
        write().inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })?;

        debug!(key, bytes = value.len(), "Wrote storage key");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Turn a storage key into a safe file name.
/// Replaces problematic characters with underscores.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("attihc:days"), "attihc_days");
        assert_eq!(sanitize_key("plain"), "plain");
        assert_eq!(sanitize_key("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_backend_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("store")).unwrap();

        assert_eq!(backend.get("attihc:days").unwrap(), None);
        backend.set("attihc:days", "{}").unwrap();
        assert!(temp_dir.path().join("store/attihc_days.json").exists());
        assert_eq!(backend.get("attihc:days").unwrap().as_deref(), Some("{}"));

        backend.set("attihc:days", r#"{"a":1}"#).unwrap();
        assert_eq!(
            backend.get("attihc:days").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert!(!temp_dir.path().join("store/attihc_days.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();

        // A non-empty directory where the record should go makes the rename fail
        let blocker = temp_dir.path().join("attihc_days.json");
        fs::create_dir_all(blocker.join("inner")).unwrap();

        assert!(backend.set("attihc:days", "{}").is_err());
        assert!(!temp_dir.path().join("attihc_days.tmp").exists());
    }

    #[test]
    fn test_file_backend_remove_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        backend.remove("attihc:settings").unwrap();
        backend.set("attihc:settings", "{}").unwrap();
        backend.remove("attihc:settings").unwrap();
        assert_eq!(backend.get("attihc:settings").unwrap(), None);
    }
}
