//! Keyed JSON entity store
//!
//! Provides an `EntityStore` that keeps many records in a single JSON file, one
//! record per top-level key. Writes replace a single key and leave every other
//! key untouched; `patch` layers a partial update on top of the stored record.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when reading or writing the entity store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key is not present in the store
    #[error("No cached entry for '{key}' in {}", path.display())]
    NotFound { path: PathBuf, key: String },

    /// Reading or writing the cache file failed
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The cache file or a record could not be (de)serialized
    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The cache file holds something other than a JSON object
    #[error("Cache file {} does not contain a top-level object", .0.display())]
    NotAnObject(PathBuf),
}

/// A JSON file mapping entity keys to records
///
/// The whole file is loaded and rewritten on every write. There is no locking,
/// so a store must not be shared between concurrently running processes.
#[derive(Debug, Clone)]
pub struct EntityStore {
    path: PathBuf,
}

impl EntityStore {
    /// Creates a store backed by the file at `path`
    ///
    /// The file is not touched until the first write.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for `file_name` inside `cache_dir`
    pub fn in_dir(cache_dir: &Path, file_name: &str) -> Self {
        Self::at(cache_dir.join(file_name))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether `key` has a record
    ///
    /// A missing file means no key exists. A file that exists but cannot be
    /// parsed is an error rather than an empty store.
    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .load()?
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false))
    }

    /// Reads and deserializes the record stored under `key`
    ///
    /// # Returns
    /// * `Ok(T)` if the key exists and its record matches `T`
    /// * `Err(StoreError::NotFound)` if the file or the key is absent
    pub fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self.read_value(key)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Replaces the record stored under `key`
    ///
    /// Records for every other key are preserved as they are. The record for
    /// `key` is overwritten as a whole, so fields missing from `record` are
    /// lost. Use [`EntityStore::patch`] to update only some fields.
    pub fn write_entry<T: Serialize + ?Sized>(&self, key: &str, record: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        let mut entries = self.load()?.unwrap_or_default();
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    /// Overlays `fields` onto the record stored under `key` and writes it back
    ///
    /// Top-level fields of the existing record that are not named in `fields`
    /// survive. If the key has no record yet, the new record holds exactly
    /// `fields`. Returns the merged record.
    pub fn patch(&self, key: &str, fields: Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
        let mut entries = self.load()?.unwrap_or_default();

        let mut record = match entries.remove(key) {
            Some(Value::Object(existing)) => existing,
            // Anything other than an object cannot carry fields; start over
            Some(_) | None => Map::new(),
        };
        for (field, value) in fields {
            record.insert(field, value);
        }

        entries.insert(key.to_string(), Value::Object(record.clone()));
        self.save(&entries)?;
        Ok(record)
    }

    /// Returns every key currently stored, in key order
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .load()?
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_value(&self, key: &str) -> Result<Value, StoreError> {
        self.load()?
            .and_then(|mut entries| entries.remove(key))
            .ok_or_else(|| StoreError::NotFound {
                path: self.path.clone(),
                key: key.to_string(),
            })
    }

    /// Loads the whole file, or `None` if it does not exist yet
    fn load(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content)? {
            Value::Object(entries) => Ok(Some(entries)),
            _ => Err(StoreError::NotAnObject(self.path.clone())),
        }
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_store() -> (EntityStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = EntityStore::in_dir(temp_dir.path(), "entities.json");
        (store, temp_dir)
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_exists_is_false_when_file_is_missing() {
        let (store, _temp_dir) = create_test_store();
        assert!(!store.exists("anything").unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_exists_checks_top_level_keys() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("test", &json!({"a": 1, "b": 2})).unwrap();

        assert!(store.exists("test").unwrap());
        assert!(!store.exists("a").unwrap());
        assert!(!store.exists("other").unwrap());
    }

    #[test]
    fn test_read_entry_missing_key_is_not_found() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("present", &json!({})).unwrap();

        match store.read_entry::<Value>("absent") {
            Err(StoreError::NotFound { key, .. }) => assert_eq!(key, "absent"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_read_entry_missing_file_is_not_found() {
        let (store, _temp_dir) = create_test_store();
        assert!(matches!(
            store.read_entry::<Value>("absent"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_write_then_read_typed_record() {
        let (store, _temp_dir) = create_test_store();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        store.write_entry("key", &data).unwrap();
        let read: TestData = store.read_entry("key").unwrap();

        assert_eq!(read, data);
    }

    #[test]
    fn test_write_preserves_other_keys() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("a", &json!({"url": "a-url", "stores": [1, 2]})).unwrap();
        store.write_entry("b", &json!({"url": "b-url"})).unwrap();
        store.write_entry("b", &json!({"url": "b-url-2"})).unwrap();

        let a: Value = store.read_entry("a").unwrap();
        assert_eq!(a, json!({"url": "a-url", "stores": [1, 2]}));
        let b: Value = store.read_entry("b").unwrap();
        assert_eq!(b, json!({"url": "b-url-2"}));
    }

    #[test]
    fn test_write_replaces_whole_record_for_key() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("a", &json!({"lat": 1.0, "commute": {"walking": {}}})).unwrap();
        store.write_entry("a", &json!({"lat": 2.0})).unwrap();

        let a: Value = store.read_entry("a").unwrap();
        assert_eq!(a, json!({"lat": 2.0}));
    }

    #[test]
    fn test_patch_keeps_fields_not_being_updated() {
        let (store, _temp_dir) = create_test_store();
        store
            .write_entry("a", &json!({"lat": 1.0, "stores": [{"name": "x"}]}))
            .unwrap();

        let merged = store.patch("a", fields(json!({"lat": 3.0, "price": "$10"}))).unwrap();

        let expected = json!({"lat": 3.0, "price": "$10", "stores": [{"name": "x"}]});
        assert_eq!(Value::Object(merged), expected);
        assert_eq!(store.read_entry::<Value>("a").unwrap(), expected);
    }

    #[test]
    fn test_patch_creates_missing_record_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache");
        let store = EntityStore::in_dir(&nested, "entities.json");

        store.patch("new", fields(json!({"url": "u"}))).unwrap();

        assert!(nested.join("entities.json").exists());
        assert_eq!(store.read_entry::<Value>("new").unwrap(), json!({"url": "u"}));
    }

    #[test]
    fn test_patch_does_not_touch_sibling_records() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("b", &json!({"commute": {"transit": {"duration_minutes": 5}}})).unwrap();
        let before: Value = store.read_entry("b").unwrap();

        store.patch("a", fields(json!({"stores": []}))).unwrap();

        assert_eq!(store.read_entry::<Value>("b").unwrap(), before);
    }

    #[test]
    fn test_file_is_pretty_printed_utf8() {
        let (store, _temp_dir) = create_test_store();
        store.write_entry("Café #2", &json!({"neighborhood": "Nolita"})).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\"Café #2\""));
        assert!(content.contains('\n'));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.path(), "{ invalid json }").unwrap();

        assert!(matches!(store.exists("a"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_non_object_file_is_an_error() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert!(matches!(store.exists("a"), Err(StoreError::NotAnObject(_))));
    }

    #[test]
    fn test_keys_lists_entries() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.keys().unwrap().is_empty());

        store.write_entry("b", &json!({})).unwrap();
        store.write_entry("a", &json!({})).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
