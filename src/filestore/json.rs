//! JSON file store

use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Result, SyncError};
use crate::filestore::{assert_file_readable, assert_file_writable, FileStore};

/// Flat string/string object, pretty-printed on save.
pub struct JsonFileStore {
    file: PathBuf,
    bindings: IndexMap<String, String>,
}

impl JsonFileStore {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            bindings: IndexMap::new(),
        }
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok("null".to_string()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(SyncError::File(
            "Nested JSON values are not supported".to_string(),
        )),
    }
}

impl FileStore for JsonFileStore {
    fn load(&mut self) -> Result<()> {
        self.bindings.clear();
        if !self.file.exists() {
            return Ok(());
        }
        assert_file_readable(&self.file)?;

        let reader = BufReader::new(fs::File::open(&self.file)?);
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        let object = value.as_object().ok_or_else(|| {
            SyncError::File(format!(
                "Expected a top-level JSON object in {}",
                self.file.display()
            ))
        })?;

        for (key, value) in object {
            self.bindings.insert(key.clone(), scalar_to_string(value)?);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        assert_file_writable(&self.file)?;
        let mut file = fs::File::create(&self.file)?;
        serde_json::to_writer_pretty(&mut file, &self.bindings)?;
        file.write_all(b"\n")?;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    fn value(&self, key: &str) -> Option<String> {
        self.bindings.get(key).cloned()
    }

    fn put_param(&mut self, key: &str, value: &str) {
        self.bindings.insert(key.to_string(), value.to_string());
    }

    fn path(&self) -> &Path {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn save_then_load_preserves_order_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");

        let mut store = JsonFileStore::new(file.clone());
        store.put_param("zeta", "1");
        store.put_param("alpha", "two words");
        store.put_param("blank", "");
        store.save().unwrap();

        let mut reloaded = JsonFileStore::new(file);
        reloaded.load().unwrap();
        assert_eq!(
            reloaded.keys(),
            vec!["zeta".to_string(), "alpha".to_string(), "blank".to_string()]
        );
        assert_eq!(reloaded.value("alpha").as_deref(), Some("two words"));
        assert_eq!(reloaded.value("blank").as_deref(), Some(""));
    }

    #[test]
    fn non_string_scalars_are_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        fs::write(&file, r#"{"port": 8080, "debug": true, "nothing": null}"#).unwrap();

        let mut store = JsonFileStore::new(file);
        store.load().unwrap();
        assert_eq!(store.value("port").as_deref(), Some("8080"));
        assert_eq!(store.value("debug").as_deref(), Some("true"));
        assert_eq!(store.value("nothing").as_deref(), Some("null"));
    }

    #[test]
    fn nested_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        fs::write(&file, r#"{"nested": {"a": 1}}"#).unwrap();

        let mut store = JsonFileStore::new(file);
        assert!(matches!(store.load(), Err(SyncError::File(_))));
    }

    #[test]
    fn top_level_array_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        fs::write(&file, "[1, 2]").unwrap();

        let mut store = JsonFileStore::new(file);
        assert!(matches!(store.load(), Err(SyncError::File(_))));
    }
}
