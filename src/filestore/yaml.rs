//! YAML file store

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::filestore::{assert_file_readable, assert_file_writable, FileStore};

/// Block-style YAML mapping with explicit document start and end markers.
///
/// On load, every mapping document in the stream is merged in order;
/// non-mapping documents are ignored.
pub struct YamlFileStore {
    file: PathBuf,
    bindings: IndexMap<String, String>,
}

impl YamlFileStore {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            bindings: IndexMap::new(),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        _ => Err(SyncError::File(
            "Nested YAML values are not supported".to_string(),
        )),
    }
}

impl FileStore for YamlFileStore {
    fn load(&mut self) -> Result<()> {
        self.bindings.clear();
        if !self.file.exists() {
            return Ok(());
        }
        assert_file_readable(&self.file)?;

        let text = fs::read_to_string(&self.file)?;
        for document in serde_yaml::Deserializer::from_str(&text) {
            let value = serde_yaml::Value::deserialize(document)?;
            if let serde_yaml::Value::Mapping(mapping) = value {
                for (key, value) in &mapping {
                    self.bindings
                        .insert(scalar_to_string(key)?, scalar_to_string(value)?);
                }
            }
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        assert_file_writable(&self.file)?;
        let body = serde_yaml::to_string(&self.bindings)?;
        fs::write(&self.file, format!("---\n{body}...\n"))?;
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
