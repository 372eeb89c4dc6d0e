//! Local config file stores
//!
//! A file store binds an ordered string/string mapping to exactly one local
//! file. The encoding is selected purely by file extension: `.json`, `.yaml`
//! or `.yml`, and Java-style properties for everything else. All three share
//! the same flat load-or-empty / save semantics.

mod json;
mod properties;
mod yaml;

pub use json::JsonFileStore;
pub use properties::PropertiesFileStore;
pub use yaml::YamlFileStore;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Identifier for JSON files.
const EXT_JSON: &str = ".json";

/// Identifier for YAML files.
const EXT_YAML: &str = ".yaml";

/// Another identifier for yaml files.
const EXT_YML: &str = ".yml";

/// An ordered key/value mapping bound to one local file
pub trait FileStore {
    /// Load the mapping from disk, or start empty if the file is absent.
    fn load(&mut self) -> Result<()>;

    /// Persist the mapping back to disk in the file's format.
    fn save(&self) -> Result<()>;

    /// Keys in insertion order.
    fn keys(&self) -> Vec<String>;

    /// Value for a key, if present.
    fn value(&self, key: &str) -> Option<String>;

    /// Insert or replace a key/value pair.
    fn put_param(&mut self, key: &str, value: &str);

    /// The bound file path.
    fn path(&self) -> &Path;
}

/// Select a store implementation for `filename` under `conf_dir`.
pub fn open_store(conf_dir: &Path, filename: &str) -> Box<dyn FileStore> {
    let file: PathBuf = conf_dir.join(filename);
    if filename.ends_with(EXT_JSON) {
        Box::new(JsonFileStore::new(file))
    } else if filename.ends_with(EXT_YAML) || filename.ends_with(EXT_YML) {
        Box::new(YamlFileStore::new(file))
    } else {
        // serialize as properties by default
        Box::new(PropertiesFileStore::new(file))
    }
}

fn assert_file_readable(path: &Path) -> Result<()> {
    if path.exists() && path.is_dir() {
        return Err(SyncError::File(format!(
            "File exists but is not readable: {}",
            path.display()
        )));
    }
    Ok(())
}

fn assert_file_writable(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() || fs::metadata(path)?.permissions().readonly() {
            return Err(SyncError::File(format!(
                "File exists but is not writable: {}",
                path.display()
            )));
        }
    } else if fs::File::create(path).is_err() {
        return Err(SyncError::File(format!(
            "File could not be created: {}",
            path.display()
        )));
    }
    Ok(())
}
