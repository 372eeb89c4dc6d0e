//! Sync engine
//!
//! Orchestrates GET/PUT/DELETE/CLEAR between the remote parameter store and
//! the local file stores. One operation per run, strictly sequential remote
//! calls, fail-fast on the first error: a failure mid-run leaves remote state
//! partially modified and earlier files' saves on disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use indexmap::IndexMap;

use crate::alias::{AliasDirectory, AliasSource};
use crate::batch::{chunks, DELETE_BATCH_MAX};
use crate::codec::{escape_value_before_put, unescape_value_after_get};
use crate::error::{Result, SyncError};
use crate::filestore::{open_store, FileStore};
use crate::path::build_parameter_path;
use crate::remote::{
    find_all_parameters_for_path, ParameterKind, ParameterStore, PutRequest,
};

/// Key suffix for serializing KMS key ids alongside SecureString values.
///
/// A key carrying this suffix is a sidecar for its base key, never a synced
/// value in its own right.
pub const KEY_ID_SUFFIX: &str = "_SecureStringKeyId";

/// Default page size for the list-by-path call. The API accepts 1 to 10.
pub const DEFAULT_FETCH_SIZE: i32 = 10;

/// Operation to be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Put,
    Delete,
    Clear,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Put => "put",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
        }
    }
}

/// Per-run sync settings
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directory holding the local config files.
    pub conf_dir: std::path::PathBuf,
    /// Filenames to sync, relative to `conf_dir`, in configured order.
    pub filenames: Vec<String>,
    /// Remote path prefixes, in configured order. GET merges across all of
    /// them; PUT/DELETE/CLEAR require exactly one.
    pub path_prefixes: Vec<String>,
    /// Page size for remote listing calls.
    pub fetch_size: i32,
    /// Pass the overwrite flag on puts.
    pub overwrite_put: bool,
    /// Encrypt every put with this key id or alias.
    pub key_id_put_all: Option<String>,
    /// Leave secure values out of local files on GET.
    pub no_store_secure_string: bool,
    /// Skip keys with a sidecar key id on PUT.
    pub no_put_secure_string: bool,
    /// Wipe the target path before pushing.
    pub clear_on_put: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            conf_dir: std::path::PathBuf::from("."),
            filenames: Vec::new(),
            path_prefixes: Vec::new(),
            fetch_size: DEFAULT_FETCH_SIZE,
            overwrite_put: false,
            key_id_put_all: None,
            no_store_secure_string: false,
            no_put_secure_string: false,
            clear_on_put: false,
        }
    }
}

/// One-shot sync engine bound to a remote store and an alias source.
pub struct SyncEngine<S, A> {
    remote: S,
    alias_source: A,
    options: SyncOptions,
}

impl<S: ParameterStore, A: AliasSource> SyncEngine<S, A> {
    pub fn new(remote: S, alias_source: A, options: SyncOptions) -> Self {
        Self {
            remote,
            alias_source,
            options,
        }
    }

    /// Consume the engine and hand back the remote store.
    pub fn into_remote(self) -> S {
        self.remote
    }

    /// Run a single operation against all configured files and prefixes.
    pub async fn run(&self, operation: Operation) -> Result<()> {
        self.prepare_conf_dir(operation)?;

        let mut stores: IndexMap<String, Box<dyn FileStore>> = IndexMap::new();
        for filename in self.resolved_filenames() {
            let mut store = open_store(&self.options.conf_dir, &filename);
            store.load()?;
            stores.insert(filename, store);
        }

        // The alias directory is only worth a remote sweep when secure
        // values are actually handled; otherwise an empty directory serves
        // the same lookups via its fallbacks.
        let aliases = if self.needs_alias_directory(operation) {
            AliasDirectory::build(&self.alias_source).await?
        } else {
            AliasDirectory::default()
        };

        match operation {
            Operation::Get => self.do_get(&mut stores, &aliases).await,
            Operation::Put => self.do_put(&mut stores, &aliases).await,
            Operation::Delete => self.do_delete(&stores).await,
            Operation::Clear => self.do_clear(&stores).await,
        }
    }

    fn needs_alias_directory(&self, operation: Operation) -> bool {
        match operation {
            Operation::Get => !self.options.no_store_secure_string,
            Operation::Put => !self.options.no_put_secure_string,
            Operation::Delete | Operation::Clear => false,
        }
    }

    /// GET may create the conf directory; everything else requires it to
    /// already exist.
    fn prepare_conf_dir(&self, operation: Operation) -> Result<()> {
        let conf_dir = &self.options.conf_dir;
        if operation == Operation::Get {
            fs::create_dir_all(conf_dir).map_err(|e| {
                SyncError::Config(format!(
                    "Insufficient permissions to manage conf directory {}: {e}",
                    conf_dir.display()
                ))
            })?;
            if fs::metadata(conf_dir)?.permissions().readonly() {
                return Err(SyncError::Config(format!(
                    "Insufficient permissions to manage conf directory {}",
                    conf_dir.display()
                )));
            }
        } else if !conf_dir.is_dir() {
            return Err(SyncError::Config(format!(
                "Failed to read conf directory {}",
                conf_dir.display()
            )));
        }
        Ok(())
    }

    /// Normalize configured filenames and drop any that would escape the
    /// conf directory.
    fn resolved_filenames(&self) -> Vec<String> {
        let mut resolved = Vec::new();
        for filename in &self.options.filenames {
            match resolve_filename(filename) {
                Some(name) => resolved.push(name),
                None => {
                    tracing::warn!("Skipping filename outside conf directory: {filename}");
                }
            }
        }
        resolved
    }

    fn single_prefix(&self, operation: Operation) -> Result<&str> {
        match self.options.path_prefixes.as_slice() {
            [prefix] => Ok(prefix),
            _ => Err(SyncError::Config(format!(
                "{} command requires exactly one -s/--starts-with argument",
                operation.as_str()
            ))),
        }
    }

    // -----------
    // GET methods
    // -----------

    async fn do_get(
        &self,
        stores: &mut IndexMap<String, Box<dyn FileStore>>,
        aliases: &AliasDirectory,
    ) -> Result<()> {
        for (filename, store) in stores.iter_mut() {
            for prefix in &self.options.path_prefixes {
                let parameter_path =
                    build_parameter_path(Some(prefix.as_str()), Some(filename.as_str()), None);
                self.get_params_for_path(&parameter_path, store.as_mut(), aliases)
                    .await?;
            }
            // Never create or truncate a file for an empty result set.
            if !store.keys().is_empty() {
                store.save()?;
                tracing::info!(
                    "Saved {} keys to {}",
                    store.keys().len(),
                    store.path().display()
                );
            }
        }
        Ok(())
    }

    async fn get_params_for_path(
        &self,
        parameter_path: &str,
        store: &mut dyn FileStore,
        aliases: &AliasDirectory,
    ) -> Result<()> {
        let records =
            find_all_parameters_for_path(&self.remote, parameter_path, self.options.fetch_size)
                .await?;
        let child_prefix = format!("{parameter_path}/");

        for record in records.values() {
            // The listing can include the `$` root marker entry itself.
            if !record.name.starts_with(&child_prefix) {
                continue;
            }
            let store_key = &record.name[child_prefix.len()..];

            if record.kind == ParameterKind::SecureString && self.options.no_store_secure_string {
                continue;
            }
            store.put_param(store_key, &unescape_value_after_get(&record.value));

            if record.kind == ParameterKind::SecureString {
                if let Some(key_id) = self.remote.describe_key_id(&record.name).await? {
                    store.put_param(
                        &format!("{store_key}{KEY_ID_SUFFIX}"),
                        &aliases.alias_for_key_id(&key_id),
                    );
                }
            }
        }
        Ok(())
    }

    // -----------
    // PUT methods
    // -----------

    async fn do_put(
        &self,
        stores: &mut IndexMap<String, Box<dyn FileStore>>,
        aliases: &AliasDirectory,
    ) -> Result<()> {
        let prefix = self.single_prefix(Operation::Put)?.to_string();
        for (filename, store) in stores.iter_mut() {
            self.put_params_per_file(filename, &prefix, store.as_mut(), aliases)
                .await?;
        }
        Ok(())
    }

    async fn put_params_per_file(
        &self,
        filename: &str,
        prefix: &str,
        store: &mut dyn FileStore,
        aliases: &AliasDirectory,
    ) -> Result<()> {
        if self.options.clear_on_put {
            self.clear_params_per_file(filename, prefix).await?;
        }

        let keys: Vec<String> = store
            .keys()
            .into_iter()
            .filter(|key| !key.ends_with(KEY_ID_SUFFIX))
            .collect();

        for key in keys {
            let sidecar_key = format!("{key}{KEY_ID_SUFFIX}");
            let sidecar_key_id = store.value(&sidecar_key);
            if self.options.no_put_secure_string && sidecar_key_id.is_some() {
                continue;
            }
            let Some(value) = store.value(&key) else {
                continue;
            };

            let name = build_parameter_path(Some(prefix), Some(filename), Some(key.as_str()));
            // First-present wins: the global key id, then the per-key sidecar.
            let key_id = self
                .options
                .key_id_put_all
                .clone()
                .or(sidecar_key_id)
                .map(|raw| aliases.deref_alias(&raw));
            let kind = if key_id.is_some() {
                ParameterKind::SecureString
            } else {
                ParameterKind::String
            };

            self.remote
                .put_parameter(PutRequest {
                    name: name.clone(),
                    value: escape_value_before_put(&value),
                    kind,
                    key_id,
                    overwrite: self.options.overwrite_put,
                })
                .await?;
            tracing::info!("Put parameter {name}");
        }
        Ok(())
    }

    // --------------
    // DELETE methods
    // --------------

    async fn do_delete(&self, stores: &IndexMap<String, Box<dyn FileStore>>) -> Result<()> {
        let prefix = self.single_prefix(Operation::Delete)?.to_string();
        for (filename, store) in stores.iter() {
            self.delete_params_per_file(filename, &prefix, store.as_ref())
                .await?;
        }
        Ok(())
    }

    /// Delete only the remote entries that correspond to a locally-known key.
    async fn delete_params_per_file(
        &self,
        filename: &str,
        prefix: &str,
        store: &dyn FileStore,
    ) -> Result<()> {
        let parameter_path = build_parameter_path(Some(prefix), Some(filename), None);

        let local_names: HashSet<String> = store
            .keys()
            .iter()
            .filter(|key| !key.ends_with(KEY_ID_SUFFIX))
            .map(|key| build_parameter_path(Some(prefix), Some(filename), Some(key.as_str())))
            .collect();

        let records =
            find_all_parameters_for_path(&self.remote, &parameter_path, self.options.fetch_size)
                .await?;
        let to_delete: Vec<String> = records
            .values()
            .map(|record| record.name.clone())
            .filter(|name| local_names.contains(name))
            .collect();

        self.delete_in_batches(&to_delete).await
    }

    // --------------
    // CLEAR methods
    // --------------

    async fn do_clear(&self, stores: &IndexMap<String, Box<dyn FileStore>>) -> Result<()> {
        let prefix = self.single_prefix(Operation::Clear)?.to_string();
        for filename in stores.keys() {
            self.clear_params_per_file(filename, &prefix).await?;
        }
        Ok(())
    }

    /// Delete every remote entry under the path, regardless of local content.
    async fn clear_params_per_file(&self, filename: &str, prefix: &str) -> Result<()> {
        let parameter_path = build_parameter_path(Some(prefix), Some(filename), None);
        let child_prefix = format!("{parameter_path}/");

        let records =
            find_all_parameters_for_path(&self.remote, &parameter_path, self.options.fetch_size)
                .await?;
        let to_delete: Vec<String> = records
            .values()
            .map(|record| record.name.clone())
            .filter(|name| name.starts_with(&child_prefix))
            .collect();

        self.delete_in_batches(&to_delete).await
    }

    // --------------
    // common methods
    // --------------

    async fn delete_in_batches(&self, names: &[String]) -> Result<()> {
        for batch in chunks(names, DELETE_BATCH_MAX)? {
            if batch.is_empty() {
                continue;
            }
            self.remote.delete_parameters(batch.to_vec()).await?;
            tracing::info!("Deleted {} parameters", batch.len());
        }
        Ok(())
    }
}

/// Lexically normalize a configured filename. Returns `None` when the name
/// is absolute or climbs out of the conf directory.
fn resolve_filename(filename: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::alias::AliasEntry;
    use crate::remote::{ParameterPage, ParameterRecord};

    /// In-memory parameter store with offset-token pagination.
    #[derive(Default)]
    struct FakeStore {
        parameters: Mutex<IndexMap<String, (String, ParameterKind)>>,
        key_ids: Mutex<IndexMap<String, String>>,
        puts: Mutex<Vec<PutRequest>>,
        delete_batches: Mutex<Vec<Vec<String>>>,
    }

    impl FakeStore {
        fn insert(&self, name: &str, value: &str) {
            self.parameters
                .lock()
                .unwrap()
                .insert(name.to_string(), (value.to_string(), ParameterKind::String));
        }

        fn insert_secure(&self, name: &str, value: &str, key_id: &str) {
            self.parameters.lock().unwrap().insert(
                name.to_string(),
                (value.to_string(), ParameterKind::SecureString),
            );
            self.key_ids
                .lock()
                .unwrap()
                .insert(name.to_string(), key_id.to_string());
        }

        fn names(&self) -> Vec<String> {
            self.parameters.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl ParameterStore for FakeStore {
        async fn parameters_by_path(
            &self,
            path: &str,
            max_results: i32,
            next_token: Option<String>,
        ) -> Result<ParameterPage> {
            let child_prefix = format!("{path}/");
            let matching: Vec<ParameterRecord> = self
                .parameters
                .lock()
                .unwrap()
                .iter()
                .filter(|(name, _)| {
                    name.starts_with(&child_prefix)
                        && !name[child_prefix.len()..].contains('/')
                })
                .map(|(name, (value, kind))| ParameterRecord {
                    name: name.clone(),
                    value: value.clone(),
                    kind: *kind,
                })
                .collect();

            let offset: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (offset + max_results as usize).min(matching.len());
            let next_token = if end < matching.len() {
                Some(end.to_string())
            } else {
                None
            };
            Ok(ParameterPage {
                parameters: matching[offset..end].to_vec(),
                next_token,
            })
        }

        async fn put_parameter(&self, request: PutRequest) -> Result<()> {
            self.parameters.lock().unwrap().insert(
                request.name.clone(),
                (request.value.clone(), request.kind),
            );
            if let Some(key_id) = &request.key_id {
                self.key_ids
                    .lock()
                    .unwrap()
                    .insert(request.name.clone(), key_id.clone());
            }
            self.puts.lock().unwrap().push(request);
            Ok(())
        }

        async fn delete_parameters(&self, names: Vec<String>) -> Result<()> {
            assert!(names.len() <= DELETE_BATCH_MAX, "batch cap exceeded");
            let mut parameters = self.parameters.lock().unwrap();
            for name in &names {
                parameters.shift_remove(name);
            }
            self.delete_batches.lock().unwrap().push(names);
            Ok(())
        }

        async fn describe_key_id(&self, name: &str) -> Result<Option<String>> {
            Ok(self.key_ids.lock().unwrap().get(name).cloned())
        }
    }

    struct FakeAliases(Vec<AliasEntry>);

    #[async_trait]
    impl AliasSource for FakeAliases {
        async fn list_aliases(&self) -> Result<Vec<AliasEntry>> {
            Ok(self.0.clone())
        }
    }

    fn no_aliases() -> FakeAliases {
        FakeAliases(Vec::new())
    }

    fn engine_with(
        store: FakeStore,
        aliases: FakeAliases,
        options: SyncOptions,
    ) -> SyncEngine<FakeStore, FakeAliases> {
        SyncEngine::new(store, aliases, options)
    }

    fn options(conf_dir: &Path, filenames: &[&str], prefixes: &[&str]) -> SyncOptions {
        SyncOptions {
            conf_dir: conf_dir.to_path_buf(),
            filenames: filenames.iter().map(|s| s.to_string()).collect(),
            path_prefixes: prefixes.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn get_writes_remote_values_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store.insert("/ecs/dev/app/a", "1");
        store.insert("/ecs/dev/app/b", "2");

        let engine = engine_with(
            store,
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Get).await.unwrap();

        let mut reloaded = open_store(dir.path(), "app.properties");
        reloaded.load().unwrap();
        assert_eq!(reloaded.value("a").as_deref(), Some("1"));
        assert_eq!(reloaded.value("b").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn get_with_empty_result_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(
            FakeStore::default(),
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Get).await.unwrap();
        assert!(!dir.path().join("app.properties").exists());
    }

    #[tokio::test]
    async fn get_later_prefix_wins_for_duplicate_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store.insert("/ecs/dev/app/shared", "from-dev");
        store.insert("/ecs/prod/app/shared", "from-prod");
        store.insert("/ecs/dev/app/only-dev", "dev");

        let engine = engine_with(
            store,
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev", "/ecs/prod"]),
        );
        engine.run(Operation::Get).await.unwrap();

        let mut reloaded = open_store(dir.path(), "app.properties");
        reloaded.load().unwrap();
        assert_eq!(reloaded.value("shared").as_deref(), Some("from-prod"));
        assert_eq!(reloaded.value("only-dev").as_deref(), Some("dev"));
    }

    #[tokio::test]
    async fn get_stores_secure_value_with_alias_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store.insert_secure("/ecs/dev/app/secret", "hunter2", "1234-5678");

        let aliases = FakeAliases(vec![AliasEntry {
            alias_name: "alias/app-secrets".to_string(),
            target_key_id: "1234-5678".to_string(),
        }]);
        let engine = engine_with(
            store,
            aliases,
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Get).await.unwrap();

        let mut reloaded = open_store(dir.path(), "app.properties");
        reloaded.load().unwrap();
        assert_eq!(reloaded.value("secret").as_deref(), Some("hunter2"));
        assert_eq!(
            reloaded.value("secret_SecureStringKeyId").as_deref(),
            Some("alias/app-secrets")
        );
    }

    #[tokio::test]
    async fn get_suppresses_secure_values_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        store.insert("/ecs/dev/app/plain", "ok");
        store.insert_secure("/ecs/dev/app/secret", "hunter2", "1234-5678");

        let mut opts = options(dir.path(), &["app.properties"], &["/ecs/dev"]);
        opts.no_store_secure_string = true;
        let engine = engine_with(store, no_aliases(), opts);
        engine.run(Operation::Get).await.unwrap();

        let mut reloaded = open_store(dir.path(), "app.properties");
        reloaded.load().unwrap();
        assert_eq!(reloaded.value("plain").as_deref(), Some("ok"));
        assert!(reloaded.value("secret").is_none());
        assert!(reloaded.value("secret_SecureStringKeyId").is_none());
    }

    #[tokio::test]
    async fn put_pushes_local_keys_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("x", "1");
        local.save().unwrap();

        let engine = engine_with(
            FakeStore::default(),
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Put).await.unwrap();
        assert_eq!(engine.remote.names(), vec!["/ecs/dev/app/x".to_string()]);

        // Fetch it back into a fresh directory.
        let fetch_dir = tempfile::tempdir().unwrap();
        let fetch_engine = SyncEngine::new(
            engine.remote,
            no_aliases(),
            options(fetch_dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        fetch_engine.run(Operation::Get).await.unwrap();

        let mut reloaded = open_store(fetch_dir.path(), "app.properties");
        reloaded.load().unwrap();
        assert_eq!(reloaded.keys(), vec!["x".to_string()]);
        assert_eq!(reloaded.value("x").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn put_blank_value_round_trips_through_escaping() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.json");
        local.put_param("empty", "");
        local.save().unwrap();

        let engine = engine_with(
            FakeStore::default(),
            no_aliases(),
            options(dir.path(), &["app.json"], &["/ecs/dev"]),
        );
        engine.run(Operation::Put).await.unwrap();

        // Escaped on the wire, restored on fetch.
        let stored = engine.remote.parameters.lock().unwrap()["/ecs/dev/app/empty"]
            .0
            .clone();
        assert_eq!(stored, " ");

        let fetch_dir = tempfile::tempdir().unwrap();
        let fetch_engine = SyncEngine::new(
            engine.remote,
            no_aliases(),
            options(fetch_dir.path(), &["app.json"], &["/ecs/dev"]),
        );
        fetch_engine.run(Operation::Get).await.unwrap();
        let mut reloaded = open_store(fetch_dir.path(), "app.json");
        reloaded.load().unwrap();
        assert_eq!(reloaded.value("empty").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn put_skips_sidecar_keys_as_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("secret", "hunter2");
        local.put_param("secret_SecureStringKeyId", "alias/app-secrets");
        local.save().unwrap();

        let engine = engine_with(
            FakeStore::default(),
            FakeAliases(vec![AliasEntry {
                alias_name: "alias/app-secrets".to_string(),
                target_key_id: "1234-5678".to_string(),
            }]),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Put).await.unwrap();

        let puts = engine.remote.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].name, "/ecs/dev/app/secret");
        assert_eq!(puts[0].kind, ParameterKind::SecureString);
        assert_eq!(puts[0].key_id.as_deref(), Some("1234-5678"));
    }

    #[tokio::test]
    async fn put_global_key_id_beats_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("secret", "hunter2");
        local.put_param("secret_SecureStringKeyId", "alias/from-sidecar");
        local.save().unwrap();

        let mut opts = options(dir.path(), &["app.properties"], &["/ecs/dev"]);
        opts.key_id_put_all = Some("alias/global".to_string());
        let engine = engine_with(FakeStore::default(), no_aliases(), opts);
        engine.run(Operation::Put).await.unwrap();

        let puts = engine.remote.puts.lock().unwrap();
        assert_eq!(puts[0].key_id.as_deref(), Some("alias/global"));
    }

    #[tokio::test]
    async fn put_secure_suppression_skips_keys_with_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("plain", "1");
        local.put_param("secret", "hunter2");
        local.put_param("secret_SecureStringKeyId", "alias/app-secrets");
        local.save().unwrap();

        let mut opts = options(dir.path(), &["app.properties"], &["/ecs/dev"]);
        opts.no_put_secure_string = true;
        let engine = engine_with(FakeStore::default(), no_aliases(), opts);
        engine.run(Operation::Put).await.unwrap();

        assert_eq!(engine.remote.names(), vec!["/ecs/dev/app/plain".to_string()]);
    }

    #[tokio::test]
    async fn put_passes_overwrite_flag_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("x", "1");
        local.save().unwrap();

        let mut opts = options(dir.path(), &["app.properties"], &["/ecs/dev"]);
        opts.overwrite_put = true;
        let engine = engine_with(FakeStore::default(), no_aliases(), opts);
        engine.run(Operation::Put).await.unwrap();

        assert!(engine.remote.puts.lock().unwrap()[0].overwrite);
    }

    #[tokio::test]
    async fn clear_on_put_wipes_path_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("fresh", "1");
        local.save().unwrap();

        let store = FakeStore::default();
        store.insert("/ecs/dev/app/stale", "old");

        let mut opts = options(dir.path(), &["app.properties"], &["/ecs/dev"]);
        opts.clear_on_put = true;
        let engine = engine_with(store, no_aliases(), opts);
        engine.run(Operation::Put).await.unwrap();

        assert_eq!(engine.remote.names(), vec!["/ecs/dev/app/fresh".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_only_locally_known_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = open_store(dir.path(), "app.properties");
        local.put_param("b", "whatever");
        local.save().unwrap();

        let store = FakeStore::default();
        store.insert("/ecs/dev/app/a", "1");
        store.insert("/ecs/dev/app/b", "2");
        store.insert("/ecs/dev/app/c", "3");

        let engine = engine_with(
            store,
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Delete).await.unwrap();

        assert_eq!(
            engine.remote.names(),
            vec!["/ecs/dev/app/a".to_string(), "/ecs/dev/app/c".to_string()]
        );
    }

    #[tokio::test]
    async fn clear_removes_everything_under_path() {
        let dir = tempfile::tempdir().unwrap();
        // Empty local file: clear must not care.
        let mut local = open_store(dir.path(), "app.properties");
        local.load().unwrap();
        drop(local);

        let store = FakeStore::default();
        store.insert("/ecs/dev/app/a", "1");
        store.insert("/ecs/dev/app/b", "2");
        store.insert("/ecs/dev/app/c", "3");
        store.insert("/ecs/dev/other/keep", "4");

        let engine = engine_with(
            store,
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Clear).await.unwrap();

        assert_eq!(
            engine.remote.names(),
            vec!["/ecs/dev/other/keep".to_string()]
        );
    }

    #[tokio::test]
    async fn clear_batches_respect_delete_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        for i in 0..23 {
            store.insert(&format!("/ecs/dev/app/key{i:02}"), "v");
        }

        let engine = engine_with(
            store,
            no_aliases(),
            options(dir.path(), &["app.properties"], &["/ecs/dev"]),
        );
        engine.run(Operation::Clear).await.unwrap();

        let batches = engine.remote.delete_batches.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
    }

    #[tokio::test]
    async fn single_prefix_operations_reject_multiple_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        for operation in [Operation::Put, Operation::Delete, Operation::Clear] {
            let engine = engine_with(
                FakeStore::default(),
                no_aliases(),
                options(dir.path(), &["app.properties"], &["/a", "/b"]),
            );
            let result = engine.run(operation).await;
            assert!(matches!(result, Err(SyncError::Config(_))), "{operation:?}");
        }
    }

    #[tokio::test]
    async fn missing_conf_dir_is_fatal_for_non_get() {
        let engine = engine_with(
            FakeStore::default(),
            no_aliases(),
            options(Path::new("/nonexistent/paramsync"), &["app.properties"], &["/a"]),
        );
        assert!(matches!(
            engine.run(Operation::Clear).await,
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn resolve_filename_normalizes_and_guards_escapes() {
        assert_eq!(resolve_filename("app.properties").as_deref(), Some("app.properties"));
        assert_eq!(resolve_filename("./sub/app.yaml").as_deref(), Some("sub/app.yaml"));
        assert_eq!(resolve_filename("sub/../app.json").as_deref(), Some("app.json"));
        assert_eq!(resolve_filename("../escape.properties"), None);
        assert_eq!(resolve_filename("/etc/passwd"), None);
    }
}
