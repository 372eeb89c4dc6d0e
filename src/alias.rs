//! KMS key alias directory
//!
//! SecureString parameters reference a KMS key by opaque id, but operators
//! work with human-readable aliases. The directory is a bidirectional
//! alias/key-id cache built once per run from a full ListAliases sweep and
//! read-only afterwards. It is only built when an operation actually touches
//! secure values.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Result, SyncError};

/// Canonical prefix for fully-qualified KMS alias names.
pub const ALIAS_PREFIX: &str = "alias/";

/// One alias entry from the key service listing.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub alias_name: String,
    pub target_key_id: String,
}

/// Source of the full alias listing
#[async_trait]
pub trait AliasSource: Send + Sync {
    /// List every alias known to the key service.
    async fn list_aliases(&self) -> Result<Vec<AliasEntry>>;
}

/// Bidirectional alias/key-id lookup with identity fallbacks.
#[derive(Debug, Default)]
pub struct AliasDirectory {
    aliases_to_keys: HashMap<String, String>,
    keys_to_aliases: HashMap<String, String>,
}

impl AliasDirectory {
    /// Build the directory from a listing, skipping entries with no target
    /// key id (AWS-managed aliases without a resolvable target).
    pub fn from_entries(entries: Vec<AliasEntry>) -> Self {
        let mut directory = Self::default();
        for entry in entries {
            if entry.target_key_id.is_empty() {
                continue;
            }
            directory
                .aliases_to_keys
                .insert(entry.alias_name.clone(), entry.target_key_id.clone());
            directory
                .keys_to_aliases
                .insert(entry.target_key_id, entry.alias_name);
        }
        directory
    }

    /// Fetch the listing from `source` and build the directory.
    pub async fn build(source: &dyn AliasSource) -> Result<Self> {
        Ok(Self::from_entries(source.list_aliases().await?))
    }

    /// Resolve an alias (or bare alias name) to a key id.
    ///
    /// Input without the canonical `alias/` prefix is qualified first. An
    /// alias not present in the directory is returned in its canonical form,
    /// on the assumption it is already a usable identifier.
    pub fn deref_alias(&self, alias: &str) -> String {
        let qualified = if alias.starts_with(ALIAS_PREFIX) {
            alias.to_string()
        } else {
            format!("{ALIAS_PREFIX}{alias}")
        };
        self.aliases_to_keys
            .get(&qualified)
            .cloned()
            .unwrap_or(qualified)
    }

    /// Resolve a key id to its alias, or echo the key id when no alias is
    /// registered for it.
    pub fn alias_for_key_id(&self, key_id: &str) -> String {
        self.keys_to_aliases
            .get(key_id)
            .cloned()
            .unwrap_or_else(|| key_id.to_string())
    }
}

/// Alias source backed by the AWS KMS ListAliases call.
pub struct KmsAliasSource {
    client: aws_sdk_kms::Client,
}

impl KmsAliasSource {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AliasSource for KmsAliasSource {
    async fn list_aliases(&self) -> Result<Vec<AliasEntry>> {
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let response = self
                .client
                .list_aliases()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| SyncError::Remote(e.to_string()))?;

            for alias in response.aliases() {
                if let (Some(name), Some(target)) = (alias.alias_name(), alias.target_key_id()) {
                    if !target.is_empty() {
                        entries.push(AliasEntry {
                            alias_name: name.to_string(),
                            target_key_id: target.to_string(),
                        });
                    }
                }
            }

            marker = response.next_marker().map(String::from);
            if marker.is_none() {
                break;
            }
        }
        tracing::debug!("Loaded {} key aliases", entries.len());
        Ok(entries)
    }
}
