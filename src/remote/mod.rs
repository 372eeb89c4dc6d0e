//! Remote parameter store abstraction
//!
//! The `ParameterStore` trait is the seam between the sync engine and AWS
//! SSM, so tests can substitute an in-memory store without touching the
//! network. The production implementation lives in [`ssm`].

mod paginator;
mod ssm;

pub use paginator::find_all_parameters_for_path;
pub use ssm::SsmParameterStore;

use async_trait::async_trait;

use crate::error::Result;

/// Parameter type as stored remotely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    SecureString,
}

/// One remote parameter: name, decrypted value, and type.
#[derive(Debug, Clone)]
pub struct ParameterRecord {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
}

/// One page of a list-by-path call plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct ParameterPage {
    pub parameters: Vec<ParameterRecord>,
    pub next_token: Option<String>,
}

/// A create-or-update request for a single parameter.
#[derive(Debug, Clone)]
pub struct PutRequest {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
    /// Encryption key id; only meaningful for [`ParameterKind::SecureString`].
    pub key_id: Option<String>,
    pub overwrite: bool,
}

/// Remote parameter service contract
///
/// Calls are strictly sequential; failures are not retried here and
/// propagate to the caller as fatal.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch one page of the direct children of `path` (non-recursive),
    /// decrypting secure values.
    async fn parameters_by_path(
        &self,
        path: &str,
        max_results: i32,
        next_token: Option<String>,
    ) -> Result<ParameterPage>;

    /// Create or update a parameter.
    async fn put_parameter(&self, request: PutRequest) -> Result<()>;

    /// Delete a batch of parameters by name. Callers must keep batches
    /// within [`crate::batch::DELETE_BATCH_MAX`].
    async fn delete_parameters(&self, names: Vec<String>) -> Result<()>;

    /// Look up the encryption key id recorded for a named parameter.
    async fn describe_key_id(&self, name: &str) -> Result<Option<String>>;
}
