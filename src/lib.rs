//! paramsync - SSM Parameter Store sync
//!
//! Synchronizes hierarchical configuration key/value pairs between AWS SSM
//! Parameter Store and local properties/JSON/YAML files.

pub mod alias;
pub mod batch;
pub mod codec;
pub mod error;
pub mod filestore;
pub mod path;
pub mod remote;
pub mod sync;

pub use error::{Result, SyncError};
pub use sync::{Operation, SyncEngine, SyncOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
