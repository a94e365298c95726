//! Pluggable byte-level object storage: writers and readers address content
//! by a tenant-scoped path, with a local-filesystem backend for now.

pub mod config;
pub mod error;
pub mod local_fs;
pub mod store;

pub use config::{StorageConfig, StoragePluginsConfig};
pub use error::{StorageError, StorageResult};
pub use local_fs::LocalFsStore;
pub use store::{ListEntry, ObjectReader, ObjectStore, ObjectWriter};
