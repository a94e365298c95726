//! Shared service state handed to every RPC implementation: the metadata
//! DAL, the object store, and the execution context each pipeline runs
//! under.

use std::sync::Arc;

use trac_codecs::FormatCode;
use trac_concurrency::ExecutionContext;
use trac_metadata_dal::MetadataDal;
use trac_storage::ObjectStore;

/// Default scratch-buffer size handed to every pipeline's `ExecutionContext`.
const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

#[derive(Clone)]
pub struct ServiceContext {
    pub dal: Arc<dyn MetadataDal>,
    pub store: Arc<dyn ObjectStore>,
    pub exec: ExecutionContext,
    /// The on-disk format every create/update pipeline re-encodes into.
    /// Configurable per dataset; defaults to Arrow file.
    pub canonical_format: FormatCode,
    /// Which configured storage plugin new copies are written under.
    pub storage_key: String,
}

impl ServiceContext {
    pub fn new(dal: Arc<dyn MetadataDal>, store: Arc<dyn ObjectStore>) -> Self {
        ServiceContext {
            dal,
            store,
            exec: ExecutionContext::current(DEFAULT_BUFFER_CAPACITY),
            canonical_format: FormatCode::ArrowFile,
            storage_key: "default".to_string(),
        }
    }

    /// Prefixes a storage path with the tenant: "under a
    /// per-tenant prefix, objects live at deterministic paths."
    pub fn tenant_path(&self, tenant: &str, item_path: &str) -> String {
        format!("{tenant}/{item_path}")
    }
}
