use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::StorageResult;

/// One entry returned by [`ObjectStore::ls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub path: String,
    pub is_dir: bool,
}

/// A boxed byte-stream reader, handed off to the codec decode stage in
/// `trac-pipeline`.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Write-once sink for one object path. Per "Writers are
/// write-once: a partially written path is aborted on error so that the
/// next version attempt sees no artifact." Callers must explicitly call
/// either [`ObjectWriter::commit`] or [`ObjectWriter::abort`]; dropping a
/// writer without either is treated by implementations as an abort.
#[async_trait]
pub trait ObjectWriter: Send {
    /// Appends a chunk of bytes to the (not yet visible) object.
    async fn write_all(&mut self, chunk: Bytes) -> StorageResult<()>;

    /// Makes the written bytes visible at `path`, atomically with respect
    /// to readers (a reader never observes a partial write).
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards everything written so far; `path` is left as if the write
    /// never happened.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}

/// Pluggable byte-level object/file storage. Storage keys map to plugin
/// instances resolved at boot from platform config; a tenant's prefix
/// scopes every path this trait's methods are given.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    async fn size(&self, path: &str) -> StorageResult<u64>;

    async fn mkdir(&self, path: &str, recursive: bool) -> StorageResult<()>;

    async fn rm(&self, path: &str) -> StorageResult<()>;

    async fn ls(&self, path: &str) -> StorageResult<Vec<ListEntry>>;

    async fn reader(&self, path: &str) -> StorageResult<ObjectReader>;

    /// Opens a write-once sink at `path`. Fails with
    /// [`crate::error::StorageError::AlreadyExists`] if `path` already has
    /// committed bytes (DATA/FILE versions never overwrite a prior
    /// `dataItem` path).
    async fn writer(&self, path: &str) -> StorageResult<Box<dyn ObjectWriter>>;

    /// Provisions a per-tenant prefix, for backends that manage their own
    /// tenant namespaces rather than relying on pre-provisioning.
    async fn create_storage_prefix(&self, tenant_prefix: &str) -> StorageResult<()> {
        self.mkdir(tenant_prefix, true).await
    }

    async fn delete_storage_prefix(&self, tenant_prefix: &str) -> StorageResult<()> {
        self.rm(tenant_prefix).await
    }
}
