use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::store::{ListEntry, ObjectReader, ObjectStore, ObjectWriter};

/// Local-disk [`ObjectStore`], grounded on the plain-filesystem semantics
/// of atomic-publish semantics. A write goes to `<root>/.tmp/<uuid>` and is
/// renamed into place on commit, which gives atomic-create semantics on any
/// filesystem with atomic rename (invariant: a reader never observes a
/// partially-written path).
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFsStore { root: root.into() }
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        if path.contains("..") {
            return Err(StorageError::InvalidArgument(format!(
                "path '{path}' must not contain '..'"
            )));
        }
        Ok(self.root.join(path.trim_start_matches('/')))
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.join(".tmp")
    }
}

pub struct LocalFsWriter {
    tmp_path: PathBuf,
    final_path: PathBuf,
    file: fs::File,
}

#[async_trait]
impl ObjectWriter for LocalFsWriter {
    async fn write_all(&mut self, chunk: Bytes) -> StorageResult<()> {
        self.file.write_all(&chunk).await?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StorageResult<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        if let Some(parent) = self.final_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&self.tmp_path, &self.final_path).await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        // Best-effort: the temp file is orphaned under `.tmp` otherwise, but
        // the committed path is never created, satisfying write-once.
        let _ = fs::remove_file(&self.tmp_path).await;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    #[instrument(skip(self))]
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let resolved = self.resolve(path)?;
        Ok(fs::metadata(&resolved).await.is_ok())
    }

    #[instrument(skip(self))]
    async fn size(&self, path: &str) -> StorageResult<u64> {
        let resolved = self.resolve(path)?;
        let meta = fs::metadata(&resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(meta.len())
    }

    #[instrument(skip(self))]
    async fn mkdir(&self, path: &str, recursive: bool) -> StorageResult<()> {
        let resolved = self.resolve(path)?;
        if recursive {
            fs::create_dir_all(&resolved).await?;
        } else {
            fs::create_dir(&resolved).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rm(&self, path: &str) -> StorageResult<()> {
        let resolved = self.resolve(path)?;
        let meta = fs::metadata(&resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        if meta.is_dir() {
            fs::remove_dir_all(&resolved).await?;
        } else {
            fs::remove_file(&resolved).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ls(&self, path: &str) -> StorageResult<Vec<ListEntry>> {
        let resolved = self.resolve(path)?;
        let mut read_dir = fs::read_dir(&resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(ListEntry {
                path: format!("{}/{}", path.trim_end_matches('/'), name),
                is_dir,
            });
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn reader(&self, path: &str) -> StorageResult<ObjectReader> {
        let resolved = self.resolve(path)?;
        let file = fs::File::open(&resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Box::pin(file))
    }

    #[instrument(skip(self))]
    async fn writer(&self, path: &str) -> StorageResult<Box<dyn ObjectWriter>> {
        let final_path = self.resolve(path)?;
        if fs::metadata(&final_path).await.is_ok() {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }

        let tmp_dir = self.tmp_dir();
        fs::create_dir_all(&tmp_dir).await?;
        let tmp_path = tmp_dir.join(format!("{}.part", uuid_like_name()));
        let file = fs::File::create(&tmp_path).await?;

        Ok(Box::new(LocalFsWriter { tmp_path, final_path, file }))
    }
}

fn uuid_like_name() -> String {
    // A local, dependency-free unique name generator for temp files; object
    // ids proper always come from `trac_models::new_object_id`.
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{nanos:x}-{:x}", std::process::id())
}

fn _unused(_: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::AsyncReadExt as _;
    use tokio_util::compat::TokioAsyncReadCompatExt;

    #[tokio::test]
    async fn write_commit_then_read_back_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());

        let mut writer = store.writer("a/b.bin").await.unwrap();
        writer.write_all(Bytes::from_static(b"hello ")).await.unwrap();
        writer.write_all(Bytes::from_static(b"world")).await.unwrap();
        writer.commit().await.unwrap();

        assert!(store.exists("a/b.bin").await.unwrap());
        assert_eq!(store.size("a/b.bin").await.unwrap(), 11);

        let reader = store.reader("a/b.bin").await.unwrap();
        let mut compat = reader.compat();
        let mut buf = Vec::new();
        compat.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello world");
    }

    #[tokio::test]
    async fn abort_leaves_no_artifact_at_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());

        let mut writer = store.writer("x/partial.bin").await.unwrap();
        writer.write_all(Bytes::from_static(b"partial")).await.unwrap();
        writer.abort().await.unwrap();

        assert!(!store.exists("x/partial.bin").await.unwrap());
    }

    #[tokio::test]
    async fn writer_rejects_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path());

        let writer = store.writer("once.bin").await.unwrap();
        writer.commit().await.unwrap();

        let err = store.writer("once.bin").await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }
}
