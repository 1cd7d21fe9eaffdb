//! Attachment storage on the local filesystem.
//!
//! Objects live at `<root>/<tenant id>/<key>`. Access goes through a
//! `cap_std` directory handle, so keys cannot escape the root. Writes land
//! in a staging file first and are renamed into place.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::TenantId;
use crate::domain::ports::{FileStore, FileStoreError};

/// [`FileStore`] rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Store objects below `root`, creating it on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the objects.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn object_path(tenant_id: TenantId, key: &str) -> PathBuf {
    Path::new(&tenant_id.to_string()).join(key)
}

fn io_error(path: &Path, error: &io::Error) -> FileStoreError {
    FileStoreError::io(format!("{}: {error}", path.display()))
}

fn write_object(root: &Path, relative: &Path, bytes: &[u8]) -> Result<(), FileStoreError> {
    Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|e| io_error(root, &e))?;
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|e| io_error(root, &e))?;
    if let Some(parent) = relative.parent() {
        dir.create_dir_all(parent)
            .map_err(|e| io_error(&root.join(parent), &e))?;
    }
    let staging = relative.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
    dir.write(&staging, bytes)
        .map_err(|e| io_error(&root.join(&staging), &e))?;
    dir.rename(&staging, &dir, relative).map_err(|e| {
        let _ignored = dir.remove_file(&staging);
        io_error(&root.join(relative), &e)
    })
}

fn read_object(root: &Path, relative: &Path, key: &str) -> Result<Vec<u8>, FileStoreError> {
    let dir = match Dir::open_ambient_dir(root, ambient_authority()) {
        Ok(dir) => dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FileStoreError::not_found(key));
        }
        Err(e) => return Err(io_error(root, &e)),
    };
    dir.read(relative).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            FileStoreError::not_found(key)
        } else {
            io_error(&root.join(relative), &e)
        }
    })
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(
        &self,
        tenant_id: TenantId,
        key: &str,
        bytes: Vec<u8>,
    ) -> Result<(), FileStoreError> {
        let root = self.root.clone();
        let relative = object_path(tenant_id, key);
        debug!(path = %relative.display(), size = bytes.len(), "storing file");
        tokio::task::spawn_blocking(move || write_object(&root, &relative, &bytes))
            .await
            .map_err(|err| FileStoreError::io(err.to_string()))?
    }

    async fn get(&self, tenant_id: TenantId, key: &str) -> Result<Vec<u8>, FileStoreError> {
        let root = self.root.clone();
        let relative = object_path(tenant_id, key);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || read_object(&root, &relative, &key))
            .await
            .map_err(|err| FileStoreError::io(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn stored_bytes_read_back_per_tenant() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(temp.path());
        let tenant = TenantId::random();

        store
            .put(tenant, "order/photo", b"jpeg".to_vec())
            .await
            .expect("put");
        assert_eq!(store.get(tenant, "order/photo").await.expect("get"), b"jpeg");
        assert!(temp.path().join(tenant.to_string()).join("order/photo").exists());

        let err = store
            .get(TenantId::random(), "order/photo")
            .await
            .expect_err("other tenant");
        assert_eq!(err, FileStoreError::not_found("order/photo"));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_root_reads_as_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(temp.path().join("absent"));
        let err = store
            .get(TenantId::random(), "x")
            .await
            .expect_err("missing");
        assert!(matches!(err, FileStoreError::NotFound { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalFileStore::new(temp.path().join("uploads"));
        let err = store
            .put(TenantId::random(), "../../escape", b"x".to_vec())
            .await
            .expect_err("escape");
        assert!(matches!(err, FileStoreError::Io { .. }));
    }
}
