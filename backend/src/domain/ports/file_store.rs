//! Port for attachment byte storage.

use async_trait::async_trait;

use crate::domain::{Error, TenantId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by file store adapters.
    pub enum FileStoreError {
        /// No object is stored under the key.
        NotFound { key: String } => "stored file {key} not found",
        /// Reading or writing the object failed.
        Io { message: String } => "file store failed: {message}",
    }
}

impl From<FileStoreError> for Error {
    fn from(value: FileStoreError) -> Self {
        match value {
            FileStoreError::NotFound { key } => Error::not_found(format!("file {key} not found")),
            FileStoreError::Io { message } => Error::internal(format!("file store error: {message}")),
        }
    }
}

/// Blob storage keyed by tenant and an opaque object key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object.
    async fn put(&self, tenant_id: TenantId, key: &str, bytes: Vec<u8>)
    -> Result<(), FileStoreError>;

    /// Load the object stored under `key`.
    async fn get(&self, tenant_id: TenantId, key: &str) -> Result<Vec<u8>, FileStoreError>;
}
