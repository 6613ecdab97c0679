use crate::config::FileStorageConfig;
use crate::db::{
    errors::StorageError,
    models::file_storage::{FileStorageRequest, FileStorageResponse},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

type Result<T> = std::result::Result<T, StorageError>;

/// Blob storage for uploaded document files, addressed by opaque storage keys
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist the content under a freshly generated key
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse>;

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>>;

    /// Deleting a missing key is not an error
    async fn delete(&self, storage_key: &str) -> Result<()>;
}

fn new_storage_key() -> String {
    let file_uuid = uuid::Uuid::new_v4().to_string();
    format!("{}/{}.dat", &file_uuid[..2], file_uuid)
}

// ============================================================================
// Local Filesystem Storage Implementation
// ============================================================================

/// Local filesystem storage backend. Files are sharded into directories by the first two
/// characters of their key.
pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a key below the base path, refusing anything that could escape it
    fn resolve(&self, storage_key: &str) -> Result<PathBuf> {
        let relative = Path::new(storage_key);
        if storage_key.is_empty() || !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse> {
        let relative_path = new_storage_key();
        let full_path = self.base_path.join(&relative_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&request.content).await?;
        file.sync_all().await?;

        tracing::debug!(key = %relative_path, bytes = request.content.len(), "Stored file");

        Ok(FileStorageResponse {
            storage_key: relative_path,
        })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(storage_key)?;

        if !fs::try_exists(&full_path).await? {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let mut file = fs::File::open(&full_path).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;

        Ok(content)
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        let full_path = self.resolve(storage_key)?;

        if fs::try_exists(&full_path).await? {
            fs::remove_file(&full_path).await?;
        }

        Ok(())
    }
}

// ============================================================================
// In-memory Storage Implementation
// ============================================================================

/// Keeps files in a map. Used by the in-memory deployment mode and in tests.
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(&self, request: FileStorageRequest) -> Result<FileStorageResponse> {
        let storage_key = new_storage_key();
        self.files.write().insert(storage_key.clone(), request.content);
        Ok(FileStorageResponse { storage_key })
    }

    async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> Result<()> {
        self.files.write().remove(storage_key);
        Ok(())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Create a file storage backend based on configuration
pub async fn create_file_storage(config: &FileStorageConfig) -> Result<Arc<dyn FileStorage>> {
    match config {
        FileStorageConfig::Local { path } => {
            tracing::info!("Creating local file storage backend (path: {:?})", path);
            fs::create_dir_all(path).await.map_err(|e| {
                StorageError::Other(anyhow::anyhow!("Failed to create local storage directory {:?}: {}", path, e))
            })?;
            Ok(Arc::new(LocalFileStorage::new(path.clone())))
        }
        FileStorageConfig::Memory => {
            tracing::info!("Creating in-memory file storage backend");
            Ok(Arc::new(InMemoryFileStorage::new()))
        }
    }
}
