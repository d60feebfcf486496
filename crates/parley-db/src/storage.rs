//! Blob storage for uploaded files with a filesystem backend.
//!
//! Attachments keep their bytes outside the database: the row carries a
//! storage path, the backend owns the blob. Paths are sharded by UUIDv7
//! prefix so directories stay small.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use parley_core::Result;

/// Storage backend trait for different storage implementations.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend.
///
/// Stores files in a directory hierarchy based on UUIDv7 blob IDs.
/// Path format: `{base_path}/blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem
    /// issues (overlayfs quirks, permission errors, missing directories)
    /// early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("blobs/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(storage_path = %path, full_path = %full_path.display(), byte_size = data.len(), "storage: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "storage: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "storage: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "storage: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "storage: rename failed");
            e
        })?;

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        if tokio::fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path);
        Ok(tokio::fs::try_exists(full_path).await?)
    }
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Generate storage path from UUID.
///
/// Path format: `blobs/{first-2-hex}/{next-2-hex}/{uuid}.bin`
pub fn generate_storage_path(uuid: &Uuid) -> String {
    let hex = uuid.as_hyphenated().to_string().replace('-', "");
    format!(
        "blobs/{}/{}/{}.bin",
        &hex[0..2],
        &hex[2..4],
        uuid.as_hyphenated()
    )
}
