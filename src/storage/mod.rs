//! Local storage abstraction for captured photos
//!
//! The upload dispatcher only needs two primitives: an existence check on the
//! path the camera reported and a read of the bytes to put on the wire.
//!
//! # Examples
//!
//! ```rust,no_run
//! use geo_snap::storage::{LocalStorage, Storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = LocalStorage;
//!     let stat = storage.stat("/tmp/photo.jpg").await?;
//!     if stat.exists {
//!         let bytes = storage.read(&stat.path).await?;
//!         println!("{} bytes", bytes.len());
//!     }
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Result of a stat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Path with any `file://` scheme removed
    pub path: String,
    pub exists: bool,
}

/// Trait for file operations that can be mocked in tests
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Check whether a file is present
    async fn stat(&self, path: &str) -> Result<FileStat>;

    /// Read a whole file
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Storage backed by the local filesystem
pub struct LocalStorage;

fn strip_file_scheme(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

#[async_trait::async_trait]
impl Storage for LocalStorage {
    async fn stat(&self, path: &str) -> Result<FileStat> {
        let local = strip_file_scheme(path);
        let exists = tokio::fs::try_exists(Path::new(local)).await?;
        Ok(FileStat {
            path: local.to_string(),
            exists,
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(strip_file_scheme(path)).await.map_err(Into::into)
    }
}
