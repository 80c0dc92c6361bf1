//! Attribute file access.
//!
//! The engine never touches the filesystem directly; every read and write of
//! an attribute goes through [`PinFs`]. [`SysfsFs`] is the real backend,
//! [`crate::sim::SimulatedSysfs`] an in-memory kernel model.

use std::future::Future;
use std::io;
use std::path::Path;

/// Async read/write of single attribute files.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// from any tokio task.
pub trait PinFs: Send + Sync + 'static {
    /// Read the whole file as text.
    fn read(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

    /// Replace the file content with `contents`.
    fn write(&self, path: &Path, contents: &str) -> impl Future<Output = io::Result<()>> + Send;

    /// Whether `path` exists. Errors are reported as `false`.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;
}

/// Real sysfs access through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsFs;

impl PinFs for SysfsFs {
    async fn read(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        // sysfs attributes are written in one go; no truncate-and-append dance.
        tokio::fs::write(path, contents.as_bytes()).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn sysfs_fs_round_trips_attribute_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("value");
        let fs = SysfsFs;

        assert!(!fs.exists(&path).await);
        fs.write(&path, "1").await.unwrap();
        assert!(fs.exists(&path).await);
        assert_eq!(fs.read(&path).await.unwrap(), "1");

        fs.write(&path, "0").await.unwrap();
        assert_eq!(fs.read(&path).await.unwrap(), "0");
    }

    #[tokio::test]
    async fn sysfs_fs_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let err = SysfsFs
            .read(&dir.path().join("gpio99/value"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let err = SysfsFs
            .write(&dir.path().join("gpio99/direction"), "out")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
