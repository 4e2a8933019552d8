//! Version marker probe and stamper.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::ports::VersionStore;
use crate::error::{Error, Result};

/// Name of the version marker file under the root directory.
pub const VERSION_FILE_NAME: &str = "hbase.version";

/// Layout version written after a successful upgrade.
pub const CURRENT_LAYOUT_VERSION: &str = "1";

/// What the version marker says about the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    /// Marker present and current; nothing to do
    Current,
    /// Marker absent (`None`) or holding an older version
    RequiresMigration(Option<String>),
}

impl VersionStatus {
    pub fn is_current(&self) -> bool {
        matches!(self, VersionStatus::Current)
    }
}

/// Read the marker and decide whether the layout needs work.
pub fn check_version(store: &dyn VersionStore, root: &Path) -> Result<VersionStatus> {
    let found = store
        .read_version(root)
        .map_err(|e| Error::io(root.join(VERSION_FILE_NAME), e))?;

    match found.as_deref().map(str::trim) {
        Some(CURRENT_LAYOUT_VERSION) => Ok(VersionStatus::Current),
        Some(other) => {
            debug!(
                "Layout version is {}, expected {}",
                other, CURRENT_LAYOUT_VERSION
            );
            Ok(VersionStatus::RequiresMigration(Some(other.to_string())))
        }
        None => {
            debug!("No layout version marker under {}", root.display());
            Ok(VersionStatus::RequiresMigration(None))
        }
    }
}

/// Write the current version marker.
pub fn stamp_version(store: &dyn VersionStore, root: &Path) -> Result<()> {
    info!("Setting file system version to {}", CURRENT_LAYOUT_VERSION);
    store
        .write_version(root, CURRENT_LAYOUT_VERSION)
        .map_err(|e| Error::io(root.join(VERSION_FILE_NAME), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryFileSystem;

    #[test]
    fn test_absent_marker_requires_migration() {
        let fs = InMemoryFileSystem::new();
        fs.add_dir("/data");

        let status = check_version(&fs, Path::new("/data")).unwrap();
        assert_eq!(status, VersionStatus::RequiresMigration(None));
        assert!(!status.is_current());
    }

    #[test]
    fn test_old_marker_requires_migration() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/data/hbase.version", "0.1");

        let status = check_version(&fs, Path::new("/data")).unwrap();
        assert_eq!(
            status,
            VersionStatus::RequiresMigration(Some("0.1".to_string()))
        );
    }

    #[test]
    fn test_current_marker_with_whitespace() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/data/hbase.version", "1\n");

        assert!(check_version(&fs, Path::new("/data")).unwrap().is_current());
    }

    #[test]
    fn test_stamp_then_check() {
        let fs = InMemoryFileSystem::new();
        fs.add_dir("/data");

        stamp_version(&fs, Path::new("/data")).unwrap();

        assert!(check_version(&fs, Path::new("/data")).unwrap().is_current());
        assert_eq!(fs.mutation_count(), 1);
    }
}
