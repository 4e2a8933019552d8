//! Domain Ports (Port/Adapter Pattern)
//!
//! This module defines the abstractions the migrator depends on. Adapters in
//! [`crate::adapters`] provide the concrete implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Migrator Core                           │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │  FileSystem │ VersionStore │ Catalog │ ServiceProbe │    │
//! │  │  Confirm                                             │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  LocalFileSystem │ ManifestCatalog │ HttpServiceProbe │ ...  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Filesystem Port
// =============================================================================

/// One entry returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name, is_dir }
    }
}

/// Port for the filesystem holding the storage root.
///
/// Operations are synchronous and blocking. Only directory-entry-level rename
/// atomicity is assumed.
pub trait FileSystem: Send + Sync {
    /// List the direct children of a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check whether a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename a file or directory subtree.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file, or a directory and everything under it.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

// =============================================================================
// Version Marker Port
// =============================================================================

/// Port for the layout version marker kept under the root directory.
pub trait VersionStore: Send + Sync {
    /// Read the recorded version, `None` if no marker exists.
    fn read_version(&self, root: &Path) -> io::Result<Option<String>>;

    /// Overwrite the marker with `version`.
    fn write_version(&self, root: &Path, version: &str) -> io::Result<()>;
}

// =============================================================================
// Catalog Port
// =============================================================================

/// One catalog row: a child region and the table that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub table: String,
    pub encoded_name: String,
}

impl CatalogRow {
    pub fn new(table: impl Into<String>, encoded_name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            encoded_name: encoded_name.into(),
        }
    }
}

/// Row callback. Return `Ok(false)` to stop the scan early.
pub type RowVisitor<'a> = dyn FnMut(&CatalogRow) -> Result<bool> + 'a;

/// Port for iterating catalog rows.
///
/// The root catalog lists meta regions; each meta region's catalog lists
/// ordinary table regions. Rows are visited in catalog order.
pub trait Catalog: Send + Sync {
    /// Visit every row of the root region.
    fn scan_root_catalog(&self, visitor: &mut RowVisitor<'_>) -> Result<()>;

    /// Visit every row of the meta region named by `meta_row`.
    fn scan_table_catalog(&self, meta_row: &CatalogRow, visitor: &mut RowVisitor<'_>)
        -> Result<()>;
}

// =============================================================================
// Service Probe Port
// =============================================================================

/// Port for asking whether the storage service is up.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// True if the service answered its liveness probe.
    async fn is_running(&self) -> bool;

    /// Where the probe points, for messages.
    fn endpoint(&self) -> String;
}

// =============================================================================
// Operator Confirmation Port
// =============================================================================

/// Port for asking the operator a yes/no question.
pub trait Confirm: Send + Sync {
    /// Present `prompt` and return true on an affirmative answer.
    fn confirm(&self, prompt: &str) -> bool;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry_name() {
        let entry = DirEntry::new("/data/store/hregion_70236052", true);
        assert_eq!(entry.name, "hregion_70236052");
        assert!(entry.is_dir);
    }

    #[test]
    fn test_catalog_row_serde() {
        let row = CatalogRow::new("users", "12345");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"table":"users","encoded_name":"12345"}"#);

        let back: CatalogRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
