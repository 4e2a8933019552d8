//! Region Relocator
//!
//! Moves one region directory from the flat layout into its table directory
//! and fixes up the subtree:
//!
//! 1. `<root>/<table>` is created if missing
//! 2. `<root>/hregion_<name>` is renamed to `<root>/<table>/<name>`
//! 3. nested compaction directories carrying the old prefix are renamed in
//!    place, children first
//! 4. reference files found in any `mapfiles` directory are recorded
//!
//! None of this is transactional. A crash leaves a partially renamed subtree
//! that the next run picks up from what is on disk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::references::ReferenceTracker;
use crate::domain::layout::{self, MAPFILES_DIR};
use crate::domain::ports::FileSystem;
use crate::error::{Error, Result};

/// Record of one region move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelocatedRegion {
    pub table: String,
    pub encoded_name: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Moves region directories under one root.
pub struct RegionRelocator<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> RegionRelocator<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Move `<root>/<old_name>` to `<root>/<table>/<old_name without prefix>`.
    #[instrument(skip(self, refs), fields(table = %table, region = %old_name))]
    pub fn relocate(
        &self,
        table: &str,
        old_name: &str,
        refs: &mut ReferenceTracker,
    ) -> Result<RelocatedRegion> {
        let table_dir = layout::table_dir(self.root, table);
        let from = self.root.join(old_name);
        let encoded_name = layout::strip_old_prefix(old_name).unwrap_or(old_name);
        let to = table_dir.join(encoded_name);

        self.fs
            .create_dir_all(&table_dir)
            .map_err(|e| Error::Relocation {
                from: from.clone(),
                to: table_dir.clone(),
                source: e,
            })?;

        self.fs.rename(&from, &to).map_err(|e| Error::Relocation {
            from: from.clone(),
            to: to.clone(),
            source: e,
        })?;

        self.process_subdirs(&to, refs)?;

        info!("Relocated {} to {}", from.display(), to.display());
        Ok(RelocatedRegion {
            table: table.to_string(),
            encoded_name: encoded_name.to_string(),
            from,
            to,
        })
    }

    /// Post-order walk of a moved region subtree.
    fn process_subdirs(&self, dir: &Path, refs: &mut ReferenceTracker) -> Result<()> {
        let in_mapfiles = dir.file_name().is_some_and(|n| n == MAPFILES_DIR);

        let children = self.fs.list_dir(dir).map_err(|e| Error::io(dir, e))?;
        for child in children {
            if child.is_dir {
                self.process_subdirs(&child.path, refs)?;

                // Old compaction directories. The raw name is used so a
                // non-UTF-8 remainder survives the rename.
                let stripped = child
                    .path
                    .file_name()
                    .and_then(layout::strip_old_prefix_os);
                if let Some(stripped) = stripped {
                    let renamed = dir.join(stripped);
                    debug!("rename {} -> {}", child.path.display(), renamed.display());
                    self.fs
                        .rename(&child.path, &renamed)
                        .map_err(|e| Error::Relocation {
                            from: child.path.clone(),
                            to: renamed.clone(),
                            source: e,
                        })?;
                }
            } else if in_mapfiles {
                if let Some(token) = layout::reference_token(&child.name) {
                    debug!("{} references region {}", child.path.display(), token);
                    refs.record(token);
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryFileSystem;
    use assert_matches::assert_matches;

    fn root() -> &'static Path {
        Path::new("/data")
    }

    #[test]
    fn test_relocate_moves_region_into_table() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/data/hregion_70236052/info/mapfiles/1", "store");
        let mut refs = ReferenceTracker::new();

        let moved = RegionRelocator::new(&fs, root())
            .relocate("-ROOT-", "hregion_70236052", &mut refs)
            .unwrap();

        assert_eq!(moved.to, PathBuf::from("/data/-ROOT-/70236052"));
        assert_eq!(moved.encoded_name, "70236052");
        assert!(!fs.exists(Path::new("/data/hregion_70236052")));
        assert!(fs.exists(Path::new("/data/-ROOT-/70236052/info/mapfiles/1")));
        assert!(refs.is_empty());
    }

    #[test]
    fn test_relocate_renames_nested_compaction_dirs() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/data/hregion_55/compaction.dir/hregion_55/info/mapfiles/3", "x");
        fs.add_dir("/data/hregion_55/hregion_99/hregion_98");
        let mut refs = ReferenceTracker::new();

        RegionRelocator::new(&fs, root())
            .relocate("users", "hregion_55", &mut refs)
            .unwrap();

        assert!(fs.exists(Path::new("/data/users/55/compaction.dir/55/info/mapfiles/3")));
        assert!(fs.is_dir(Path::new("/data/users/55/99/98")));
        assert!(!fs
            .paths()
            .iter()
            .any(|p| p.to_string_lossy().contains("hregion_")));
    }

    #[test]
    fn test_relocate_records_references_at_any_depth() {
        let fs = InMemoryFileSystem::new();
        fs.add_file("/data/hregion_55/info/mapfiles/3349823752.1028785192", "ref");
        fs.add_file("/data/hregion_55/deep/x/mapfiles/77.42", "ref");
        fs.add_file("/data/hregion_55/info/mapfiles/12", "plain");
        // Reference-looking name outside a mapfiles directory
        fs.add_file("/data/hregion_55/info/info/5.777", "not a ref");
        let mut refs = ReferenceTracker::new();

        RegionRelocator::new(&fs, root())
            .relocate("users", "hregion_55", &mut refs)
            .unwrap();

        assert_eq!(refs.iter().collect::<Vec<_>>(), vec!["1028785192", "42"]);
    }

    #[test]
    fn test_relocate_reuses_existing_table_dir() {
        let fs = InMemoryFileSystem::new();
        fs.add_dir("/data/users/1");
        fs.add_dir("/data/hregion_2");
        let mut refs = ReferenceTracker::new();

        RegionRelocator::new(&fs, root())
            .relocate("users", "hregion_2", &mut refs)
            .unwrap();

        assert!(fs.is_dir(Path::new("/data/users/1")));
        assert!(fs.is_dir(Path::new("/data/users/2")));
    }

    #[cfg(unix)]
    #[test]
    fn test_relocate_keeps_non_utf8_compaction_dir_names() {
        use crate::adapters::LocalFileSystem;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        let nested = root
            .join("hregion_55")
            .join(OsStr::from_bytes(b"hregion_\xff"));
        std::fs::create_dir_all(&nested).unwrap();
        let mut refs = ReferenceTracker::new();

        RegionRelocator::new(&LocalFileSystem::new(), root)
            .relocate("users", "hregion_55", &mut refs)
            .unwrap();

        assert!(root.join("users/55").join(OsStr::from_bytes(b"\xff")).is_dir());
        assert!(!root.join("users/55").join("\u{FFFD}").exists());
    }

    #[test]
    fn test_relocate_missing_region_is_relocation_error() {
        let fs = InMemoryFileSystem::new();
        fs.add_dir("/data");
        let mut refs = ReferenceTracker::new();

        let result = RegionRelocator::new(&fs, root()).relocate("users", "hregion_404", &mut refs);

        assert_matches!(result, Err(Error::Relocation { from, .. }) if from == Path::new("/data/hregion_404"));
    }
}
