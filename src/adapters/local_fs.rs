//! Local Filesystem Adapter
//!
//! Implements the `FileSystem` and `VersionStore` ports with `std::fs`.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::domain::ports::{DirEntry, FileSystem, VersionStore};
use crate::migrator::version::VERSION_FILE_NAME;

/// Filesystem adapter for a storage root on a locally mounted filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            entries.push(DirEntry::new(entry.path(), is_dir));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        debug!("rename {} -> {}", from.display(), to.display());
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        debug!("remove {}", path.display());
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}

impl VersionStore for LocalFileSystem {
    fn read_version(&self, root: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(root.join(VERSION_FILE_NAME)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_version(&self, root: &Path, version: &str) -> io::Result<()> {
        fs::write(root.join(VERSION_FILE_NAME), version)
    }
}
