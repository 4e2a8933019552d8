//! In-Memory Filesystem Adapter
//!
//! Implements the `FileSystem` and `VersionStore` ports over an in-memory
//! tree. Used by tests; counts every mutation so callers can assert that a
//! run left the tree untouched.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::ports::{DirEntry, FileSystem, VersionStore};
use crate::migrator::version::VERSION_FILE_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File(String),
}

/// In-memory filesystem tree.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
    mutations: AtomicU64,
}

impl InMemoryFileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a directory (and its parents). Not counted as a mutation.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut nodes = self.nodes.write();
        insert_dirs(&mut nodes, path.as_ref());
    }

    /// Seed a file (and its parent directories). Not counted as a mutation.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
        let path = path.as_ref();
        let mut nodes = self.nodes.write();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut nodes, parent);
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_string()));
    }

    /// Contents of a file, if it exists.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.read().get(path.as_ref()) {
            Some(Node::File(contents)) => Some(contents.clone()),
            _ => None,
        }
    }

    /// Number of mutating calls made through the ports.
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::Relaxed)
    }

    /// Every path in the tree, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.nodes.read().keys().cloned().collect()
    }

    fn record_mutation(&self) {
        self.mutations.fetch_add(1, Ordering::Relaxed);
    }
}

fn insert_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

/// Paths at or below `path`.
fn subtree(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> Vec<PathBuf> {
    nodes
        .range(path.to_path_buf()..)
        .take_while(|(p, _)| p.starts_with(path))
        .map(|(p, _)| p.clone())
        .collect()
}

impl FileSystem for InMemoryFileSystem {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", path.display()),
                ))
            }
            None => return Err(not_found(path)),
        }

        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| DirEntry::new(p.clone(), *node == Node::Dir))
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.read().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.nodes.read().get(path), Some(Node::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record_mutation();
        let mut nodes = self.nodes.write();
        if let Some(Node::File(_)) = nodes.get(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            ));
        }
        insert_dirs(&mut nodes, path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.record_mutation();
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(from) {
            return Err(not_found(from));
        }
        if nodes.contains_key(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        match to.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !nodes.contains_key(parent) => {
                return Err(not_found(parent));
            }
            _ => {}
        }

        for old in subtree(&nodes, from) {
            if let Some(node) = nodes.remove(&old) {
                let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
                let new = if suffix.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(suffix)
                };
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.record_mutation();
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(path) {
            return Err(not_found(path));
        }
        for p in subtree(&nodes, path) {
            nodes.remove(&p);
        }
        Ok(())
    }
}

impl VersionStore for InMemoryFileSystem {
    fn read_version(&self, root: &Path) -> io::Result<Option<String>> {
        Ok(self.read_file(root.join(VERSION_FILE_NAME)))
    }

    fn write_version(&self, root: &Path, version: &str) -> io::Result<()> {
        self.record_mutation();
        self.nodes
            .write()
            .insert(root.join(VERSION_FILE_NAME), Node::File(version.to_string()));
        Ok(())
    }
}
