//! Orphan detection: old-layout region directories still at the root after
//! catalog-driven relocation are not reachable from the catalog.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::policy::{AnomalyClass, AnomalyPolicy};
use super::references::ReferenceTracker;
use super::scanner::LayoutScanner;
use crate::domain::layout;
use crate::domain::ports::FileSystem;
use crate::error::Result;

/// Message for a leftover region directory.
pub fn orphan_message(name: &str, encoded_name: &str, refs: &ReferenceTracker) -> String {
    if refs.contains(encoded_name) {
        format!(
            "Region not in catalog but referenced by another region: {}",
            name
        )
    } else {
        format!("Region not in catalog and unreferenced: {}", name)
    }
}

/// Re-scans the root for leftover old-layout regions.
pub struct OrphanDetector<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> OrphanDetector<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Route every leftover region through the "other files" action.
    /// Returns the orphan paths found.
    #[instrument(skip(self, refs, policy), fields(root = %self.root.display()))]
    pub fn detect(
        &self,
        refs: &ReferenceTracker,
        policy: &mut AnomalyPolicy<'_>,
    ) -> Result<Vec<PathBuf>> {
        let mut orphans = Vec::new();

        for entry in LayoutScanner::new(self.fs, self.root).list_root()? {
            let Some(encoded_name) = layout::strip_old_prefix(&entry.name) else {
                continue;
            };
            let message = orphan_message(&entry.name, encoded_name, refs);
            policy.resolve(AnomalyClass::Other, &message, &entry.path)?;
            orphans.push(entry.path);
        }

        info!("Found {} regions not in the catalog", orphans.len());
        Ok(orphans)
    }
}
