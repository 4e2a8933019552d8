//! Layout Scanner
//!
//! Lists the entries directly under the root and classifies each one. Every
//! anomaly is handed to the [`AnomalyPolicy`] as soon as it is found, so an
//! abort stops the scan at the offending entry.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::policy::{AnomalyClass, AnomalyPolicy};
use crate::domain::layout::{self, Classification, LayoutEntry, LOG_FILE_PREFIX};
use crate::domain::ports::{DirEntry, FileSystem};
use crate::error::{Error, Result};

/// An entry the migrator cannot account for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub class: AnomalyClass,
    pub message: String,
}

/// Result of classifying a single name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub classification: Classification,
    pub anomaly: Option<Anomaly>,
    /// The entry is an old-layout region that still has to be moved
    pub needs_migration: bool,
}

/// Classify one top-level name.
///
/// `new_layout_present` is whether the new-layout root region directory
/// exists; once it does, every old-layout name is stale.
pub fn classify_entry(name: &str, new_layout_present: bool) -> Classified {
    if let Some(encoded) = layout::strip_old_prefix(name) {
        let parsed = layout::parse_legacy_encoded_name(encoded).is_some();
        let classification = if parsed {
            Classification::OldRegionDir(encoded.to_string())
        } else {
            Classification::Unrecognized
        };

        if new_layout_present {
            return Classified {
                classification,
                anomaly: Some(Anomaly {
                    class: AnomalyClass::Other,
                    message: format!("Old region directory found: {}", name),
                }),
                needs_migration: false,
            };
        }

        let anomaly = (!parsed).then(|| Anomaly {
            class: AnomalyClass::Other,
            message: format!("Old region format cannot be upgraded: {}", name),
        });
        return Classified {
            classification,
            anomaly,
            needs_migration: true,
        };
    }

    if name.starts_with(LOG_FILE_PREFIX) {
        return Classified {
            classification: Classification::LogFile,
            anomaly: Some(Anomaly {
                class: AnomalyClass::LogFile,
                message: format!(
                    "Unrecovered region server log file {}; it can be recovered by the master when it starts.",
                    name
                ),
            }),
            needs_migration: false,
        };
    }

    if !new_layout_present {
        return Classified {
            classification: Classification::Unrecognized,
            anomaly: Some(Anomaly {
                class: AnomalyClass::Other,
                message: format!("Unrecognized file {}", name),
            }),
            needs_migration: false,
        };
    }

    Classified {
        classification: Classification::Normal,
        anomaly: None,
        needs_migration: false,
    }
}

/// What one scan pass found.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub entries: Vec<LayoutEntry>,
    pub migration_needed: bool,
}

/// Scans the root directory of one storage layout.
pub struct LayoutScanner<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> LayoutScanner<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Whether the new-layout root region directory exists.
    pub fn new_layout_present(&self) -> bool {
        self.fs.exists(&layout::new_root_region_dir(self.root))
    }

    /// List the root, failing if it has no entries at all.
    pub fn list_root(&self) -> Result<Vec<DirEntry>> {
        let entries = self
            .fs
            .list_dir(self.root)
            .map_err(|e| Error::io(self.root, e))?;
        if entries.is_empty() {
            return Err(Error::EmptyRoot(self.root.to_path_buf()));
        }
        Ok(entries)
    }

    /// Classify every top-level entry and resolve anomalies as they appear.
    #[instrument(skip(self, policy), fields(root = %self.root.display()))]
    pub fn scan(
        &self,
        new_layout_present: bool,
        policy: &mut AnomalyPolicy<'_>,
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();

        for entry in self.list_root()? {
            let classified = classify_entry(&entry.name, new_layout_present);
            debug!("{} -> {}", entry.name, classified.classification);

            summary.migration_needed |= classified.needs_migration;
            if let Some(anomaly) = &classified.anomaly {
                policy.resolve(anomaly.class, &anomaly.message, &entry.path)?;
            }

            summary.entries.push(LayoutEntry {
                name: entry.name,
                path: entry.path,
                is_dir: entry.is_dir,
                classification: classified.classification,
            });
        }

        info!(
            "Scanned {} entries, migration needed: {}",
            summary.entries.len(),
            summary.migration_needed
        );
        Ok(summary)
    }
}

// =============================================================================
// Tests
// =============================================================================
