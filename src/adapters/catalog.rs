//! Catalog Adapters
//!
//! Implements the `Catalog` port.
//!
//! `ManifestCatalog` reads the rows of a catalog region from a `catalog.json`
//! manifest stored in the region's directory in the new layout. The root
//! region's manifest lists meta regions; each meta region's manifest lists
//! table regions. Because the migrator relocates a catalog region before
//! scanning it, the manifests are always read from their new location.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::layout::{self, META_TABLE_NAME, ROOT_REGION_ENCODED_NAME, ROOT_TABLE_NAME};
use crate::domain::ports::{Catalog, CatalogRow, RowVisitor};
use crate::error::{Error, Result};

/// File name of a catalog region's row manifest.
pub const MANIFEST_FILE_NAME: &str = "catalog.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    rows: Vec<CatalogRow>,
}

// =============================================================================
// Manifest Catalog
// =============================================================================

/// Catalog backed by per-region JSON manifests under the storage root.
#[derive(Debug, Clone)]
pub struct ManifestCatalog {
    root: PathBuf,
}

impl ManifestCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Manifest path of the root region.
    pub fn root_manifest_path(&self) -> PathBuf {
        layout::region_dir(&self.root, ROOT_TABLE_NAME, ROOT_REGION_ENCODED_NAME)
            .join(MANIFEST_FILE_NAME)
    }

    /// Manifest path of a meta region.
    pub fn meta_manifest_path(&self, meta_row: &CatalogRow) -> PathBuf {
        layout::region_dir(&self.root, META_TABLE_NAME, &meta_row.encoded_name)
            .join(MANIFEST_FILE_NAME)
    }

    fn load(path: &Path) -> Result<Vec<CatalogRow>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_str(&contents).map_err(|e| {
            Error::Catalog(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded {} rows from {}", manifest.rows.len(), path.display());
        Ok(manifest.rows)
    }
}

impl Catalog for ManifestCatalog {
    fn scan_root_catalog(&self, visitor: &mut RowVisitor<'_>) -> Result<()> {
        visit_rows(Self::load(&self.root_manifest_path())?, visitor)
    }

    fn scan_table_catalog(
        &self,
        meta_row: &CatalogRow,
        visitor: &mut RowVisitor<'_>,
    ) -> Result<()> {
        visit_rows(Self::load(&self.meta_manifest_path(meta_row))?, visitor)
    }
}

fn visit_rows(rows: Vec<CatalogRow>, visitor: &mut RowVisitor<'_>) -> Result<()> {
    for row in &rows {
        if !visitor(row)? {
            break;
        }
    }
    Ok(())
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Catalog with fixed rows, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    meta_regions: Vec<CatalogRow>,
    table_regions: Vec<(String, Vec<CatalogRow>)>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a meta region with the table regions it lists.
    pub fn with_meta_region(
        mut self,
        encoded_name: impl Into<String>,
        table_regions: Vec<CatalogRow>,
    ) -> Self {
        let encoded_name = encoded_name.into();
        self.meta_regions
            .push(CatalogRow::new(META_TABLE_NAME, encoded_name.clone()));
        self.table_regions.push((encoded_name, table_regions));
        self
    }
}

impl Catalog for InMemoryCatalog {
    fn scan_root_catalog(&self, visitor: &mut RowVisitor<'_>) -> Result<()> {
        visit_rows(self.meta_regions.clone(), visitor)
    }

    fn scan_table_catalog(
        &self,
        meta_row: &CatalogRow,
        visitor: &mut RowVisitor<'_>,
    ) -> Result<()> {
        let rows = self
            .table_regions
            .iter()
            .find(|(meta, _)| *meta == meta_row.encoded_name)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| {
                Error::Catalog(format!("Unknown meta region {}", meta_row.encoded_name))
            })?;
        visit_rows(rows, visitor)
    }
}

// =============================================================================
// Tests
// =============================================================================
