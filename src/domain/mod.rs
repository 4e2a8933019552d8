//! Domain Layer
//!
//! Layout naming rules and the ports the migrator depends on.
//!
//! - **Layout** (`layout.rs`) - Old and new directory naming, entry classification
//! - **Ports** (`ports.rs`) - Trait abstractions for external collaborators
//!
//! # Usage
//!
//! ```ignore
//! use region_migrate::domain::ports::{Catalog, FileSystem};
//!
//! fn count_meta_rows<C: Catalog>(catalog: &C) -> Result<usize> {
//!     let mut rows = 0;
//!     catalog.scan_root_catalog(&mut |_row| {
//!         rows += 1;
//!         Ok(true)
//!     })?;
//!     Ok(rows)
//! }
//! ```

pub mod layout;
pub mod ports;

pub use layout::{Classification, LayoutEntry};
pub use ports::{
    Catalog, CatalogRow, Confirm, DirEntry, FileSystem, RowVisitor, ServiceProbe, VersionStore,
};
