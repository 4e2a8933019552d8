//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │  FileSystem │ VersionStore │ Catalog │ ServiceProbe │ Confirm│ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ LocalFileSystem │ ManifestCatalog │ HttpServiceProbe       │ │
//! │  │ ConsoleConfirm  │ in-memory doubles for tests              │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod catalog;
mod confirm;
mod local_fs;
mod memory_fs;
mod probe;

pub use catalog::{InMemoryCatalog, ManifestCatalog, MANIFEST_FILE_NAME};
pub use confirm::{ask, is_affirmative, ConsoleConfirm, ScriptedConfirm};
pub use local_fs::LocalFileSystem;
pub use memory_fs::InMemoryFileSystem;
pub use probe::{HttpServiceProbe, StaticServiceProbe, DEFAULT_PROBE_TIMEOUT, DEFAULT_SERVICE_URL};
