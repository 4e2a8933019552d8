//! Region Migrate - Offline Storage Layout Upgrader
//!
//! Upgrades the on-disk directory layout of a region storage root from the
//! flat layout, where every region lives at `<root>/hregion_<encoded>`, to the
//! per-table layout `<root>/<table>/<encoded>`. The catalog decides which
//! table each region belongs to; whatever the catalog does not reach is
//! reported as an orphan.
//!
//! # Architecture
//!
//! ```text
//! Guard → Version Probe → Layout Scanner → Region Relocator → Orphan Detector → Version Stamper
//!                               │                 │                  │
//!                               └──── Anomaly Policy ◀───────────────┘
//! ```
//!
//! The core never touches the filesystem, the catalog or the operator
//! directly. It talks to the ports in [`domain::ports`], implemented by the
//! adapters in [`adapters`].
//!
//! # Modules
//!
//! - [`adapters`] - Local and in-memory implementations of the domain ports
//! - [`domain`] - Layout naming rules and port traits
//! - [`error`] - Error types
//! - [`migrator`] - Scanner, relocator and the run state machine

pub mod adapters;
pub mod domain;
pub mod error;
pub mod migrator;

// Re-export commonly used types
pub use error::{Error, Result};
pub use migrator::{
    Action, MigrationReport, Migrator, MigratorConfig, MigratorPorts, Outcome, RunMode,
};
