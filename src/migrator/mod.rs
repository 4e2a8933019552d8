//! Migrator module
//!
//! Upgrades a region storage root from the flat layout to the per-table
//! layout.

mod engine;
pub mod guard;
pub mod orphans;
pub mod policy;
mod proptest;
pub mod references;
pub mod relocator;
pub mod scanner;
pub mod version;

pub use engine::{
    MigrationReport, MigrationState, MigrationStep, Migrator, MigratorConfig, MigratorPorts,
    Outcome, RunMode, RunPhase,
};
pub use policy::{Action, AnomalyClass, AnomalyPolicy, Disposition};
pub use references::ReferenceTracker;
pub use relocator::{RegionRelocator, RelocatedRegion};
pub use scanner::LayoutScanner;
pub use version::{VersionStatus, CURRENT_LAYOUT_VERSION, VERSION_FILE_NAME};
