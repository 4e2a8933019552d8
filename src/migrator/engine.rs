//! Migrator Engine
//!
//! Drives one layout upgrade run through its phases:
//!
//! ```text
//! Init → ValidateEnv → CheckVersion ──(current)──────────────────────▶ Done
//!                          │
//!                          ▼
//!        CheckNewLayoutPresence → ScanTopLevelAnomalies ──(check)───▶ Done
//!                                          │
//!                                          ▼
//!        RelocateRoot → RelocateViaCatalog → DetectOrphans → StampVersion → Done
//! ```
//!
//! Any error moves the run to `Failed`. No phase is re-entered and nothing is
//! rolled back; a rerun re-derives the remaining work from what is on disk.
//!
//! # Guarantees
//!
//! 1. Nothing under the root is touched before the environment checks pass
//! 2. Check mode never mutates the root
//! 3. An abort disposition stops the run at the offending entry

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::guard;
use super::orphans::OrphanDetector;
use super::policy::{Action, AnomalyPolicy};
use super::references::ReferenceTracker;
use super::relocator::{RegionRelocator, RelocatedRegion};
use super::scanner::LayoutScanner;
use super::version;
use crate::adapters::{DEFAULT_PROBE_TIMEOUT, DEFAULT_SERVICE_URL};
use crate::domain::layout::{self, META_TABLE_NAME, ROOT_REGION_ENCODED_NAME, ROOT_TABLE_NAME};
use crate::domain::ports::{Catalog, CatalogRow, Confirm, FileSystem, ServiceProbe, VersionStore};
use crate::error::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Whether a run may modify the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Report what would happen, change nothing
    Check,
    /// Perform the upgrade
    #[default]
    Upgrade,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Check => write!(f, "check"),
            RunMode::Upgrade => write!(f, "upgrade"),
        }
    }
}

/// Configuration for the migrator
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Check or upgrade
    pub mode: RunMode,

    /// Disposition of unrecovered region server logs
    pub log_files: Action,

    /// Disposition of every other unexpected entry
    pub other_files: Action,

    /// Status URL of the storage service; `None` skips the liveness probe
    pub service_url: Option<String>,

    /// Timeout for the liveness probe
    pub probe_timeout: Duration,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Upgrade,
            log_files: Action::Ignore,
            other_files: Action::Ignore,
            service_url: Some(DEFAULT_SERVICE_URL.to_string()),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl MigratorConfig {
    pub fn is_read_only(&self) -> bool {
        self.mode == RunMode::Check
    }

    /// Actions in force for (log files, other files). Check mode always
    /// ignores, whatever was configured.
    pub fn effective_actions(&self) -> (Action, Action) {
        if self.is_read_only() {
            (Action::Ignore, Action::Ignore)
        } else {
            (self.log_files, self.other_files)
        }
    }
}

// =============================================================================
// Run State Machine
// =============================================================================

/// Phases of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Init,
    ValidateEnv,
    CheckVersion,
    CheckNewLayoutPresence,
    ScanTopLevelAnomalies,
    RelocateRoot,
    RelocateViaCatalog,
    DetectOrphans,
    StampVersion,
    Done,
    Failed,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Init => write!(f, "Init"),
            RunPhase::ValidateEnv => write!(f, "ValidateEnv"),
            RunPhase::CheckVersion => write!(f, "CheckVersion"),
            RunPhase::CheckNewLayoutPresence => write!(f, "CheckNewLayoutPresence"),
            RunPhase::ScanTopLevelAnomalies => write!(f, "ScanTopLevelAnomalies"),
            RunPhase::RelocateRoot => write!(f, "RelocateRoot"),
            RunPhase::RelocateViaCatalog => write!(f, "RelocateViaCatalog"),
            RunPhase::DetectOrphans => write!(f, "DetectOrphans"),
            RunPhase::StampVersion => write!(f, "StampVersion"),
            RunPhase::Done => write!(f, "Done"),
            RunPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Version marker was current; nothing scanned or changed
    AlreadyCurrent,
    /// Check mode found work to do
    UpgradeRequired,
    /// Check mode found nothing to move
    NoUpgradeRequired,
    /// Upgrade mode finished and stamped the version marker
    Upgraded,
    Failed,
}

/// Run-scoped mutable record. Lives for exactly one run.
#[derive(Debug, Clone, Default)]
pub struct MigrationState {
    pub read_only: bool,
    pub new_layout_present: bool,
    pub migration_needed: bool,
    pub references: ReferenceTracker,
}

/// A step in the run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStep {
    pub phase: RunPhase,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub duration_ms: Option<u64>,
}

/// Result of a migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Storage root the run operated on
    pub root: String,

    pub mode: RunMode,

    /// Current (final, once returned) phase
    pub phase: RunPhase,

    pub outcome: Option<Outcome>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,

    /// Whether old-layout regions were found
    pub migration_needed: bool,

    /// Anomalies resolved with the ignore action
    pub warnings: Vec<String>,

    /// Regions moved into the new layout, in move order
    pub relocated: Vec<RelocatedRegion>,

    /// Entries deleted by the delete or prompt actions
    pub deleted: Vec<PathBuf>,

    /// Old-layout regions the catalog did not account for
    pub orphans: Vec<PathBuf>,

    /// Encoded names referenced from other regions' store files
    pub referenced_regions: Vec<String>,

    /// Error if failed
    pub error: Option<String>,

    /// Step-by-step log
    pub steps: Vec<MigrationStep>,
}

impl MigrationReport {
    fn new(root: &str, mode: RunMode) -> Self {
        let now = Utc::now();
        Self {
            root: root.to_string(),
            mode,
            phase: RunPhase::Init,
            outcome: None,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
            migration_needed: false,
            warnings: vec![],
            relocated: vec![],
            deleted: vec![],
            orphans: vec![],
            referenced_regions: vec![],
            error: None,
            steps: vec![],
        }
    }

    /// Check if the run succeeded
    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Done
    }

    /// Record a phase transition
    fn transition(&mut self, phase: RunPhase, message: &str) {
        let now = Utc::now();
        let last_step_time = self
            .steps
            .last()
            .map(|s| s.timestamp)
            .unwrap_or(self.start_time);
        let duration_ms = (now - last_step_time).num_milliseconds().max(0) as u64;

        self.phase = phase;
        self.steps.push(MigrationStep {
            phase,
            timestamp: now,
            message: message.to_string(),
            duration_ms: Some(duration_ms),
        });

        self.end_time = now;
        self.duration = (now - self.start_time).to_std().unwrap_or(Duration::ZERO);
    }

    /// Finish successfully
    fn complete(&mut self, outcome: Outcome, message: &str) {
        self.outcome = Some(outcome);
        self.transition(RunPhase::Done, message);
    }

    /// Mark as failed
    fn fail(&mut self, error: &str) {
        self.outcome = Some(Outcome::Failed);
        self.transition(RunPhase::Failed, error);
        self.error = Some(error.to_string());
    }

    fn absorb(&mut self, state: &MigrationState, policy: AnomalyPolicy<'_>) {
        let (warnings, deleted) = policy.into_parts();
        self.warnings = warnings;
        self.deleted = deleted;
        self.migration_needed = state.migration_needed;
        self.referenced_regions = state.references.iter().map(str::to_string).collect();
    }
}

// =============================================================================
// Migrator
// =============================================================================

/// External collaborators the migrator works through.
#[derive(Clone)]
pub struct MigratorPorts {
    pub fs: Arc<dyn FileSystem>,
    pub versions: Arc<dyn VersionStore>,
    pub catalog: Arc<dyn Catalog>,
    pub probe: Arc<dyn ServiceProbe>,
    pub confirm: Arc<dyn Confirm>,
}

/// Upgrades a flat region layout to the per-table layout
pub struct Migrator {
    config: MigratorConfig,
    ports: MigratorPorts,
}

impl Migrator {
    /// Create a new migrator
    pub fn new(config: MigratorConfig, ports: MigratorPorts) -> Self {
        Self { config, ports }
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Run the migration against `root` (absolute path or `file://` URL).
    pub async fn run(&self, root: &str) -> Result<MigrationReport> {
        let (report, result) = self.execute(root).await;
        result.map(|()| report)
    }

    /// Like [`Migrator::run`], but the report comes back on failure too, in
    /// the `Failed` phase with the error recorded.
    #[instrument(skip(self), fields(mode = %self.config.mode))]
    pub async fn execute(&self, root: &str) -> (MigrationReport, Result<()>) {
        let mut report = MigrationReport::new(root, self.config.mode);
        let label = if self.config.is_read_only() {
            "Upgrade check"
        } else {
            "Upgrade"
        };

        let result = self.do_run(root, &mut report).await;
        match &result {
            Ok(()) => {
                info!(
                    "{} finished with {:?} in {:?}",
                    label, report.outcome, report.duration
                );
            }
            Err(e) => {
                let phase = report.phase;
                report.fail(&e.to_string());
                error!(kind = ?e.kind(), "{} failed in phase {}: {}", label, phase, e);
            }
        }
        (report, result)
    }

    /// Internal run logic
    async fn do_run(&self, root: &str, report: &mut MigrationReport) -> Result<()> {
        let fs = self.ports.fs.as_ref();

        // =====================================================================
        // Phase 1: Environment
        // =====================================================================
        report.transition(RunPhase::ValidateEnv, "Validating environment");

        let root = guard::validate_root_path(root)?;
        guard::ensure_filesystem_reachable(fs, &root)?;
        guard::ensure_service_offline(self.ports.probe.as_ref()).await?;

        let mut state = MigrationState {
            read_only: self.config.is_read_only(),
            ..Default::default()
        };
        info!(
            "Starting upgrade{} of {}",
            if state.read_only { " check" } else { "" },
            root.display()
        );

        // =====================================================================
        // Phase 2: Version marker
        // =====================================================================
        report.transition(RunPhase::CheckVersion, "Checking layout version");

        let status = version::check_version(self.ports.versions.as_ref(), &root)?;
        if status.is_current() {
            info!("No upgrade necessary.");
            report.complete(Outcome::AlreadyCurrent, "Layout version is current");
            return Ok(());
        }

        // =====================================================================
        // Phase 3: Classify the root
        // =====================================================================
        report.transition(
            RunPhase::CheckNewLayoutPresence,
            "Checking for the new root region directory",
        );

        let scanner = LayoutScanner::new(fs, &root);
        state.new_layout_present = scanner.new_layout_present();
        state.migration_needed = !state.new_layout_present;

        let (log_files, other_files) = self.config.effective_actions();
        let mut policy =
            AnomalyPolicy::new(fs, self.ports.confirm.as_ref(), log_files, other_files);

        report.transition(
            RunPhase::ScanTopLevelAnomalies,
            "Scanning root directory for anomalies",
        );
        let summary = scanner.scan(state.new_layout_present, &mut policy)?;
        state.migration_needed |= summary.migration_needed;

        // =====================================================================
        // Phase 4: Relocate
        // =====================================================================
        if !state.new_layout_present {
            let old_root_region = layout::old_root_region_dir(&root);
            if !fs.exists(&old_root_region) {
                return Err(Error::RootRegionMissing(old_root_region));
            }

            if !state.read_only {
                let relocator = RegionRelocator::new(fs, &root);

                report.transition(RunPhase::RelocateRoot, "Relocating root region");
                let moved = relocator.relocate(
                    ROOT_TABLE_NAME,
                    &layout::old_region_dir_name(ROOT_REGION_ENCODED_NAME),
                    &mut state.references,
                )?;
                report.relocated.push(moved);

                report.transition(
                    RunPhase::RelocateViaCatalog,
                    "Relocating meta and table regions from the catalog",
                );
                self.relocate_via_catalog(&relocator, &mut state, &mut report.relocated)?;

                report.transition(
                    RunPhase::DetectOrphans,
                    "Scanning for regions not in the catalog",
                );
                report.orphans =
                    OrphanDetector::new(fs, &root).detect(&state.references, &mut policy)?;
            }
        }

        report.absorb(&state, policy);

        // =====================================================================
        // Phase 5: Commit
        // =====================================================================
        if !state.read_only {
            report.transition(RunPhase::StampVersion, "Setting file system version");
            version::stamp_version(self.ports.versions.as_ref(), &root)?;
            info!("Upgrade successful.");
            report.complete(Outcome::Upgraded, "Upgrade successful");
        } else if state.migration_needed {
            warn!("Upgrade needed.");
            report.complete(Outcome::UpgradeRequired, "Upgrade needed");
        } else {
            info!("No regions need to be moved.");
            report.complete(Outcome::NoUpgradeRequired, "No regions need to be moved");
        }

        Ok(())
    }

    /// Relocate every meta region listed by the root catalog, then every table
    /// region listed by each meta region, in catalog order.
    fn relocate_via_catalog(
        &self,
        relocator: &RegionRelocator<'_>,
        state: &mut MigrationState,
        relocated: &mut Vec<RelocatedRegion>,
    ) -> Result<()> {
        let catalog = self.ports.catalog.as_ref();

        catalog.scan_root_catalog(&mut |meta_row: &CatalogRow| {
            let moved = relocator.relocate(
                META_TABLE_NAME,
                &layout::old_region_dir_name(&meta_row.encoded_name),
                &mut state.references,
            )?;
            relocated.push(moved);

            catalog.scan_table_catalog(meta_row, &mut |region_row: &CatalogRow| {
                let moved = relocator.relocate(
                    &region_row.table,
                    &layout::old_region_dir_name(&region_row.encoded_name),
                    &mut state.references,
                )?;
                relocated.push(moved);
                Ok(true)
            })?;

            Ok(true)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryCatalog, InMemoryFileSystem, ScriptedConfirm, StaticServiceProbe};
    use assert_matches::assert_matches;
    use std::path::Path;

    const META: &str = "1028785192";

    fn migrator(
        fs: &Arc<InMemoryFileSystem>,
        catalog: InMemoryCatalog,
        config: MigratorConfig,
    ) -> Migrator {
        Migrator::new(
            config,
            MigratorPorts {
                fs: fs.clone(),
                versions: fs.clone(),
                catalog: Arc::new(catalog),
                probe: Arc::new(StaticServiceProbe::offline()),
                confirm: Arc::new(ScriptedConfirm::default()),
            },
        )
    }

    fn upgrade(log_files: Action, other_files: Action) -> MigratorConfig {
        MigratorConfig {
            mode: RunMode::Upgrade,
            log_files,
            other_files,
            ..Default::default()
        }
    }

    /// Root, one meta region, and two table regions in the flat layout.
    fn flat_layout() -> (Arc<InMemoryFileSystem>, InMemoryCatalog) {
        let fs = Arc::new(InMemoryFileSystem::new());
        fs.add_dir("/data/hregion_70236052/info/mapfiles");
        fs.add_dir("/data/hregion_1028785192/info/mapfiles");
        fs.add_file("/data/hregion_11/info/mapfiles/100", "store");
        fs.add_dir("/data/hregion_22/compaction.dir/hregion_22");
        let catalog = InMemoryCatalog::new().with_meta_region(
            META,
            vec![CatalogRow::new("users", "11"), CatalogRow::new("orders", "22")],
        );
        (fs, catalog)
    }

    // =========================================================================
    // Config Tests
    // =========================================================================

    #[test]
    fn test_check_mode_forces_ignore() {
        let config = MigratorConfig {
            mode: RunMode::Check,
            log_files: Action::Delete,
            other_files: Action::Abort,
            ..Default::default()
        };
        assert!(config.is_read_only());
        assert_eq!(config.effective_actions(), (Action::Ignore, Action::Ignore));

        let config = upgrade(Action::Delete, Action::Abort);
        assert_eq!(config.effective_actions(), (Action::Delete, Action::Abort));
    }

    #[test]
    fn test_config_defaults() {
        let config = MigratorConfig::default();
        assert_eq!(config.mode, RunMode::Upgrade);
        assert_eq!(config.log_files, Action::Ignore);
        assert_eq!(config.other_files, Action::Ignore);
        assert_eq!(config.service_url.as_deref(), Some("http://localhost:60010/"));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
    }

    // =========================================================================
    // Report Tests
    // =========================================================================

    #[test]
    fn test_report_transitions() {
        let mut report = MigrationReport::new("/data", RunMode::Upgrade);
        assert_eq!(report.phase, RunPhase::Init);

        report.transition(RunPhase::ValidateEnv, "Validating");
        report.transition(RunPhase::CheckVersion, "Checking");
        assert_eq!(report.phase, RunPhase::CheckVersion);
        assert_eq!(report.steps.len(), 2);
        assert!(!report.is_success());

        report.complete(Outcome::AlreadyCurrent, "Current");
        assert!(report.is_success());
        assert_eq!(report.outcome, Some(Outcome::AlreadyCurrent));
    }

    #[test]
    fn test_report_fail() {
        let mut report = MigrationReport::new("/data", RunMode::Upgrade);
        report.transition(RunPhase::ScanTopLevelAnomalies, "Scanning");
        report.fail("Unrecognized file x aborting");

        assert_eq!(report.phase, RunPhase::Failed);
        assert_eq!(report.outcome, Some(Outcome::Failed));
        assert_eq!(report.error.as_deref(), Some("Unrecognized file x aborting"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = MigrationReport::new("/data", RunMode::Check);
        report.complete(Outcome::UpgradeRequired, "Upgrade needed");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"mode\":\"check\""));
        assert!(json.contains("\"phase\":\"Done\""));
        assert!(json.contains("\"outcome\":\"UpgradeRequired\""));
    }

    // =========================================================================
    // Run Tests
    // =========================================================================

    #[tokio::test]
    async fn test_upgrade_relocates_catalog_regions_in_order() {
        let (fs, catalog) = flat_layout();
        let report = migrator(&fs, catalog, MigratorConfig::default())
            .run("/data")
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(Outcome::Upgraded));
        assert!(report.migration_needed);

        let moves: Vec<_> = report
            .relocated
            .iter()
            .map(|r| (r.table.as_str(), r.encoded_name.as_str()))
            .collect();
        assert_eq!(
            moves,
            vec![
                ("-ROOT-", "70236052"),
                (".META.", META),
                ("users", "11"),
                ("orders", "22"),
            ]
        );

        assert!(fs.is_dir(Path::new("/data/-ROOT-/70236052/info/mapfiles")));
        assert!(fs.is_dir(Path::new("/data/.META./1028785192")));
        assert!(fs.exists(Path::new("/data/users/11/info/mapfiles/100")));
        assert!(fs.is_dir(Path::new("/data/orders/22/compaction.dir/22")));
        assert_eq!(fs.read_file("/data/hbase.version"), Some("1".to_string()));
        assert!(report.orphans.is_empty());
    }

    #[tokio::test]
    async fn test_check_mode_reports_without_mutation() {
        let (fs, catalog) = flat_layout();
        fs.add_file("/data/log_1234", "edits");
        let config = MigratorConfig {
            mode: RunMode::Check,
            log_files: Action::Delete,
            other_files: Action::Delete,
            ..Default::default()
        };

        let report = migrator(&fs, catalog, config).run("/data").await.unwrap();

        assert_eq!(report.outcome, Some(Outcome::UpgradeRequired));
        assert!(report.relocated.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(fs.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let (fs, catalog) = flat_layout();
        let m = migrator(&fs, catalog, MigratorConfig::default());

        m.run("/data").await.unwrap();
        let after_first = fs.mutation_count();
        let paths = fs.paths();

        let report = m.run("/data").await.unwrap();
        assert_eq!(report.outcome, Some(Outcome::AlreadyCurrent));
        assert_eq!(fs.mutation_count(), after_first);
        assert_eq!(fs.paths(), paths);
        assert!(!report
            .steps
            .iter()
            .any(|s| s.phase == RunPhase::ScanTopLevelAnomalies));
    }

    #[tokio::test]
    async fn test_orphan_referenced_by_other_region() {
        let (fs, catalog) = flat_layout();
        fs.add_file("/data/hregion_11/info/mapfiles/200.33", "reference");
        fs.add_dir("/data/hregion_33/info");
        fs.add_dir("/data/hregion_44/info");

        let report = migrator(&fs, catalog, MigratorConfig::default())
            .run("/data")
            .await
            .unwrap();

        assert_eq!(report.referenced_regions, vec!["33".to_string()]);
        assert_eq!(
            report.orphans,
            vec![
                PathBuf::from("/data/hregion_33"),
                PathBuf::from("/data/hregion_44")
            ]
        );
        assert!(report
            .warnings
            .contains(&"Region not in catalog but referenced by another region: hregion_33".to_string()));
        assert!(report
            .warnings
            .contains(&"Region not in catalog and unreferenced: hregion_44".to_string()));
    }

    #[tokio::test]
    async fn test_delete_policy_removes_anomalies_and_completes() {
        let (fs, catalog) = flat_layout();
        fs.add_file("/data/stray.txt", "?");
        fs.add_dir("/data/hregion_44");

        let report = migrator(&fs, catalog, upgrade(Action::Ignore, Action::Delete))
            .run("/data")
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(Outcome::Upgraded));
        assert!(!fs.exists(Path::new("/data/stray.txt")));
        assert!(!fs.exists(Path::new("/data/hregion_44")));
        assert_eq!(
            report.deleted,
            vec![
                PathBuf::from("/data/stray.txt"),
                PathBuf::from("/data/hregion_44")
            ]
        );
    }

    #[tokio::test]
    async fn test_abort_on_unparseable_region_before_relocation() {
        let (fs, catalog) = flat_layout();
        fs.add_dir("/data/hregion_abcXYZ");

        let result = migrator(&fs, catalog, upgrade(Action::Ignore, Action::Abort))
            .run("/data")
            .await;

        assert_matches!(result, Err(Error::AnomalyAborted { message, .. }) if message.contains("hregion_abcXYZ"));
        assert!(fs.exists(Path::new("/data/hregion_abcXYZ")));
        assert!(fs.exists(Path::new("/data/hregion_70236052")));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_run_returns_failed_report() {
        let (fs, catalog) = flat_layout();
        fs.add_dir("/data/hregion_abcXYZ");

        let (report, result) = migrator(&fs, catalog, upgrade(Action::Ignore, Action::Abort))
            .execute("/data")
            .await;

        assert_matches!(result, Err(Error::AnomalyAborted { .. }));
        assert_eq!(report.phase, RunPhase::Failed);
        assert_eq!(report.outcome, Some(Outcome::Failed));
        assert_eq!(
            report.error.as_deref(),
            Some("Old region format cannot be upgraded: hregion_abcXYZ aborting")
        );
        assert_eq!(
            report.steps.iter().rev().nth(1).map(|s| s.phase),
            Some(RunPhase::ScanTopLevelAnomalies)
        );
    }

    #[tokio::test]
    async fn test_missing_root_region_fails() {
        let fs = Arc::new(InMemoryFileSystem::new());
        fs.add_dir("/data/hregion_11");

        let result = migrator(&fs, InMemoryCatalog::new(), MigratorConfig::default())
            .run("/data")
            .await;

        assert_matches!(result, Err(Error::RootRegionMissing(p)) if p == Path::new("/data/hregion_70236052"));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_new_layout_present_flags_stale_regions_and_stamps() {
        let fs = Arc::new(InMemoryFileSystem::new());
        fs.add_dir("/data/-ROOT-/70236052");
        fs.add_dir("/data/users/11");
        fs.add_dir("/data/hregion_11");

        let report = migrator(&fs, InMemoryCatalog::new(), MigratorConfig::default())
            .run("/data")
            .await
            .unwrap();

        assert_eq!(report.outcome, Some(Outcome::Upgraded));
        assert!(!report.migration_needed);
        assert!(report.relocated.is_empty());
        assert_eq!(report.warnings, vec!["Old region directory found: hregion_11".to_string()]);
        assert_eq!(fs.read_file("/data/hbase.version"), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_service_running_blocks_run() {
        let (fs, catalog) = flat_layout();
        let m = Migrator::new(
            MigratorConfig::default(),
            MigratorPorts {
                fs: fs.clone(),
                versions: fs.clone(),
                catalog: Arc::new(catalog),
                probe: Arc::new(StaticServiceProbe::online()),
                confirm: Arc::new(ScriptedConfirm::default()),
            },
        );

        assert_matches!(m.run("/data").await, Err(Error::ServiceRunning { .. }));
        assert_eq!(fs.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_relocation_failure_is_fatal() {
        let (fs, _) = flat_layout();
        // Catalog names a meta region that is not on disk
        let catalog = InMemoryCatalog::new().with_meta_region("999", vec![]);

        let result = migrator(&fs, catalog, MigratorConfig::default())
            .run("/data")
            .await;

        assert_matches!(result, Err(Error::Relocation { .. }));
        assert!(fs.read_file("/data/hbase.version").is_none());
    }
}
