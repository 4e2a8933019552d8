//! Anomaly Policy
//!
//! Decides what happens to an entry the migrator cannot account for. Two
//! independent actions are configured: one for unrecovered log files and one
//! for every other anomaly.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::ports::{Confirm, FileSystem};
use crate::error::{Error, Result};

// =============================================================================
// Action
// =============================================================================

/// Disposition of an anomalous entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stop the run
    Abort,
    /// Log a warning and keep going
    #[default]
    Ignore,
    /// Delete the entry
    Delete,
    /// Ask the operator whether to delete
    Prompt,
}

/// Accepted action names.
pub const ACTION_NAMES: &str = "abort|ignore|delete|prompt";

static ACTIONS: Lazy<HashMap<&'static str, Action>> = Lazy::new(|| {
    HashMap::from([
        ("abort", Action::Abort),
        ("ignore", Action::Ignore),
        ("delete", Action::Delete),
        ("prompt", Action::Prompt),
    ])
});

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ACTIONS
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| {
                Error::Config(format!("Unknown action '{}', expected {{{}}}", s, ACTION_NAMES))
            })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Abort => write!(f, "abort"),
            Action::Ignore => write!(f, "ignore"),
            Action::Delete => write!(f, "delete"),
            Action::Prompt => write!(f, "prompt"),
        }
    }
}

// =============================================================================
// Anomaly Classes
// =============================================================================

/// Which configured action applies to an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyClass {
    LogFile,
    Other,
}

/// What the policy did with an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    Ignored,
    Deleted,
    Kept,
}

// =============================================================================
// Policy
// =============================================================================

/// Resolves anomalies for one run and remembers what it did.
pub struct AnomalyPolicy<'a> {
    fs: &'a dyn FileSystem,
    confirm: &'a dyn Confirm,
    log_files: Action,
    other_files: Action,
    warnings: Vec<String>,
    deleted: Vec<PathBuf>,
}

impl<'a> AnomalyPolicy<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        confirm: &'a dyn Confirm,
        log_files: Action,
        other_files: Action,
    ) -> Self {
        Self {
            fs,
            confirm,
            log_files,
            other_files,
            warnings: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Action configured for a class.
    pub fn action_for(&self, class: AnomalyClass) -> Action {
        match class {
            AnomalyClass::LogFile => self.log_files,
            AnomalyClass::Other => self.other_files,
        }
    }

    /// Apply the configured action for `class` to the entry at `path`.
    pub fn resolve(
        &mut self,
        class: AnomalyClass,
        message: &str,
        path: &Path,
    ) -> Result<Disposition> {
        match self.action_for(class) {
            Action::Abort => Err(Error::AnomalyAborted {
                message: message.to_string(),
                path: path.to_path_buf(),
            }),
            Action::Ignore => {
                warn!("{} ignoring", message);
                self.warnings.push(message.to_string());
                Ok(Disposition::Ignored)
            }
            Action::Delete => {
                self.delete(message, path)?;
                Ok(Disposition::Deleted)
            }
            Action::Prompt => {
                if self.confirm.confirm(&format!("{} delete? [y/n]", message)) {
                    self.delete(message, path)?;
                    Ok(Disposition::Deleted)
                } else {
                    Ok(Disposition::Kept)
                }
            }
        }
    }

    fn delete(&mut self, message: &str, path: &Path) -> Result<()> {
        info!("{} deleting", message);
        self.fs.remove(path).map_err(|e| Error::io(path, e))?;
        self.deleted.push(path.to_path_buf());
        Ok(())
    }

    /// Messages recorded under the ignore action.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Paths removed under the delete or prompt actions.
    pub fn deleted(&self) -> &[PathBuf] {
        &self.deleted
    }

    /// Consume the policy, returning warnings and deleted paths.
    pub fn into_parts(self) -> (Vec<String>, Vec<PathBuf>) {
        (self.warnings, self.deleted)
    }
}

// =============================================================================
// Tests
// =============================================================================
