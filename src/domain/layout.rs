//! Storage Layout Naming
//!
//! Value objects and naming rules for the two on-disk layouts.
//!
//! # Layouts
//!
//! ```text
//! old (flat)                       new (per table)
//! ─────────────────────────        ─────────────────────────────
//! <root>/hregion_70236052/         <root>/-ROOT-/70236052/
//! <root>/hregion_1028785192/       <root>/.META./1028785192/
//! <root>/hregion_<encoded>/        <root>/<table>/<encoded>/
//! <root>/log_<server>/             (recovered by the master)
//! ```

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

// =============================================================================
// Naming Constants
// =============================================================================

/// Prefix carried by every region directory in the flat layout.
pub const OLD_REGION_PREFIX: &str = "hregion_";

/// Prefix of region server write-ahead log files left at the root.
pub const LOG_FILE_PREFIX: &str = "log_";

/// Table directory holding the root region.
pub const ROOT_TABLE_NAME: &str = "-ROOT-";

/// Table directory holding the meta regions.
pub const META_TABLE_NAME: &str = ".META.";

/// Encoded name of the root region. Fixed across clusters.
pub const ROOT_REGION_ENCODED_NAME: &str = "70236052";

/// Store directory whose files may be references into other regions.
pub const MAPFILES_DIR: &str = "mapfiles";

/// Splits a reference file name into file id and referenced region.
pub const REFERENCE_SEPARATOR: char = '.';

// =============================================================================
// Classification
// =============================================================================

/// Classification of one top-level entry under the root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Flat-layout region directory with a parseable encoded name
    OldRegionDir(String),
    /// Unrecovered region server log
    LogFile,
    /// Anything the migrator cannot account for
    Unrecognized,
    /// Expected entry, nothing to do
    Normal,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::OldRegionDir(name) => write!(f, "OldRegionDir({})", name),
            Classification::LogFile => write!(f, "LogFile"),
            Classification::Unrecognized => write!(f, "Unrecognized"),
            Classification::Normal => write!(f, "Normal"),
        }
    }
}

/// One top-level entry as seen by a single scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub classification: Classification,
}

// =============================================================================
// Naming Helpers
// =============================================================================

/// Strip the flat-layout region prefix, if present.
pub fn strip_old_prefix(name: &str) -> Option<&str> {
    name.strip_prefix(OLD_REGION_PREFIX)
}

/// Strip the flat-layout region prefix from a raw file name. Works on the
/// bytes, so names that are not valid UTF-8 keep their remainder intact.
#[cfg(unix)]
pub fn strip_old_prefix_os(name: &OsStr) -> Option<&OsStr> {
    use std::os::unix::ffi::OsStrExt;

    name.as_bytes()
        .strip_prefix(OLD_REGION_PREFIX.as_bytes())
        .map(OsStr::from_bytes)
}

#[cfg(not(unix))]
pub fn strip_old_prefix_os(name: &OsStr) -> Option<&OsStr> {
    name.to_str().and_then(strip_old_prefix).map(OsStr::new)
}

/// Old-layout directory name for a region.
pub fn old_region_dir_name(encoded_name: &str) -> String {
    format!("{}{}", OLD_REGION_PREFIX, encoded_name)
}

/// Parse the legacy encoded name, which was always a 32-bit signed integer.
pub fn parse_legacy_encoded_name(name: &str) -> Option<i32> {
    name.parse::<i32>().ok()
}

/// Directory for a table in the new layout.
pub fn table_dir(root: &Path, table: &str) -> PathBuf {
    root.join(table)
}

/// Directory for a region in the new layout.
pub fn region_dir(root: &Path, table: &str, encoded_name: &str) -> PathBuf {
    table_dir(root, table).join(encoded_name)
}

/// Root region directory in the new layout. Its presence means the layout was
/// already migrated.
pub fn new_root_region_dir(root: &Path) -> PathBuf {
    region_dir(root, ROOT_TABLE_NAME, ROOT_REGION_ENCODED_NAME)
}

/// Root region directory in the old layout.
pub fn old_root_region_dir(root: &Path) -> PathBuf {
    root.join(old_region_dir_name(ROOT_REGION_ENCODED_NAME))
}

/// Extract the referenced region's encoded name from a store file name.
///
/// Reference files are named `<file id>.<encoded region name>`, where the file
/// id is all digits. Plain store files are just `<file id>`.
pub fn reference_token(file_name: &str) -> Option<&str> {
    let (file_id, referenced) = file_name.split_once(REFERENCE_SEPARATOR)?;
    if file_id.is_empty() || !file_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if referenced.is_empty() {
        return None;
    }
    Some(referenced)
}

// =============================================================================
// Tests
// =============================================================================
