//! Environment checks run before anything under the root is touched.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{info, instrument};

use crate::domain::ports::{FileSystem, ServiceProbe};
use crate::error::{Error, Result};

/// Validate the configured root and turn it into a local path.
///
/// Accepts an absolute path or a `file://` URL with an empty or `localhost`
/// authority.
pub fn validate_root_path(root: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| Error::InvalidRootPath {
        path: root.to_string(),
        reason: reason.to_string(),
    };

    if root.trim().is_empty() {
        return Err(invalid("path is empty"));
    }

    if root.contains("://") {
        let url = Url::parse(root).map_err(|e| invalid(&format!("not a valid URL: {}", e)))?;
        if url.scheme() != "file" {
            return Err(invalid(&format!(
                "scheme '{}' is not supported, expected 'file'",
                url.scheme()
            )));
        }
        match url.host_str() {
            None | Some("") | Some("localhost") => {}
            Some(host) => {
                return Err(invalid(&format!(
                    "authority '{}' is not the local host",
                    host
                )))
            }
        }
        return url
            .to_file_path()
            .map_err(|_| invalid("URL does not name a local path"));
    }

    let path = PathBuf::from(root);
    if !path.is_absolute() {
        return Err(invalid("path must be absolute"));
    }
    Ok(path)
}

/// Fail unless the root exists and is a directory.
pub fn ensure_filesystem_reachable(fs: &dyn FileSystem, root: &Path) -> Result<()> {
    info!("Verifying that file system is available...");
    if !fs.exists(root) {
        return Err(Error::FilesystemUnavailable(format!(
            "{} does not exist",
            root.display()
        )));
    }
    if !fs.is_dir(root) {
        return Err(Error::FilesystemUnavailable(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(())
}

/// Fail if the storage service answers its liveness probe.
#[instrument(skip(probe))]
pub async fn ensure_service_offline(probe: &dyn ServiceProbe) -> Result<()> {
    info!("Verifying that the storage service is not running...");
    if probe.is_running().await {
        return Err(Error::ServiceRunning {
            url: probe.endpoint(),
        });
    }
    Ok(())
}
