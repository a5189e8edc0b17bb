//! Modification-time comparisons and the timestamp marker.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Returns `true` if `target` must be regenerated from `source`.
///
/// A missing `target` is always stale. Otherwise `target` is stale when
/// `source` was modified at or after it. Equal timestamps count as stale.
///
/// # Errors
///
/// Fails if `source` cannot be inspected. The source is expected to exist, so
/// callers should treat this as fatal.
pub fn is_newer(source: &Path, target: &Path) -> io::Result<bool> {
    let source_mtime = fs::metadata(source)?.modified()?;

    let target_mtime = match fs::metadata(target) {
        Ok(meta) => meta.modified()?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    };

    Ok(source_mtime >= target_mtime)
}

/// Create `path` if missing and set its modification time to now.
///
/// Parent directories are created as needed. Existing contents are preserved.
///
/// # Errors
///
/// Propagates any failure to create the directories or the file.
pub fn touch(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    set_mtime(path, SystemTime::now())
}

/// Set the modification time of an existing file.
///
/// # Errors
///
/// Fails if the file does not exist or cannot be opened for writing.
pub fn set_mtime(path: &Path, time: SystemTime) -> io::Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    file.set_modified(time)
}
