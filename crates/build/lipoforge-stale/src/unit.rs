//! Paths of the files the translator generates for one Java source.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::mtime::is_newer;

/// The header/implementation pair generated for one translatable source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Generated `.h` path.
    pub header: PathBuf,
    /// Generated `.m` path.
    pub implementation: PathBuf,
}

impl GeneratedUnit {
    /// Derive the generated paths for `rel_source` under `out_dir`.
    ///
    /// With `flatten`, package directories are dropped and every unit lands
    /// directly in `out_dir`, so two sources with the same file name collide.
    #[must_use]
    pub fn derive(rel_source: &Path, out_dir: &Path, flatten: bool) -> Self {
        let stem = rel_source.file_stem().unwrap_or(rel_source.as_os_str());
        let base = match rel_source.parent() {
            Some(parent) if !flatten => out_dir.join(parent).join(stem),
            _ => out_dir.join(stem),
        };

        Self {
            header: with_suffix(&base, ".h"),
            implementation: with_suffix(&base, ".m"),
        }
    }

    /// Returns `true` if either generated file is stale relative to `source`.
    ///
    /// # Errors
    ///
    /// Fails if `source` cannot be inspected.
    pub fn is_stale(&self, source: &Path) -> io::Result<bool> {
        Ok(is_newer(source, &self.header)? || is_newer(source, &self.implementation)?)
    }
}

/// Append `suffix` to the final path component.
///
/// `Path::with_extension` would truncate stems that contain a dot.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
