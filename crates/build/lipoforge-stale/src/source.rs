//! Source discovery.
//!
//! The source tree mixes Java compilation units with hand-written
//! Objective-C overrides. A `.h`/`.m` pair placed beside `Foo.java` replaces
//! the translator's output for that unit.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// What a file in the source tree is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceRole {
    /// A `.java` unit fed to the translator.
    Translatable,
    /// A hand-written `.h` override.
    Header,
    /// A hand-written `.m` override.
    Implementation,
}

impl SourceRole {
    /// File extension for this role, including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Translatable => ".java",
            Self::Header => ".h",
            Self::Implementation => ".m",
        }
    }

    /// Classify a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "java" => Some(Self::Translatable),
            "h" => Some(Self::Header),
            "m" => Some(Self::Implementation),
            _ => None,
        }
    }

    /// Returns `true` for hand-written Objective-C overrides.
    #[must_use]
    pub const fn is_override(self) -> bool {
        matches!(self, Self::Header | Self::Implementation)
    }
}

/// A classified file in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the source root.
    pub path: PathBuf,
    /// Role derived from the extension.
    pub role: SourceRole,
}

/// Find every file under `root` whose name ends in `extension`.
///
/// `extension` includes the leading dot (`".java"`). Returned paths are
/// relative to `root` and sorted.
///
/// # Errors
///
/// Fails if `root` or any directory beneath it cannot be read.
pub fn find_source_files(root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = walk_files(root)?
        .into_iter()
        .filter(|rel| {
            rel.file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Classify every recognised file under `root`.
///
/// Files with no [`SourceRole`] are ignored. The result is sorted by path.
///
/// # Errors
///
/// Fails if `root` or any directory beneath it cannot be read.
pub fn discover(root: &Path) -> io::Result<Vec<SourceFile>> {
    let mut files: Vec<SourceFile> = walk_files(root)?
        .into_iter()
        .filter_map(|path| SourceRole::from_path(&path).map(|role| SourceFile { path, role }))
        .collect();
    files.sort();
    Ok(files)
}

/// The hand-written `(header, implementation)` pair beside a Java source.
///
/// Returns `None` unless both files exist. `rel_source` is relative to
/// `source_root`; the returned paths are joined onto it.
#[must_use]
pub fn override_pair(source_root: &Path, rel_source: &Path) -> Option<(PathBuf, PathBuf)> {
    let base = source_root.join(rel_source);
    let header = base.with_extension("h");
    let implementation = base.with_extension("m");
    (header.is_file() && implementation.is_file()).then_some((header, implementation))
}

/// All regular files under `root`, relative to it, in traversal order.
fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?;
        files.push(rel.to_path_buf());
    }
    Ok(files)
}
