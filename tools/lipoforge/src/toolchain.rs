//! Locations of the external tools.
//!
//! The Xcode tools are found with `xcodebuild -find` the first time they are
//! needed and cached for the rest of the run, so an up-to-date build never
//! spawns a lookup.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};

use crate::project::ToolOverrides;

/// An Xcode-provided tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XcodeTool {
    Clang,
    Libtool,
    Lipo,
}

impl XcodeTool {
    pub fn name(self) -> &'static str {
        match self {
            Self::Clang => "clang",
            Self::Libtool => "libtool",
            Self::Lipo => "lipo",
        }
    }
}

/// Resolved tool paths for one run.
pub struct Toolchain {
    translator: PathBuf,
    clang: OnceLock<PathBuf>,
    libtool: OnceLock<PathBuf>,
    lipo: OnceLock<PathBuf>,
}

impl Toolchain {
    /// Create a toolchain; explicitly configured tools are never looked up.
    pub fn new(translator: PathBuf, overrides: &ToolOverrides) -> Self {
        let seeded = |p: &Option<PathBuf>| {
            let lock = OnceLock::new();
            if let Some(p) = p {
                let _ = lock.set(p.clone());
            }
            lock
        };
        Self {
            translator,
            clang: seeded(&overrides.clang),
            libtool: seeded(&overrides.libtool),
            lipo: seeded(&overrides.lipo),
        }
    }

    pub fn translator(&self) -> &Path {
        &self.translator
    }

    /// Path to `tool`, locating it on first use.
    pub fn get(&self, tool: XcodeTool) -> Result<&Path> {
        let slot = match tool {
            XcodeTool::Clang => &self.clang,
            XcodeTool::Libtool => &self.libtool,
            XcodeTool::Lipo => &self.lipo,
        };
        if let Some(path) = slot.get() {
            return Ok(path);
        }
        let found = xcode_find(tool.name())?;
        Ok(slot.get_or_init(|| found))
    }
}

/// Ask `xcodebuild -find <name>` where Xcode keeps a tool.
fn xcode_find(name: &str) -> Result<PathBuf> {
    let output = Command::new("xcodebuild")
        .arg("-find")
        .arg(name)
        .output()
        .with_context(|| format!("failed to run `xcodebuild -find {name}`"))?;

    if !output.status.success() {
        bail!(
            "xcodebuild could not find {name}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let path = String::from_utf8(output.stdout).context("non-UTF-8 xcodebuild output")?;
    let path = path.trim_end();
    if path.is_empty() {
        bail!("xcodebuild returned an empty path for {name}");
    }
    crate::verbose::detail!("  found {name} at {path}");
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_skip_lookup() {
        let overrides = ToolOverrides {
            clang: Some("/opt/clang".into()),
            libtool: Some("/opt/libtool".into()),
            lipo: Some("/opt/lipo".into()),
        };
        let tc = Toolchain::new("j2objc".into(), &overrides);
        assert_eq!(tc.get(XcodeTool::Clang).unwrap(), Path::new("/opt/clang"));
        assert_eq!(tc.get(XcodeTool::Libtool).unwrap(), Path::new("/opt/libtool"));
        assert_eq!(tc.get(XcodeTool::Lipo).unwrap(), Path::new("/opt/lipo"));
        assert_eq!(tc.translator(), Path::new("j2objc"));
    }
}
