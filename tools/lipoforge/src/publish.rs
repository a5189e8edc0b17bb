//! The stable `current_<name>.a` symlink.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Point `link` at `target` using a path relative to the link's directory.
///
/// The new link is created under a temporary name and renamed over the old
/// one, so `link` never goes missing.
pub fn publish_symlink(target: &Path, link: &Path) -> Result<()> {
    let link_dir = link.parent().unwrap_or(Path::new(""));
    let relative = relative_path(target, link_dir);

    let mut tmp_name = OsString::from(".");
    tmp_name.push(link.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp = link_dir.join(tmp_name);

    if !link_dir.as_os_str().is_empty() {
        fs::create_dir_all(link_dir)
            .with_context(|| format!("failed to create {}", link_dir.display()))?;
    }
    if fs::symlink_metadata(&tmp).is_ok() {
        fs::remove_file(&tmp).with_context(|| format!("failed to remove {}", tmp.display()))?;
    }

    symlink(&relative, &tmp)
        .with_context(|| format!("failed to create symlink {}", tmp.display()))?;
    fs::rename(&tmp, link)
        .with_context(|| format!("failed to replace symlink {}", link.display()))?;
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

/// Express `target` relative to the directory `base`.
///
/// Both paths are taken lexically; neither needs to exist.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = target.components().filter(|c| *c != Component::CurDir).collect();
    let base: Vec<Component<'_>> = base.components().filter(|c| *c != Component::CurDir).collect();

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for comp in &target[common..] {
        rel.push(comp.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}
