//! `lipoforge clean`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::project::Project;

/// Remove everything the build produces. Returns the removed paths.
///
/// Sources and hand-written overrides are never touched.
pub fn clean(project: &Project) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for dir in [&project.generated, &project.staging] {
        if dir.is_dir() {
            fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))?;
            removed.push(dir.clone());
        }
    }

    let link = project.current_link();
    for file in [&project.marker, &link] {
        if fs::symlink_metadata(file).is_ok() {
            fs::remove_file(file).with_context(|| format!("failed to remove {}", file.display()))?;
            removed.push(file.clone());
        }
    }

    for archive in archives(project)? {
        fs::remove_file(&archive)
            .with_context(|| format!("failed to remove {}", archive.display()))?;
        removed.push(archive);
    }

    Ok(removed)
}

/// Per-architecture and universal archives in the output directory.
fn archives(project: &Project) -> Result<Vec<PathBuf>> {
    if !project.output.is_dir() {
        return Ok(Vec::new());
    }
    let prefix = format!("{}_", project.name);
    let mut found = Vec::new();
    for entry in fs::read_dir(&project.output)
        .with_context(|| format!("failed to read {}", project.output.display()))?
    {
        let path = entry?.path();
        if is_archive_of(&path, &prefix) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn is_archive_of(path: &Path, prefix: &str) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".a"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_build_products_but_keeps_sources() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::parse(dir.path().to_path_buf(), "[library]\nname = \"sl\"\n").unwrap();

        let java = project.sources.join("A.java");
        fs::create_dir_all(&project.sources).unwrap();
        fs::write(&java, "").unwrap();
        fs::create_dir_all(&project.generated).unwrap();
        fs::create_dir_all(project.arch_staging("arm64")).unwrap();
        fs::write(&project.marker, "").unwrap();
        fs::write(project.arch_archive("arm64"), "").unwrap();
        let unrelated = project.output.join("other_arm64.a");
        fs::write(&unrelated, "").unwrap();

        let removed = clean(&project).unwrap();

        assert!(java.exists());
        assert!(unrelated.exists());
        assert!(!project.generated.exists());
        assert!(!project.staging.exists());
        assert!(!project.marker.exists());
        assert!(!project.arch_archive("arm64").exists());
        assert_eq!(removed.len(), 4);
    }

    #[test]
    fn nothing_to_clean() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_defaults(dir.path().to_path_buf());
        assert!(clean(&project).unwrap().is_empty());
    }
}
