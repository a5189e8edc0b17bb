//! Hand-written Objective-C overrides.
//!
//! `.h`/`.m` files kept beside the Java sources are the source of truth for
//! their units and are copied over the generated directory whenever they are
//! newer than the copy there.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use lipoforge_stale::{SourceFile, discover, set_mtime};

use crate::pipeline::BuildContext;
use crate::translate::check_flattened_collisions;
use crate::verbose::status;

/// All override files under the source root.
pub fn find_overrides(sources: &Path) -> Result<Vec<SourceFile>> {
    let files = discover(sources).with_context(|| format!("failed to scan {}", sources.display()))?;
    Ok(files.into_iter().filter(|f| f.role.is_override()).collect())
}

/// Where an override lands inside the generated directory.
pub fn override_target(generated: &Path, rel: &Path, flatten: bool) -> PathBuf {
    match rel.file_name() {
        Some(name) if flatten => generated.join(name),
        _ => generated.join(rel),
    }
}

/// Copy every override that is newer than its generated counterpart.
///
/// Returns how many files were copied.
pub fn copy_overrides(ctx: &BuildContext<'_>) -> Result<usize> {
    let project = ctx.project;
    let mut copied = 0;

    let files = find_overrides(&project.sources)?;
    if project.flatten {
        let rel_paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        check_flattened_collisions(&rel_paths, Path::file_name)?;
    }

    for file in files {
        let source = project.sources.join(&file.path);
        let target = override_target(&project.generated, &file.path, project.flatten);

        if !ctx.is_stale(&source, &target)? {
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        status!("Copying {}", file.path.display());
        fs::copy(&source, &target).with_context(|| {
            format!("failed to copy {} to {}", source.display(), target.display())
        })?;
        // Copies are stamped with the copy time, never the source's mtime.
        set_mtime(&target, SystemTime::now())
            .with_context(|| format!("failed to update mtime of {}", target.display()))?;
        copied += 1;
    }

    Ok(copied)
}
