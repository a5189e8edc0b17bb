//! Java → Objective-C translation.
//!
//! Collects every Java source whose generated header or implementation is
//! stale and hands the whole batch to the translator in one invocation.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use lipoforge_stale::{GeneratedUnit, SourceRole, find_source_files, override_pair};

use crate::pipeline::BuildContext;
use crate::tool_cmd::ToolCommand;
use crate::verbose::{detail, status};

/// Inputs of one translation run.
pub struct TranslateJob<'a> {
    pub input_dir: &'a Path,
    pub output_dir: &'a Path,
    pub options: &'a [String],
    /// Pass `--no-package-directories` and derive flattened output names.
    pub flatten: bool,
}

/// Translate every stale Java source under `job.input_dir`.
///
/// Sources with a hand-written `.h`/`.m` pair beside them are skipped.
/// Returns the number of sources handed to the translator; zero means no
/// translator process was started.
pub fn translate_stale(ctx: &BuildContext<'_>, job: &TranslateJob<'_>) -> Result<usize> {
    let java_files = find_source_files(job.input_dir, SourceRole::Translatable.extension())
        .with_context(|| format!("failed to scan {}", job.input_dir.display()))?;

    if job.flatten {
        check_flattened_collisions(&java_files, Path::file_stem)?;
    }

    let mut batch: Vec<PathBuf> = Vec::new();
    for rel in &java_files {
        let source = job.input_dir.join(rel);

        if override_pair(job.input_dir, rel).is_some() {
            status!("Skipping due to Objective-C Override: {}", source.display());
            continue;
        }

        let unit = GeneratedUnit::derive(rel, job.output_dir, job.flatten);
        let stale = ctx.force
            || unit
                .is_stale(&source)
                .with_context(|| format!("failed to stat {}", source.display()))?;
        if stale {
            detail!("  stale: {}", rel.display());
            batch.push(source);
        }
    }

    if batch.is_empty() {
        status!("No changes");
        return Ok(0);
    }

    std::fs::create_dir_all(job.output_dir)
        .with_context(|| format!("failed to create {}", job.output_dir.display()))?;

    let mut cmd = ToolCommand::new("j2objc", ctx.toolchain.translator());
    cmd.args(job.options);
    if job.flatten {
        cmd.arg("--no-package-directories");
    }
    cmd.sourcepath(job.input_dir)
        .destination(job.output_dir)
        .args(&batch);

    status!("Translating {} Java source(s)", batch.len());
    cmd.run_checked(ctx.runner)?;

    Ok(batch.len())
}

/// Flattened output drops package directories, so two files that share a
/// `name_of` key would overwrite each other in the generated directory.
///
/// Java sources are keyed by stem, overrides by file name.
pub fn check_flattened_collisions(
    rel_paths: &[PathBuf],
    name_of: fn(&Path) -> Option<&OsStr>,
) -> Result<()> {
    let mut seen: HashMap<&OsStr, &Path> = HashMap::new();
    for rel in rel_paths {
        let Some(name) = name_of(rel) else { continue };
        if let Some(first) = seen.insert(name, rel) {
            bail!(
                "{} and {} both generate {} when package directories are flattened",
                first.display(),
                rel.display(),
                name.to_string_lossy()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rels(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn java_stems_collide_across_packages() {
        let err = check_flattened_collisions(
            &rels(&["com/a/Foo.java", "org/b/Foo.java"]),
            Path::file_stem,
        )
        .unwrap_err();
        assert!(err.to_string().contains("com/a/Foo.java and org/b/Foo.java"));
    }

    #[test]
    fn override_pair_is_not_a_collision() {
        let files = rels(&["com/a/Foo.h", "com/a/Foo.m", "org/b/Bar.h"]);
        check_flattened_collisions(&files, Path::file_name).unwrap();
    }

    #[test]
    fn overrides_collide_by_file_name() {
        let files = rels(&["com/a/Foo.h", "org/b/Foo.h"]);
        assert!(check_flattened_collisions(&files, Path::file_name).is_err());
    }
}
