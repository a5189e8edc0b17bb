//! The build pipeline.
//!
//! Phases run strictly in order, each gated on timestamps so that an
//! interrupted or repeated run converges on the same artifacts:
//!
//! translate → copy overrides → per-architecture archives → universal
//! archive → `current` symlink.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lipoforge_stale::{is_newer, touch};

use crate::arch;
use crate::env::XcodeEnv;
use crate::fat;
use crate::overrides;
use crate::project::Project;
use crate::publish;
use crate::tool_cmd::ToolRunner;
use crate::toolchain::Toolchain;
use crate::translate::{self, TranslateJob};
use crate::verbose::{self, Phase, detail, status};

/// Everything a phase needs, passed explicitly.
pub struct BuildContext<'a> {
    pub project: &'a Project,
    pub toolchain: &'a Toolchain,
    pub runner: &'a dyn ToolRunner,
    /// Treat every artifact as stale.
    pub force: bool,
    /// Maximum parallel compile jobs (0 = one per CPU).
    pub jobs: usize,
}

impl BuildContext<'_> {
    /// Returns `true` if `target` must be rebuilt from `source`.
    pub fn is_stale(&self, source: &Path, target: &Path) -> Result<bool> {
        if self.force {
            return Ok(true);
        }
        let stale = is_newer(source, target).with_context(|| {
            format!("failed to compare {} against {}", target.display(), source.display())
        })?;
        if stale {
            detail!("  stale: {} (from {})", target.display(), source.display());
        }
        Ok(stale)
    }
}

/// What a build run did.
#[derive(Debug)]
pub struct BuildSummary {
    /// Java sources handed to the translator.
    pub translated: usize,
    /// Override files copied into the generated directory.
    pub copied: usize,
    /// Architectures whose archive was rebuilt.
    pub rebuilt_archs: Vec<String>,
    /// Whether `lipo` produced a new universal archive.
    pub merged: bool,
    /// Universal archive the `current` symlink now points at.
    pub fat_archive: PathBuf,
}

/// Run all phases.
///
/// A failing tool aborts the run with a [`crate::tool_cmd::ToolFailure`]
/// carrying its exit code; later phases do not run.
pub fn run_build(ctx: &BuildContext<'_>, env: &XcodeEnv) -> Result<BuildSummary> {
    let project = ctx.project;

    let translated = translate_phase(ctx)?;
    let copied = copy_phase(ctx)?;

    let arch_libs = arch::build_arch_libs(ctx, env)?;
    let (fat_archive, merged) = fat::create_fat_lib(ctx, &arch_libs.archs, &arch_libs.archives)?;

    let link = project.current_link();
    status!("Updating symlink {}", link.display());
    publish::publish_symlink(&fat_archive, &link)?;

    Ok(BuildSummary {
        translated,
        copied,
        rebuilt_archs: arch_libs.rebuilt,
        merged,
        fat_archive,
    })
}

fn translate_phase(ctx: &BuildContext<'_>) -> Result<usize> {
    let project = ctx.project;
    let _phase = verbose::begin(Phase::Translate);

    translate_and_mark(
        ctx,
        &TranslateJob {
            input_dir: &project.sources,
            output_dir: &project.generated,
            options: &project.translator_options,
            flatten: project.flatten,
        },
    )
}

/// Translate stale sources, then touch the marker if the project's
/// generated directory changed.
///
/// Shared by the build and the `translate` command. Afterwards the marker is
/// newer than every archive linked from the previous generated sources.
pub fn translate_and_mark(ctx: &BuildContext<'_>, job: &TranslateJob<'_>) -> Result<usize> {
    let translated = translate::translate_stale(ctx, job)?;
    if translated > 0 && job.output_dir == ctx.project.generated {
        touch_marker(ctx.project)?;
    }
    Ok(translated)
}

fn copy_phase(ctx: &BuildContext<'_>) -> Result<usize> {
    let _phase = verbose::begin(Phase::CopyOverrides);
    let copied = overrides::copy_overrides(ctx)?;
    if copied > 0 {
        touch_marker(ctx.project)?;
    }
    Ok(copied)
}

fn touch_marker(project: &Project) -> Result<()> {
    touch(&project.marker)
        .with_context(|| format!("failed to touch {}", project.marker.display()))
}
