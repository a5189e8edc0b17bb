//! Universal archive creation with `lipo`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::pipeline::BuildContext;
use crate::tool_cmd::ToolCommand;
use crate::toolchain::XcodeTool;
use crate::verbose::{detail, status};

/// Merge the per-architecture archives into one universal archive.
///
/// Skipped when the universal archive is newer than every input. Returns
/// the universal archive path and whether `lipo` ran.
pub fn create_fat_lib(
    ctx: &BuildContext<'_>,
    archs: &BTreeSet<String>,
    arch_libs: &[PathBuf],
) -> Result<(PathBuf, bool)> {
    let dest = ctx.project.fat_archive(archs);

    if !any_stale(ctx, arch_libs, &dest)? {
        detail!("  {} is up to date", dest.display());
        return Ok((dest, false));
    }

    status!("Create fatlib: {}", dest.display());

    let lipo = ctx.toolchain.get(XcodeTool::Lipo)?;
    let mut cmd = ToolCommand::new("lipo", lipo);
    cmd.arg("-create").output(&dest).args(arch_libs);
    cmd.run_checked(ctx.runner)?;

    Ok((dest, true))
}

fn any_stale(ctx: &BuildContext<'_>, inputs: &[PathBuf], dest: &Path) -> Result<bool> {
    for input in inputs {
        if ctx.is_stale(input, dest)? {
            return Ok(true);
        }
    }
    Ok(false)
}
