//! Per-architecture static libraries.
//!
//! Each architecture's archive is rebuilt whenever it is older than the
//! timestamp marker: every generated `.m` is compiled to its own object
//! file, then all objects are linked with one `libtool -static` call.
//! Compilation of one architecture may fan out over a worker pool.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};

use anyhow::{Context, Result, bail};
use lipoforge_stale::{GeneratedUnit, SourceRole, find_source_files};

use crate::env::XcodeEnv;
use crate::overrides::{find_overrides, override_target};
use crate::pipeline::BuildContext;
use crate::project::Project;
use crate::tool_cmd::ToolCommand;
use crate::toolchain::XcodeTool;
use crate::verbose::{self, Phase, detail, status};

/// Result of the per-architecture phase.
pub struct ArchLibs {
    /// Architectures built, in sorted order.
    pub archs: BTreeSet<String>,
    /// One archive per architecture, in the same order.
    pub archives: Vec<PathBuf>,
    /// Architectures whose archive was rebuilt this run.
    pub rebuilt: Vec<String>,
}

/// One compiler invocation for a single unit.
struct CompileJob {
    unit: PathBuf,
    cmd: ToolCommand,
}

/// Rebuild every per-architecture archive older than the marker.
pub fn build_arch_libs(ctx: &BuildContext<'_>, env: &XcodeEnv) -> Result<ArchLibs> {
    let project = ctx.project;
    let archs = env.target_archs();
    if archs.is_empty() {
        bail!(
            "no architecture to build: ARCHS ({}) and VALID_ARCHS ({}) have nothing in common",
            join(&env.archs),
            join(&env.valid_archs)
        );
    }

    if !ctx.force && !project.marker.exists() {
        bail!(
            "timestamp marker {} is missing; nothing has been generated yet",
            project.marker.display()
        );
    }

    let mut units: Option<Vec<PathBuf>> = None;
    let mut archives = Vec::with_capacity(archs.len());
    let mut rebuilt = Vec::new();

    for arch in &archs {
        let archive = project.arch_archive(arch);

        let stale = ctx.is_stale(&project.marker, &archive)?;

        if stale {
            if units.is_none() {
                units = Some(implementation_units(project)?);
            }
            let units = units.as_deref().unwrap_or_default();
            compile_arch_lib(ctx, env, arch, units, &archive)?;
            rebuilt.push(arch.clone());
        } else {
            detail!("  {} is up to date", archive.display());
        }

        archives.push(archive);
    }

    Ok(ArchLibs {
        archs,
        archives,
        rebuilt,
    })
}

/// Every `.m` file that belongs in the library, sorted.
///
/// Covers the translator's output for each Java source plus hand-written
/// `.m` overrides, which may have no Java counterpart.
pub fn implementation_units(project: &Project) -> Result<Vec<PathBuf>> {
    let java_files = find_source_files(&project.sources, SourceRole::Translatable.extension())
        .with_context(|| format!("failed to scan {}", project.sources.display()))?;

    let mut units: BTreeSet<PathBuf> = java_files
        .iter()
        .map(|rel| GeneratedUnit::derive(rel, &project.generated, project.flatten).implementation)
        .collect();

    for file in find_overrides(&project.sources)? {
        if file.role == SourceRole::Implementation {
            units.insert(override_target(&project.generated, &file.path, project.flatten));
        }
    }

    Ok(units.into_iter().collect())
}

/// Object file for `unit`, mirroring its place under the generated directory.
pub fn object_path(generated: &Path, staging: &Path, unit: &Path) -> PathBuf {
    let rel = match unit.strip_prefix(generated) {
        Ok(rel) => rel,
        Err(_) => Path::new(unit.file_name().unwrap_or(unit.as_os_str())),
    };
    staging.join(rel).with_extension("o")
}

/// Assemble the compiler invocation for one unit.
pub fn compile_command(
    clang: &Path,
    project: &Project,
    env: &XcodeEnv,
    arch: &str,
    unit: &Path,
    object: &Path,
) -> ToolCommand {
    let mut cmd = ToolCommand::new("clang", clang);
    cmd.compile_only(unit)
        .args(&project.compiler_flags)
        .arch(arch)
        .isysroot(&env.sdk_root);

    if let Some(version) = &env.objc_abi_version {
        cmd.objc_abi_version(version);
    }
    if env.legacy_dispatch {
        cmd.arg("-fobjc-legacy-dispatch");
    }
    if env.is_simulator() {
        cmd.arg("-fexceptions");
    }
    for dir in &env.header_search_paths {
        cmd.include(dir);
    }

    cmd.output(object);
    cmd
}

fn compile_arch_lib(
    ctx: &BuildContext<'_>,
    env: &XcodeEnv,
    arch: &str,
    units: &[PathBuf],
    archive: &Path,
) -> Result<()> {
    let project = ctx.project;
    let _phase = verbose::begin(Phase::Architecture(arch));

    let staging = project.arch_staging(arch);
    let clang = ctx.toolchain.get(XcodeTool::Clang)?;

    let mut objects = Vec::with_capacity(units.len());
    let mut jobs = Vec::with_capacity(units.len());
    for unit in units {
        let object = object_path(&project.generated, &staging, unit);
        if let Some(parent) = object.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        jobs.push(CompileJob {
            unit: unit.clone(),
            cmd: compile_command(clang, project, env, arch, unit, &object),
        });
        objects.push(object);
    }

    compile_units(ctx, &jobs)?;

    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let libtool = ctx.toolchain.get(XcodeTool::Libtool)?;
    let mut link = ToolCommand::new("libtool", libtool);
    link.arg("-static").output(archive).args(&objects);

    status!("Linking {}", archive.display());
    link.run_checked(ctx.runner)
}

/// Run every compile job, stopping at the first failure.
///
/// With more than one worker, jobs already running when a failure is seen
/// finish, queued ones are dropped, and the first failure is returned.
fn compile_units(ctx: &BuildContext<'_>, jobs: &[CompileJob]) -> Result<()> {
    let workers = worker_count(ctx.jobs, jobs.len());

    if workers <= 1 {
        for job in jobs {
            status!("Compiling {}", job.unit.display());
            job.cmd.run_checked(ctx.runner)?;
        }
        return Ok(());
    }

    detail!("  compiling {} units on {workers} workers", jobs.len());

    let (job_tx, job_rx) = mpsc::channel::<usize>();
    let (result_tx, result_rx) = mpsc::channel::<Result<()>>();
    let job_rx = Mutex::new(job_rx);
    let failed = AtomicBool::new(false);

    for idx in 0..jobs.len() {
        // The receiver is alive until the scope below ends.
        let _ = job_tx.send(idx);
    }
    drop(job_tx);

    std::thread::scope(|s| {
        for _ in 0..workers {
            let tx = result_tx.clone();
            let job_rx = &job_rx;
            let failed = &failed;
            let runner = ctx.runner;
            s.spawn(move || {
                loop {
                    let next = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok(idx) = next else { break };
                    if failed.load(Ordering::Relaxed) {
                        continue;
                    }

                    let job = &jobs[idx];
                    status!("Compiling {}", job.unit.display());
                    let result = job.cmd.run_checked(runner);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if tx.send(result).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut first_error = None;
        for result in result_rx {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    })
}

fn worker_count(requested: usize, units: usize) -> usize {
    let n = match requested {
        0 => std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
        n => n,
    };
    n.min(units).max(1)
}

fn join(archs: &BTreeSet<String>) -> String {
    archs.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_with(extra: &[(&str, &str)]) -> XcodeEnv {
        let mut vars: HashMap<String, String> = [
            ("ARCHS", "arm64"),
            ("VALID_ARCHS", "arm64"),
            ("SDKROOT", "/sdk"),
            ("HEADER_SEARCH_PATHS", "/inc \"/other inc\""),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        XcodeEnv::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    fn args(cmd: &ToolCommand) -> Vec<String> {
        cmd.get_args().iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn compile_command_uses_base_flags() {
        let project = Project::with_defaults(PathBuf::from("/p"));
        let cmd = compile_command(
            Path::new("clang"),
            &project,
            &env_with(&[]),
            "arm64",
            Path::new("/p/build/objc/A.m"),
            Path::new("/p/build/tmp/arm64/A.o"),
        );
        assert_eq!(
            args(&cmd),
            vec![
                "-c", "/p/build/objc/A.m", "-x", "objective-c", "-std=gnu99", "-fobjc-arc",
                "-Os", "-fstrict-aliasing", "-arch", "arm64", "-isysroot", "/sdk", "-I", "/inc",
                "-I", "/other inc", "-o", "/p/build/tmp/arm64/A.o",
            ]
        );
    }

    #[test]
    fn compile_command_appends_optional_flags() {
        let project = Project::with_defaults(PathBuf::from("/p"));
        let env = env_with(&[
            ("OBJC_ABI_VERSION", "2"),
            ("GCC_OBJC_LEGACY_DISPATCH", "YES"),
            ("PLATFORM_NAME", "iphonesimulator"),
        ]);
        let cmd = compile_command(
            Path::new("clang"),
            &project,
            &env,
            "x86_64",
            Path::new("A.m"),
            Path::new("A.o"),
        );
        let args = args(&cmd);
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(pos("-isysroot") < pos("-fobjc-abi-version=2"));
        assert!(pos("-fobjc-abi-version=2") < pos("-fobjc-legacy-dispatch"));
        assert!(pos("-fobjc-legacy-dispatch") < pos("-fexceptions"));
        assert!(pos("-fexceptions") < pos("-I"));
    }

    #[test]
    fn object_names_follow_each_unit() {
        let generated = Path::new("/p/gen");
        let staging = Path::new("/p/tmp/arm64");
        assert_eq!(
            object_path(generated, staging, Path::new("/p/gen/Album.m")),
            PathBuf::from("/p/tmp/arm64/Album.o")
        );
        assert_eq!(
            object_path(generated, staging, Path::new("/p/gen/com/x/User.m")),
            PathBuf::from("/p/tmp/arm64/com/x/User.o")
        );
        assert_eq!(
            object_path(generated, staging, Path::new("/elsewhere/Foo.Bar.m")),
            PathBuf::from("/p/tmp/arm64/Foo.Bar.o")
        );
    }

    #[test]
    fn worker_count_is_bounded_by_units() {
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(2, 10), 2);
        assert_eq!(worker_count(4, 0), 1);
        assert!(worker_count(0, 64) >= 1);
    }
}
