//! lipoforge: incremental j2objc build driver.
//!
//! Runs from an Xcode build phase and turns a Java source tree into a
//! universal static library.
//!
//! Pipeline: translate Java → copy Objective-C overrides → compile and link
//!           one archive per architecture → merge with lipo → republish the
//!           `current` symlink.

mod arch;
mod clean;
mod cli;
mod env;
mod fat;
mod overrides;
mod pipeline;
mod project;
mod publish;
#[cfg(test)]
mod testing;
mod tool_cmd;
mod toolchain;
mod translate;
mod verbose;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use crate::pipeline::BuildContext;
use crate::project::Project;
use crate::tool_cmd::{ProcessRunner, ToolFailure};
use crate::toolchain::Toolchain;
use crate::verbose::{detail, status};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let result = match cli.command {
        None | Some(cli::Command::Build) => cmd_build(&cli),
        Some(cli::Command::Translate(ref args)) => cmd_translate(&cli, args),
        Some(cli::Command::Clean) => cmd_clean(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code_for(&err)
        }
    }
}

/// A failing tool's own exit status is forwarded; anything else is 1.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ToolFailure>() {
        Some(failure) => u8::try_from(failure.code)
            .ok()
            .filter(|c| *c != 0)
            .map_or(ExitCode::FAILURE, ExitCode::from),
        None => ExitCode::FAILURE,
    }
}

fn load_project(cli: &cli::Cli) -> Result<(Project, Toolchain)> {
    let project = Project::load(cli.project.as_deref())?;
    let toolchain = Toolchain::new(
        project.translator_path(env::translator_override()),
        &project.tools,
    );
    Ok((project, toolchain))
}

/// Run the full pipeline.
fn cmd_build(cli: &cli::Cli) -> Result<()> {
    let xcode = env::XcodeEnv::from_env()?;
    let (project, toolchain) = load_project(cli)?;

    let ctx = BuildContext {
        project: &project,
        toolchain: &toolchain,
        runner: &ProcessRunner,
        force: cli.force,
        jobs: cli.jobs.unwrap_or(0),
    };
    let started = Instant::now();
    let summary = pipeline::run_build(&ctx, &xcode)?;

    status!(
        "\nBuild complete in {:.1?}. ({} translated, {} copied, {} of {} architectures rebuilt{})",
        started.elapsed(),
        summary.translated,
        summary.copied,
        summary.rebuilt_archs.len(),
        xcode.target_archs().len(),
        if summary.merged { ", universal archive merged" } else { "" },
    );
    detail!("  {}", summary.fat_archive.display());
    Ok(())
}

/// Translate stale Java sources only.
fn cmd_translate(cli: &cli::Cli, args: &cli::TranslateArgs) -> Result<()> {
    let (project, toolchain) = load_project(cli)?;

    let input_dir = args.input_dir.as_ref().map_or_else(|| project.sources.clone(), |p| project.root.join(p));
    let output_dir = args.output_dir.as_ref().map_or_else(|| project.generated.clone(), |p| project.root.join(p));
    let options = if args.translator_opts.is_empty() {
        &project.translator_options
    } else {
        &args.translator_opts
    };

    let ctx = BuildContext {
        project: &project,
        toolchain: &toolchain,
        runner: &ProcessRunner,
        force: cli.force,
        jobs: cli.jobs.unwrap_or(0),
    };
    let translated = pipeline::translate_and_mark(
        &ctx,
        &translate::TranslateJob {
            input_dir: &input_dir,
            output_dir: &output_dir,
            options,
            flatten: args.flatten(project.flatten),
        },
    )?;

    if translated > 0 {
        status!("Translated {translated} source(s) into {}", output_dir.display());
    }
    Ok(())
}

/// Remove build products.
fn cmd_clean(cli: &cli::Cli) -> Result<()> {
    let (project, _) = load_project(cli)?;
    let removed = clean::clean(&project)?;
    if removed.is_empty() {
        status!("Nothing to clean.");
    }
    for path in removed {
        status!("Removed {}", path.display());
    }
    Ok(())
}
