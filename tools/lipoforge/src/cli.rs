//! Command-line interface definitions for lipoforge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Translate Java sources with j2objc and build a universal static library.
#[derive(Parser)]
#[command(name = "lipoforge", version, about)]
pub struct Cli {
    /// Subcommand to execute (defaults to `build`).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Project file (defaults to `lipoforge.toml` in the working directory).
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Treat every artifact as stale for this run.
    #[arg(long, short = 'f', global = true)]
    pub force: bool,

    /// Suppress progress output; show only errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print stale reasons, tool command lines and phase timings.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Maximum number of parallel compile jobs (0 or omitted = one per CPU).
    #[arg(long, short = 'j', global = true)]
    pub jobs: Option<usize>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Translate, compile, link, merge and publish the universal library.
    Build,
    /// Run only the Java translation step.
    Translate(TranslateArgs),
    /// Remove generated sources, objects, archives and the marker.
    Clean,
}

/// Arguments for the `translate` subcommand.
#[derive(Parser)]
pub struct TranslateArgs {
    /// Directory holding the Java sources.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Where to place generated files.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Generate into the output directory without package sub-directories.
    #[arg(long, conflicts_with = "package_directories")]
    pub no_package_directories: bool,

    /// Keep package sub-directories under the output directory.
    #[arg(long)]
    pub package_directories: bool,

    /// Pass OPT to the translator (replaces the project's option list).
    #[arg(long = "translator-opt", value_name = "OPT", allow_hyphen_values = true)]
    pub translator_opts: Vec<String>,
}

impl TranslateArgs {
    /// Whether output is flattened, given the project's setting.
    pub fn flatten(&self, project_default: bool) -> bool {
        if self.package_directories {
            false
        } else {
            self.no_package_directories || project_default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["lipoforge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.force);
    }

    #[test]
    fn translate_collects_hyphenated_options() {
        let cli = Cli::try_parse_from([
            "lipoforge",
            "translate",
            "--translator-opt",
            "-use-arc",
            "--translator-opt",
            "--strip-reflection",
            "--no-package-directories",
        ])
        .unwrap();

        let Some(Command::Translate(args)) = cli.command else {
            panic!("expected translate");
        };
        assert_eq!(args.translator_opts, vec!["-use-arc", "--strip-reflection"]);
        assert!(args.no_package_directories);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["lipoforge", "-q", "-v", "build"]).is_err());
    }

    fn translate_args(extra: &[&str]) -> TranslateArgs {
        let cli = Cli::try_parse_from(["lipoforge", "translate"].iter().chain(extra)).unwrap();
        let Some(Command::Translate(args)) = cli.command else {
            panic!("expected translate");
        };
        args
    }

    #[test]
    fn package_directories_overrides_flattened_project() {
        assert!(!translate_args(&["--package-directories"]).flatten(true));
        assert!(translate_args(&[]).flatten(true));
    }

    #[test]
    fn no_package_directories_flattens_nested_project() {
        assert!(translate_args(&["--no-package-directories"]).flatten(false));
        assert!(!translate_args(&[]).flatten(false));
    }

    #[test]
    fn package_directory_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "lipoforge",
            "translate",
            "--package-directories",
            "--no-package-directories",
        ]);
        assert!(parsed.is_err());
    }
}
