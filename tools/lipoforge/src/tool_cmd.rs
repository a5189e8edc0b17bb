//! Typed builder for external tool invocations.
//!
//! Every subprocess the driver launches (translator, compiler, archiver,
//! lipo) is described as a [`ToolCommand`] and executed through a
//! [`ToolRunner`], so the build phases can be exercised without the
//! toolchain installed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::verbose::detail;

/// An external tool exited unsuccessfully.
///
/// Carried through `anyhow` up to `main`, which exits with `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub tool: String,
    pub code: i32,
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} exited with status {}", self.tool, self.code)
    }
}

impl std::error::Error for ToolFailure {}

/// Executes tool commands and reports their exit status.
pub trait ToolRunner: Sync {
    /// Run `cmd` to completion and return its exit code.
    ///
    /// Errors are reserved for failing to launch the tool at all.
    fn run(&self, cmd: &ToolCommand) -> Result<i32>;
}

/// Runs tools as child processes with inherited stdio.
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<i32> {
        let status = Command::new(cmd.program())
            .args(cmd.get_args())
            .status()
            .with_context(|| format!("failed to run {} ({})", cmd.tool(), cmd.program().display()))?;
        // Terminated by a signal: no code to forward.
        Ok(status.code().unwrap_or(1))
    }
}

/// A single external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    tool: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Start a command for `program`, reported as `tool` in messages.
    pub fn new(tool: &str, program: &Path) -> Self {
        Self {
            tool: tool.to_string(),
            program: program.to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Append one argument.
    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    /// Output file (`-o <path>`).
    pub fn output(&mut self, path: &Path) -> &mut Self {
        self.arg("-o").arg(path)
    }

    /// Compile a single unit without linking (`-c <unit>`).
    pub fn compile_only(&mut self, unit: &Path) -> &mut Self {
        self.arg("-c").arg(unit)
    }

    /// Target architecture (`-arch <arch>`).
    pub fn arch(&mut self, arch: &str) -> &mut Self {
        self.arg("-arch").arg(arch)
    }

    /// SDK root (`-isysroot <dir>`).
    pub fn isysroot(&mut self, dir: &Path) -> &mut Self {
        self.arg("-isysroot").arg(dir)
    }

    /// Header search path (`-I <dir>`).
    pub fn include(&mut self, dir: &str) -> &mut Self {
        self.arg("-I").arg(dir)
    }

    /// Objective-C ABI version (`-fobjc-abi-version=<v>`).
    pub fn objc_abi_version(&mut self, version: &str) -> &mut Self {
        self.arg(format!("-fobjc-abi-version={version}"))
    }

    /// Translator output directory (`-d <dir>`).
    pub fn destination(&mut self, dir: &Path) -> &mut Self {
        self.arg("-d").arg(dir)
    }

    /// Translator source search path (`-sourcepath <dir>`).
    pub fn sourcepath(&mut self, dir: &Path) -> &mut Self {
        self.arg("-sourcepath").arg(dir)
    }

    /// Run the command and turn a non-zero exit into a [`ToolFailure`].
    pub fn run_checked(&self, runner: &dyn ToolRunner) -> Result<()> {
        detail!("  $ {self}");
        let code = runner.run(self)?;
        if code != 0 {
            return Err(ToolFailure {
                tool: self.tool.clone(),
                code,
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ExitWith(i32);

    impl ToolRunner for ExitWith {
        fn run(&self, _cmd: &ToolCommand) -> Result<i32> {
            Ok(self.0)
        }
    }

    #[test]
    fn builder_appends_in_order() {
        let mut cmd = ToolCommand::new("clang", Path::new("/usr/bin/clang"));
        cmd.compile_only(Path::new("A.m"))
            .arch("arm64")
            .include("/inc")
            .objc_abi_version("2")
            .output(Path::new("A.o"));

        assert_eq!(
            cmd.to_string(),
            "/usr/bin/clang -c A.m -arch arm64 -I /inc -fobjc-abi-version=2 -o A.o"
        );
    }

    #[test]
    fn non_zero_exit_becomes_tool_failure() {
        let cmd = ToolCommand::new("libtool", Path::new("libtool"));
        let err = cmd.run_checked(&ExitWith(2)).unwrap_err();
        let failure = err.downcast_ref::<ToolFailure>().unwrap();
        assert_eq!(failure.code, 2);
        assert_eq!(failure.to_string(), "libtool exited with status 2");
    }

    #[test]
    fn zero_exit_is_ok() {
        let cmd = ToolCommand::new("lipo", Path::new("lipo"));
        assert!(cmd.run_checked(&ExitWith(0)).is_ok());
    }
}
