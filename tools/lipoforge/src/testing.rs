//! Fake toolchain for exercising the pipeline without Xcode.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};
use lipoforge_stale::{GeneratedUnit, set_mtime};

use crate::tool_cmd::{ToolCommand, ToolRunner};

/// One recorded tool invocation.
#[derive(Clone, Debug)]
pub struct Call {
    pub tool: String,
    pub args: Vec<String>,
}

/// Records every invocation and writes the files a real tool would produce.
///
/// Outputs are stamped with the current time so that timestamp ordering
/// between tool outputs and the marker is exact.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Call>>,
    failures: Vec<(String, String, i32)>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tool` exit with `code` when any argument contains `needle`.
    pub fn failing(tool: &str, needle: &str, code: i32) -> Self {
        Self {
            calls: Mutex::default(),
            failures: vec![(tool.to_string(), needle.to_string(), code)],
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tools(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.tool).collect()
    }

    pub fn calls_to(&self, tool: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.tool == tool).collect()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<i32> {
        let args: Vec<String> = cmd
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().unwrap().push(Call {
            tool: cmd.tool().to_string(),
            args: args.clone(),
        });

        for (tool, needle, code) in &self.failures {
            if cmd.tool() == tool && args.iter().any(|a| a.contains(needle.as_str())) {
                return Ok(*code);
            }
        }

        if cmd.tool() == "j2objc" {
            emit_translation(&args)?;
        } else if let Some(out) = value_after(&args, "-o") {
            write_output(Path::new(out))?;
        }
        Ok(0)
    }
}

/// Value of the last occurrence of `flag`.
pub fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .rposition(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn emit_translation(args: &[String]) -> Result<()> {
    let out = value_after(args, "-d").context("translator called without -d")?;
    let sourcepath = value_after(args, "-sourcepath").context("translator called without -sourcepath")?;
    let flatten = args.iter().any(|a| a == "--no-package-directories");

    for source in args.iter().filter(|a| a.ends_with(".java")) {
        let rel = Path::new(source).strip_prefix(sourcepath)?;
        let unit = GeneratedUnit::derive(rel, Path::new(out), flatten);
        write_output(&unit.header)?;
        write_output(&unit.implementation)?;
    }
    Ok(())
}

fn write_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, b"")?;
    set_mtime(path, SystemTime::now())?;
    Ok(())
}
