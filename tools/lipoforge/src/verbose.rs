//! Console output for the build driver.
//!
//! `-q` leaves only errors on stderr. The default prints one line per phase
//! and per tool step. `-v` adds stale reasons, full command lines and how
//! long each phase took.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Apply the `-q`/`-v` flags. Called once from `main`; `-q` wins.
pub fn init(quiet: bool, verbose: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    VERBOSE.store(verbose && !quiet, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Progress line, silenced by `-q`.
macro_rules! status {
    ($($arg:tt)*) => {
        if !$crate::verbose::is_quiet() {
            println!($($arg)*);
        }
    };
}

pub(crate) use status;

/// Diagnostic line, printed only with `-v`.
macro_rules! detail {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            println!($($arg)*);
        }
    };
}

pub(crate) use detail;

/// A pipeline phase that announces itself on the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase<'a> {
    Translate,
    CopyOverrides,
    Architecture(&'a str),
}

impl Phase<'_> {
    /// Short name used in timing lines.
    pub fn label(&self) -> String {
        match self {
            Self::Translate => "translation".into(),
            Self::CopyOverrides => "override copy".into(),
            Self::Architecture(arch) => format!("{arch} build"),
        }
    }
}

impl fmt::Display for Phase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translate => f.write_str("Starting Java Translation"),
            Self::CopyOverrides => f.write_str("Copying Objective-C Override Sources"),
            Self::Architecture(arch) => write!(f, "Starting build for architecture \"{arch}\""),
        }
    }
}

/// Running phase; reports its duration with `-v` when dropped.
pub struct PhaseGuard {
    label: String,
    start: Instant,
}

/// Print the banner for `phase` and start timing it.
pub fn begin(phase: Phase<'_>) -> PhaseGuard {
    status!("{phase}");
    PhaseGuard {
        label: phase.label(),
        start: Instant::now(),
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        detail!("  {} took {:.1?}", self.label, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banners_match_build_log() {
        assert_eq!(Phase::Translate.to_string(), "Starting Java Translation");
        assert_eq!(
            Phase::CopyOverrides.to_string(),
            "Copying Objective-C Override Sources"
        );
        assert_eq!(
            Phase::Architecture("arm64").to_string(),
            "Starting build for architecture \"arm64\""
        );
    }

    #[test]
    fn labels_name_the_architecture() {
        assert_eq!(Phase::Architecture("x86_64").label(), "x86_64 build");
        assert_eq!(Phase::Translate.label(), "translation");
    }
}
