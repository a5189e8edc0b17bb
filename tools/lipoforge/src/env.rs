//! Build settings handed to the driver by Xcode through the environment.
//!
//! Everything is read once in `main` into an [`XcodeEnv`]; the build phases
//! only ever see the struct.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};

/// Environment variable that overrides the translator executable.
pub const TRANSLATOR_VAR: &str = "J2OBJC";

/// Settings taken from the Xcode build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeEnv {
    /// Architectures requested for this build (`ARCHS`).
    pub archs: BTreeSet<String>,
    /// Architectures valid for the SDK (`VALID_ARCHS`).
    pub valid_archs: BTreeSet<String>,
    /// SDK root passed to the compiler as `-isysroot` (`SDKROOT`).
    pub sdk_root: PathBuf,
    /// Include directories (`HEADER_SEARCH_PATHS`, shell-tokenized).
    pub header_search_paths: Vec<String>,
    /// `OBJC_ABI_VERSION`, if set.
    pub objc_abi_version: Option<String>,
    /// `GCC_OBJC_LEGACY_DISPATCH=YES`.
    pub legacy_dispatch: bool,
    /// `PLATFORM_NAME`, if set.
    pub platform_name: Option<String>,
}

impl XcodeEnv {
    /// Read the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the settings through `lookup`, which maps a variable name to its value.
    ///
    /// Required variables that are unset or empty are reported as a
    /// configuration error naming the variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match lookup(name) {
                Some(value) if !value.is_empty() => Ok(value),
                _ => Err(anyhow!(
                    "Environment variable {name} not set.\n\
                     This must be run from within an Xcode build"
                )),
            }
        };
        let optional = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let archs = split_archs(&required("ARCHS")?);
        let valid_archs = split_archs(&required("VALID_ARCHS")?);
        let sdk_root = PathBuf::from(required("SDKROOT")?);

        let raw_paths = required("HEADER_SEARCH_PATHS")?;
        let Some(header_search_paths) = shlex::split(&raw_paths) else {
            bail!("HEADER_SEARCH_PATHS is not valid shell syntax: {raw_paths}");
        };

        Ok(Self {
            archs,
            valid_archs,
            sdk_root,
            header_search_paths,
            objc_abi_version: optional("OBJC_ABI_VERSION"),
            legacy_dispatch: optional("GCC_OBJC_LEGACY_DISPATCH").as_deref() == Some("YES"),
            platform_name: optional("PLATFORM_NAME"),
        })
    }

    /// Architectures to build: requested and valid for this SDK.
    pub fn target_archs(&self) -> BTreeSet<String> {
        self.archs.intersection(&self.valid_archs).cloned().collect()
    }

    /// Returns `true` when building for the iOS simulator.
    pub fn is_simulator(&self) -> bool {
        self.platform_name.as_deref() == Some("iphonesimulator")
    }
}

/// Translator path from `J2OBJC`, if set.
pub fn translator_override() -> Option<PathBuf> {
    std::env::var_os(TRANSLATOR_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn split_archs(value: &str) -> BTreeSet<String> {
    value.split_whitespace().map(str::to_string).collect()
}
