//! Project layout from `lipoforge.toml`.
//!
//! Every key is optional; a missing file yields the default layout rooted
//! at the working directory. Relative paths resolve against the directory
//! holding the project file.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Default project file name looked up in the working directory.
pub const PROJECT_FILE: &str = "lipoforge.toml";

/// Translator executable used when neither the project nor `J2OBJC` name one.
const DEFAULT_TRANSLATOR: &str = "third_party/j2objc/j2objc";

const DEFAULT_COMPILER_FLAGS: &[&str] = &[
    "-x",
    "objective-c",
    "-std=gnu99",
    "-fobjc-arc",
    "-Os",
    "-fstrict-aliasing",
];

const DEFAULT_TRANSLATOR_OPTIONS: &[&str] = &["-use-arc", "--strip-reflection"];

// ---------------------------------------------------------------------------
// On-disk format
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ProjectFile {
    library: LibrarySection,
    paths: PathsSection,
    translator: TranslatorSection,
    compiler: CompilerSection,
    tools: ToolOverrides,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LibrarySection {
    name: String,
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            name: "objclib".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PathsSection {
    sources: PathBuf,
    generated: PathBuf,
    marker: PathBuf,
    staging: PathBuf,
    output: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            sources: "src/main/java".into(),
            generated: "build/objc".into(),
            marker: "build/.codegen".into(),
            staging: "build/tmp".into(),
            output: "build".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TranslatorSection {
    path: Option<PathBuf>,
    options: Vec<String>,
    flatten: bool,
}

impl Default for TranslatorSection {
    fn default() -> Self {
        Self {
            path: None,
            options: DEFAULT_TRANSLATOR_OPTIONS.iter().map(|s| (*s).to_string()).collect(),
            flatten: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CompilerSection {
    flags: Vec<String>,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            flags: DEFAULT_COMPILER_FLAGS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Explicit paths for the Xcode tools, bypassing `xcodebuild -find`.
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct ToolOverrides {
    pub clang: Option<PathBuf>,
    pub libtool: Option<PathBuf>,
    pub lipo: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved project
// ---------------------------------------------------------------------------

/// Fully resolved project layout with absolute paths.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    /// Library name; prefix of every archive.
    pub name: String,
    /// Java sources and hand-written overrides.
    pub sources: PathBuf,
    /// Translator output directory.
    pub generated: PathBuf,
    /// Timestamp marker file.
    pub marker: PathBuf,
    /// Object file staging area (one sub-directory per architecture).
    pub staging: PathBuf,
    /// Directory receiving archives and the `current` symlink.
    pub output: PathBuf,
    pub translator: Option<PathBuf>,
    pub translator_options: Vec<String>,
    /// Drop package directories from generated paths.
    pub flatten: bool,
    pub compiler_flags: Vec<String>,
    pub tools: ToolOverrides,
}

impl Project {
    /// Load the project file.
    ///
    /// An explicit `path` must exist. Without one, `lipoforge.toml` in the
    /// working directory is used if present, and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read working directory")?;

        let file = match path {
            Some(p) => {
                let p = cwd.join(p);
                if !p.is_file() {
                    bail!("project file not found: {}", p.display());
                }
                p
            }
            None => cwd.join(PROJECT_FILE),
        };

        if !file.is_file() {
            return Ok(Self::with_defaults(cwd));
        }

        let text = fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let root = file.parent().map_or(cwd, Path::to_path_buf);
        Self::parse(root, &text).with_context(|| format!("invalid project file {}", file.display()))
    }

    /// Default layout rooted at `root`.
    pub fn with_defaults(root: PathBuf) -> Self {
        Self::resolve(root, ProjectFile::default())
    }

    /// Parse project file contents, resolving paths against `root`.
    pub fn parse(root: PathBuf, text: &str) -> Result<Self> {
        let file: ProjectFile = toml::from_str(text)?;
        if file.library.name.is_empty() {
            bail!("library.name must not be empty");
        }
        Ok(Self::resolve(root, file))
    }

    fn resolve(root: PathBuf, file: ProjectFile) -> Self {
        let abs = |p: &Path| root.join(p);
        Self {
            name: file.library.name,
            sources: abs(&file.paths.sources),
            generated: abs(&file.paths.generated),
            marker: abs(&file.paths.marker),
            staging: abs(&file.paths.staging),
            output: abs(&file.paths.output),
            translator: file.translator.path.as_deref().map(abs),
            translator_options: file.translator.options,
            flatten: file.translator.flatten,
            compiler_flags: file.compiler.flags,
            tools: ToolOverrides {
                clang: file.tools.clang.as_deref().map(abs),
                libtool: file.tools.libtool.as_deref().map(abs),
                lipo: file.tools.lipo.as_deref().map(abs),
            },
            root,
        }
    }

    /// Translator executable: `J2OBJC` first, then the project file, then
    /// the bundled default.
    pub fn translator_path(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.translator.clone())
            .unwrap_or_else(|| self.root.join(DEFAULT_TRANSLATOR))
    }

    /// Per-architecture archive, e.g. `build/shotvibelib_arm64.a`.
    pub fn arch_archive(&self, arch: &str) -> PathBuf {
        self.output.join(format!("{}_{arch}.a", self.name))
    }

    /// Universal archive named by every architecture it holds, in sorted
    /// order, e.g. `build/shotvibelib__arm64__x86_64.a`.
    pub fn fat_archive(&self, archs: &BTreeSet<String>) -> PathBuf {
        let mut file = self.name.clone();
        for arch in archs {
            file.push_str("__");
            file.push_str(arch);
        }
        file.push_str(".a");
        self.output.join(file)
    }

    /// Stable symlink pointing at the newest universal archive.
    pub fn current_link(&self) -> PathBuf {
        self.output.join(format!("current_{}.a", self.name))
    }

    /// Object staging directory for one architecture.
    pub fn arch_staging(&self, arch: &str) -> PathBuf {
        self.staging.join(arch)
    }
}
