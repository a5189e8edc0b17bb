//! Timestamp-based staleness tracking for lipoforge.
//!
//! Decides whether a generated artifact must be regenerated from its source
//! by comparing modification times, and discovers the Java and hand-written
//! Objective-C sources that drive a build.
//!
//! # Usage
//!
//! ```ignore
//! let sources = find_source_files(Path::new("src/main/java"), ".java")?;
//! for rel in &sources {
//!     let unit = GeneratedUnit::derive(rel, Path::new("build/objc"), true);
//!     if unit.is_stale(&Path::new("src/main/java").join(rel))? {
//!         // regenerate
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod mtime;
pub mod source;
pub mod unit;

pub use mtime::{is_newer, set_mtime, touch};
pub use source::{SourceFile, SourceRole, discover, find_source_files, override_pair};
pub use unit::GeneratedUnit;
