//! deepshift: rename an identifier across a directory tree in one pass
//!
//! Given an old and a new token, deepshift renames every file and directory
//! whose name (or root-relative path) contains the old token, then rewrites
//! every file whose contents contain it. Names, paths and in-file references
//! stay consistent with each other.
//!
//! # Architecture
//!
//! A run is two sequential phases over the same root:
//!
//! 1. [`rename::rename_tree`] collects all eligible entities, sorts them
//!    deepest first and renames the matching ones. A token containing a path
//!    separator is matched against root-relative paths; any other token
//!    against basenames, preserving file extensions.
//! 2. [`rewrite::rewrite_tree`] walks the renamed tree again and replaces
//!    every literal occurrence inside file contents.
//!
//! Both phases consult the same [`ExclusionSet`]: fixed directory names
//! (`.git`, `node_modules`) plus, optionally, the repository's git ignore
//! rules.
//!
//! # Failure model
//!
//! Failures are per entity and never stop a batch; there is no rollback.
//! Every outcome ends up in the returned [`ShiftReport`].
//!
//! # Example
//!
//! ```no_run
//! use deepshift::{shift, ShiftOptions, TokenPair};
//!
//! let tokens = TokenPair::new("old_component", "new_component");
//! let report = shift(&tokens, &ShiftOptions::new(".")).unwrap();
//! println!("{report}");
//! ```

pub mod config;
pub mod exclusion;
pub mod rename;
pub mod report;
pub mod rewrite;
pub mod safety;
pub mod shift;
pub mod token;
pub mod walk;

// Re-exports
pub use config::{load_for_root, ConfigError, ShiftConfig, CONFIG_FILE_NAME};
pub use exclusion::{
    ExclusionPolicy, ExclusionSet, StaticDirectoryExclusion, VersionControlExclusion,
};
pub use rename::{plan_destination, rename_tree, RenameError, RenameOutcome, RenamePlan};
pub use report::{Failure, ShiftReport};
pub use rewrite::{rewrite_file, rewrite_text, rewrite_tree, RewriteError, RewriteOutcome};
pub use safety::{RootGuard, SafetyError};
pub use shift::{shift, Phases, ShiftError, ShiftOptions};
pub use token::{normalize_dropped_path, MatchMode, TokenPair};
pub use walk::{collect_entities, collect_files, Entity, EntityKind};
