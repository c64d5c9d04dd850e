//! Old/new token handling.
//!
//! The old token decides how the structural renamer matches entities: a token
//! containing a path separator is matched against whole root-relative paths
//! ([`MatchMode::Segment`]), anything else only against final path components
//! ([`MatchMode::Basename`]).

use std::fs;
use std::path::{is_separator, Path};

/// How entities are matched against the old token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Old token contains a separator and names a path suffix.
    Segment,
    /// Old token is matched as a substring of basenames.
    Basename,
}

/// The replacement pair driving one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    old: String,
    new: String,
}

impl TokenPair {
    /// Tokens are kept verbatim: they are matched against paths rendered with
    /// the host separator and against file contents as-is.
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn old(&self) -> &str {
        &self.old
    }

    pub fn new_token(&self) -> &str {
        &self.new
    }

    pub fn mode(&self) -> MatchMode {
        if contains_separator(&self.old) {
            MatchMode::Segment
        } else {
            MatchMode::Basename
        }
    }

    /// Identical tokens make the whole run a no-op.
    pub fn is_identity(&self) -> bool {
        self.old == self.new
    }
}

/// True if `s` contains a character the host treats as a path separator.
pub fn contains_separator(s: &str) -> bool {
    s.chars().any(is_separator)
}

/// Split a basename into stem and extension.
///
/// The extension starts at the last `.`. A name whose only dot is the leading
/// one (`.env`) has no extension, and `name.` has the extension `.`.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx..])),
    }
}

/// Resolve a first positional argument that was given as a path.
///
/// When `old` names an existing file or directory and `new` contains no
/// separator, the entity's basename is used instead, with the extension
/// stripped for files. Otherwise `old` is returned unchanged.
pub fn normalize_dropped_path(old: &str, new: &str) -> String {
    if contains_separator(new) {
        return old.to_string();
    }

    let path = Path::new(old);
    let Ok(metadata) = fs::metadata(path) else {
        return old.to_string();
    };

    let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
        return old.to_string();
    };

    if metadata.is_file() {
        split_extension(basename).0.to_string()
    } else {
        basename.to_string()
    }
}
