//! Content rewriter.
//!
//! Runs over the tree as it exists after structural renames. Replacement is a
//! plain substring substitution of every occurrence; there is no regex or
//! word-boundary handling.

use crate::exclusion::ExclusionSet;
use crate::token::TokenPair;
use crate::walk::collect_files;
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteSkip {
    /// Not valid UTF-8 or not readable at all.
    NotText,
    /// Matched during the scan but the occurrence was gone on re-read.
    NoLongerMatches,
}

impl fmt::Display for RewriteSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteSkip::NotText => write!(f, "not readable as text"),
            RewriteSkip::NoLongerMatches => write!(f, "no occurrence on re-read"),
        }
    }
}

#[derive(Debug)]
#[must_use = "RewriteOutcome should be checked for failures"]
pub enum RewriteOutcome {
    Rewritten { file: PathBuf, replacements: usize },
    Skipped { file: PathBuf, reason: RewriteSkip },
    Failed { file: PathBuf, error: RewriteError },
}

impl RewriteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RewriteOutcome::Failed { .. })
    }
}

/// Replace every occurrence of `old` in `text`.
///
/// Returns the new text and the number of replacements, or `None` when `old`
/// does not occur (an empty `old` never occurs).
pub fn rewrite_text(text: &str, old: &str, new: &str) -> Option<(String, usize)> {
    if old.is_empty() {
        return None;
    }
    let count = text.matches(old).count();
    if count == 0 {
        return None;
    }
    Some((text.replace(old, new), count))
}

/// Re-read `path`, replace every occurrence and write the result back.
pub fn rewrite_file(path: &Path, old: &str, new: &str) -> Result<RewriteOutcome, RewriteError> {
    let content = fs::read_to_string(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let Some((rewritten, replacements)) = rewrite_text(&content, old, new) else {
        return Ok(RewriteOutcome::Skipped {
            file: path.to_path_buf(),
            reason: RewriteSkip::NoLongerMatches,
        });
    };

    atomic_write(path, rewritten.as_bytes()).map_err(|source| RewriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(RewriteOutcome::Rewritten {
        file: path.to_path_buf(),
        replacements,
    })
}

/// Atomic file write: tempfile + fsync + rename, keeping the original
/// permissions. Read-only files are refused rather than replaced.
///
/// When the directory does not accept a temp file the content is written in
/// place instead, which is not atomic.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(ErrorKind::InvalidInput, "Path has no parent directory")
    })?;

    let permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        return Err(io::Error::new(
            ErrorKind::PermissionDenied,
            "file is read-only",
        ));
    }

    let mut temp = match tempfile::NamedTempFile::new_in(parent) {
        Ok(temp) => temp,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            tracing::debug!(file = %path.display(), "directory not writable, writing in place");
            return write_in_place(path, content);
        }
        Err(err) => return Err(err),
    };
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.as_file().set_permissions(permissions)?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

fn write_in_place(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Files under `root` whose text contains the old token, plus skip outcomes
/// for files that could not be read as text.
pub fn find_matching_files(
    root: &Path,
    old: &str,
    exclusions: &ExclusionSet,
) -> (Vec<PathBuf>, Vec<RewriteOutcome>) {
    let mut matching = Vec::new();
    let mut skipped = Vec::new();

    for file in collect_files(root, exclusions) {
        match fs::read_to_string(&file) {
            Ok(content) => {
                if !old.is_empty() && content.contains(old) {
                    matching.push(file);
                }
            }
            Err(err) => {
                tracing::debug!(file = %file.display(), error = %err, "skipping unreadable file");
                skipped.push(RewriteOutcome::Skipped {
                    file,
                    reason: RewriteSkip::NotText,
                });
            }
        }
    }

    (matching, skipped)
}

/// Rewrite every matching file under `root`.
///
/// All candidates are found before the first write. A failing file is
/// recorded and the rest of the batch continues.
pub fn rewrite_tree(
    root: &Path,
    tokens: &TokenPair,
    exclusions: &ExclusionSet,
) -> Vec<RewriteOutcome> {
    let (matching, mut outcomes) = find_matching_files(root, tokens.old(), exclusions);

    tracing::info!(files = matching.len(), "content rewrite phase");

    for file in matching {
        match rewrite_file(&file, tokens.old(), tokens.new_token()) {
            Ok(outcome) => {
                if let RewriteOutcome::Rewritten { file, replacements } = &outcome {
                    tracing::info!(file = %file.display(), replacements, "rewritten");
                }
                outcomes.push(outcome);
            }
            Err(error) => {
                tracing::debug!(file = %file.display(), error = %error, "rewrite failed");
                outcomes.push(RewriteOutcome::Failed { file, error });
            }
        }
    }

    outcomes
}
