//! Aggregated result of a run.
//!
//! Per-entity outcomes are collected during both phases and surfaced once,
//! here, instead of being logged ad hoc.

use crate::rename::RenameOutcome;
use crate::rewrite::RewriteOutcome;
use crate::token::TokenPair;
use crate::walk::EntityKind;
use std::fmt;
use std::path::{Path, PathBuf};

/// One failed entity, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug)]
pub struct ShiftReport {
    pub tokens: TokenPair,
    pub root: PathBuf,
    /// `None` when the structural phase did not run.
    pub renames: Option<Vec<RenameOutcome>>,
    /// `None` when the content phase did not run.
    pub rewrites: Option<Vec<RewriteOutcome>>,
    /// Whether git ignore rules were part of the exclusion set.
    pub consults_vcs: bool,
    no_op: bool,
}

impl ShiftReport {
    pub(crate) fn new(
        tokens: TokenPair,
        root: PathBuf,
        renames: Option<Vec<RenameOutcome>>,
        rewrites: Option<Vec<RewriteOutcome>>,
        consults_vcs: bool,
    ) -> Self {
        Self {
            tokens,
            root,
            renames,
            rewrites,
            consults_vcs,
            no_op: false,
        }
    }

    /// Report for identical tokens: nothing was walked or touched.
    pub fn no_op(tokens: TokenPair, root: PathBuf) -> Self {
        Self {
            tokens,
            root,
            renames: None,
            rewrites: None,
            consults_vcs: false,
            no_op: true,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.no_op
    }

    fn count_renamed(&self, wanted: EntityKind) -> usize {
        self.renames.as_deref().map_or(0, |outcomes| {
            outcomes
                .iter()
                .filter(|o| matches!(o, RenameOutcome::Renamed { kind, .. } if *kind == wanted))
                .count()
        })
    }

    pub fn files_renamed(&self) -> usize {
        self.count_renamed(EntityKind::File)
    }

    pub fn dirs_renamed(&self) -> usize {
        self.count_renamed(EntityKind::Directory)
    }

    pub fn structural_renames(&self) -> usize {
        self.files_renamed() + self.dirs_renamed()
    }

    pub fn files_rewritten(&self) -> usize {
        self.rewrites.as_deref().map_or(0, |outcomes| {
            outcomes
                .iter()
                .filter(|o| matches!(o, RewriteOutcome::Rewritten { .. }))
                .count()
        })
    }

    /// Total substring replacements across all rewritten files.
    pub fn replacements(&self) -> usize {
        self.rewrites.as_deref().map_or(0, |outcomes| {
            outcomes
                .iter()
                .map(|o| match o {
                    RewriteOutcome::Rewritten { replacements, .. } => *replacements,
                    _ => 0,
                })
                .sum()
        })
    }

    pub fn failures(&self) -> Vec<Failure> {
        let mut failures = Vec::new();

        for outcome in self.renames.iter().flatten() {
            if let RenameOutcome::Failed { from, to, error, .. } = outcome {
                failures.push(Failure {
                    path: from.clone(),
                    message: format!("rename to {} failed: {}", self.display_path(to), error),
                });
            }
        }

        for outcome in self.rewrites.iter().flatten() {
            if let RewriteOutcome::Failed { file, error } = outcome {
                failures.push(Failure {
                    path: file.clone(),
                    message: error.to_string(),
                });
            }
        }

        failures
    }

    pub fn has_failures(&self) -> bool {
        self.renames.iter().flatten().any(RenameOutcome::is_failure)
            || self.rewrites.iter().flatten().any(RewriteOutcome::is_failure)
    }

    /// `path` relative to the root when it lies beneath it.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn display_path(&self, path: &Path) -> String {
        self.relative(path).display().to_string()
    }
}

impl fmt::Display for ShiftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.no_op {
            return write!(f, "Old and new strings are identical - no changes needed.");
        }

        match &self.rewrites {
            Some(_) => writeln!(f, "Content Replacements: {}", self.files_rewritten())?,
            None => writeln!(f, "Content Replacements: Skipped")?,
        }
        match &self.renames {
            Some(_) => writeln!(
                f,
                "Structural Renames: {} ({} files, {} directories)",
                self.structural_renames(),
                self.files_renamed(),
                self.dirs_renamed()
            )?,
            None => writeln!(f, "Structural Renames: Skipped")?,
        }
        write!(f, "Failures: {}", self.failures().len())
    }
}
