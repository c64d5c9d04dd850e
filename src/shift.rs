//! Run orchestration: structural renames strictly before content rewrites.

use crate::config::ShiftConfig;
use crate::exclusion::ExclusionSet;
use crate::rename::rename_tree;
use crate::report::ShiftReport;
use crate::rewrite::rewrite_tree;
use crate::safety::{RootGuard, SafetyError};
use crate::token::TokenPair;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phases {
    /// Renames, then content rewrites.
    #[default]
    Full,
    /// Content rewrites only.
    ContentOnly,
    /// Structural renames only.
    FilesOnly,
}

impl Phases {
    /// Build from the two CLI switches; both set is a usage error.
    pub fn from_flags(content_only: bool, files_only: bool) -> Result<Self, ShiftError> {
        match (content_only, files_only) {
            (true, true) => Err(ShiftError::ConflictingPhases),
            (true, false) => Ok(Phases::ContentOnly),
            (false, true) => Ok(Phases::FilesOnly),
            (false, false) => Ok(Phases::Full),
        }
    }

    pub fn renames(self) -> bool {
        self != Phases::ContentOnly
    }

    pub fn rewrites(self) -> bool {
        self != Phases::FilesOnly
    }
}

impl fmt::Display for Phases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phases::Full => write!(f, "Full"),
            Phases::ContentOnly => write!(f, "Content Only"),
            Phases::FilesOnly => write!(f, "Files Only"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("--content-only and --files-only are mutually exclusive")]
    ConflictingPhases,

    #[error("old string must not be empty")]
    EmptyToken,

    #[error("root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Root(#[from] SafetyError),
}

#[derive(Debug, Clone)]
pub struct ShiftOptions {
    pub root: PathBuf,
    pub phases: Phases,
    /// Consult git ignore rules when the root is a repository.
    pub use_vcs_ignore: bool,
    /// Directory names excluded on top of `.git` and `node_modules`.
    pub extra_excludes: Vec<String>,
}

impl ShiftOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            phases: Phases::Full,
            use_vcs_ignore: true,
            extra_excludes: Vec::new(),
        }
    }

    /// Options seeded from a root's `.deepshift.toml`.
    pub fn from_config(root: impl Into<PathBuf>, config: &ShiftConfig) -> Self {
        Self {
            use_vcs_ignore: config.vcs_ignore,
            extra_excludes: config.exclude.clone(),
            ..Self::new(root)
        }
    }

    pub fn phases(mut self, phases: Phases) -> Self {
        self.phases = phases;
        self
    }

    pub fn use_vcs_ignore(mut self, enabled: bool) -> Self {
        self.use_vcs_ignore = enabled;
        self
    }
}

/// Rename and rewrite `tokens.old()` to `tokens.new_token()` under the root.
///
/// Errors only for an unusable root or empty token, before anything is
/// touched. Per-entity failures are inside the report.
pub fn shift(tokens: &TokenPair, options: &ShiftOptions) -> Result<ShiftReport, ShiftError> {
    if tokens.old().is_empty() {
        return Err(ShiftError::EmptyToken);
    }

    let guard = RootGuard::new(&options.root)?;
    let root = guard.root().to_path_buf();
    if !root.is_dir() {
        return Err(ShiftError::NotADirectory(root));
    }

    if tokens.is_identity() {
        tracing::info!(token = tokens.old(), "old and new are identical, nothing to do");
        return Ok(ShiftReport::no_op(tokens.clone(), root));
    }

    let exclusions = ExclusionSet::new(&root, options.use_vcs_ignore, &options.extra_excludes);
    tracing::debug!(?exclusions, phases = %options.phases, "starting shift");

    // The content phase must see final names and paths.
    let renames = options
        .phases
        .renames()
        .then(|| rename_tree(&root, tokens, &exclusions));
    let rewrites = options
        .phases
        .rewrites()
        .then(|| rewrite_tree(&root, tokens, &exclusions));

    Ok(ShiftReport::new(
        tokens.clone(),
        root,
        renames,
        rewrites,
        exclusions.consults_vcs(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_phases_from_flags() {
        assert_eq!(Phases::from_flags(false, false).unwrap(), Phases::Full);
        assert_eq!(Phases::from_flags(true, false).unwrap(), Phases::ContentOnly);
        assert_eq!(Phases::from_flags(false, true).unwrap(), Phases::FilesOnly);
        assert!(matches!(
            Phases::from_flags(true, true),
            Err(ShiftError::ConflictingPhases)
        ));
    }

    #[test]
    fn test_identity_is_no_op() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("same.js"), "same").unwrap();

        let report = shift(
            &TokenPair::new("same", "same"),
            &ShiftOptions::new(temp_dir.path()),
        )
        .unwrap();

        assert!(report.is_no_op());
        assert!(temp_dir.path().join("same.js").exists());
    }

    #[test]
    fn test_empty_token_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = shift(&TokenPair::new("", "x"), &ShiftOptions::new(temp_dir.path()));
        assert!(matches!(result, Err(ShiftError::EmptyToken)));
    }

    #[test]
    fn test_missing_root_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = shift(
            &TokenPair::new("a", "b"),
            &ShiftOptions::new(temp_dir.path().join("missing")),
        );
        assert!(matches!(result, Err(ShiftError::Root(_))));
    }

    #[test]
    fn test_file_root_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "a").unwrap();

        let result = shift(&TokenPair::new("a", "b"), &ShiftOptions::new(&file));
        assert!(matches!(result, Err(ShiftError::NotADirectory(_))));
    }

    #[test]
    fn test_files_only_leaves_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("old.js"), "old").unwrap();

        let options = ShiftOptions::new(temp_dir.path()).phases(Phases::FilesOnly);
        let report = shift(&TokenPair::new("old", "new"), &options).unwrap();

        assert!(report.rewrites.is_none());
        assert_eq!(report.files_renamed(), 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("new.js")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_content_only_leaves_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("old.js"), "old").unwrap();

        let options = ShiftOptions::new(temp_dir.path()).phases(Phases::ContentOnly);
        let report = shift(&TokenPair::new("old", "new"), &options).unwrap();

        assert!(report.renames.is_none());
        assert_eq!(report.files_rewritten(), 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("old.js")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_report_records_vcs_layer() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();
        fs::write(temp_dir.path().join("old.js"), "old").unwrap();

        let disabled = ShiftOptions::new(temp_dir.path())
            .phases(Phases::ContentOnly)
            .use_vcs_ignore(false);
        let report = shift(&TokenPair::new("old", "mid"), &disabled).unwrap();
        assert!(!report.consults_vcs);

        let enabled = ShiftOptions::new(temp_dir.path()).phases(Phases::ContentOnly);
        let report = shift(&TokenPair::new("mid", "new"), &enabled).unwrap();
        assert!(report.consults_vcs);
        assert_eq!(report.files_rewritten(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = ShiftConfig {
            exclude: vec!["dist".to_string()],
            vcs_ignore: false,
        };
        let options = ShiftOptions::from_config("/project", &config);
        assert_eq!(options.extra_excludes, vec!["dist"]);
        assert!(!options.use_vcs_ignore);
        assert_eq!(options.phases, Phases::Full);
    }
}
