use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Keeps rename destinations inside the root being migrated.
///
/// Destinations do not exist yet, so the check is lexical: the path must sit
/// under the root and must not climb out through `..` components.
#[derive(Debug, Clone)]
pub struct RootGuard {
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("Path climbs out of its directory: {path}")]
    ParentTraversal { path: PathBuf },

    #[error("Failed to canonicalize root: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl RootGuard {
    /// Create a guard for `root`, canonicalizing it so symlinked roots compare
    /// equal to the paths produced by walking them.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    /// Guard an already-resolved root without touching the filesystem.
    pub fn for_resolved(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that `path` is a location strictly inside the root.
    pub fn validate_destination(&self, path: &Path) -> Result<(), SafetyError> {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return Err(SafetyError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        };

        let mut depth = 0usize;
        for component in relative.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                _ => {
                    return Err(SafetyError::ParentTraversal {
                        path: path.to_path_buf(),
                    })
                }
            }
        }

        if depth == 0 {
            return Err(SafetyError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }

        Ok(())
    }
}
