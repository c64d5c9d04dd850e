//! Exclusion policies deciding which entries a walk may touch.
//!
//! Policies are composed by logical OR in an [`ExclusionSet`]. Every policy
//! receives paths relative to the walk root.

use crate::config::CONFIG_FILE_NAME;
use std::cell::Cell;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

/// Directory names excluded at any depth regardless of configuration.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];

/// A predicate over root-relative paths.
pub trait ExclusionPolicy {
    /// Short label used in diagnostics.
    fn name(&self) -> &'static str;

    fn is_excluded(&self, relative: &Path) -> bool;
}

/// Excludes any path with a component equal to one of a fixed set of names.
#[derive(Debug, Clone)]
pub struct StaticDirectoryExclusion {
    names: Vec<String>,
}

impl Default for StaticDirectoryExclusion {
    fn default() -> Self {
        Self {
            names: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StaticDirectoryExclusion {
    /// Default names plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::default();
        for name in extra {
            let name = name.into();
            if !policy.names.contains(&name) {
                policy.names.push(name);
            }
        }
        policy
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl ExclusionPolicy for StaticDirectoryExclusion {
    fn name(&self) -> &'static str {
        "static"
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        relative.components().any(|component| match component {
            Component::Normal(segment) => self.names.iter().any(|n| OsStr::new(n) == segment),
            _ => false,
        })
    }
}

/// Asks `git check-ignore` whether a path is ignored.
///
/// Any failure to get a verdict counts as "not ignored", so the static policy
/// is the only one left deciding. If the `git` binary cannot be spawned at all
/// the policy stops trying for the rest of the run.
#[derive(Debug)]
pub struct VersionControlExclusion {
    repo_root: PathBuf,
    unavailable: Cell<bool>,
}

impl VersionControlExclusion {
    /// Returns a policy only when `root` is itself a repository root.
    pub fn detect(root: &Path) -> Option<Self> {
        if root.join(".git").exists() {
            Some(Self {
                repo_root: root.to_path_buf(),
                unavailable: Cell::new(false),
            })
        } else {
            None
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

impl ExclusionPolicy for VersionControlExclusion {
    fn name(&self) -> &'static str {
        "git"
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        if self.unavailable.get() {
            return false;
        }

        let status = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(["check-ignore", "-q", "--"])
            .arg(relative)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            // 0: ignored, 1: not ignored, 128: fatal (outside repo etc.)
            Ok(status) => status.success(),
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "git check-ignore unavailable, falling back to static exclusions"
                );
                self.unavailable.set(true);
                false
            }
        }
    }
}

/// All policies for one run, anchored at the walk root.
pub struct ExclusionSet {
    root: PathBuf,
    policies: Vec<Box<dyn ExclusionPolicy>>,
}

impl ExclusionSet {
    /// Static exclusions (defaults plus `extra_dirs`) and, when `use_vcs_ignore`
    /// is set and `root` is a repository, the git ignore rules.
    pub fn new(root: &Path, use_vcs_ignore: bool, extra_dirs: &[String]) -> Self {
        let mut policies: Vec<Box<dyn ExclusionPolicy>> = vec![Box::new(
            StaticDirectoryExclusion::with_extra(extra_dirs.iter().cloned()),
        )];

        if use_vcs_ignore {
            match VersionControlExclusion::detect(root) {
                Some(policy) => policies.push(Box::new(policy)),
                None => tracing::debug!(
                    root = %root.display(),
                    "no repository at root, git ignore rules not consulted"
                ),
            }
        }

        Self {
            root: root.to_path_buf(),
            policies,
        }
    }

    /// A set with caller-supplied policies.
    pub fn with_policies(root: &Path, policies: Vec<Box<dyn ExclusionPolicy>>) -> Self {
        Self {
            root: root.to_path_buf(),
            policies,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the git ignore layer is part of this set.
    pub fn consults_vcs(&self) -> bool {
        self.policies.iter().any(|p| p.name() == "git")
    }

    /// `path` may be absolute (under the root) or already root-relative.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if relative.as_os_str().is_empty() {
            return false;
        }

        if relative == Path::new(CONFIG_FILE_NAME) {
            return true;
        }

        for policy in &self.policies {
            if policy.is_excluded(relative) {
                tracing::debug!(path = %relative.display(), policy = policy.name(), "excluded");
                return true;
            }
        }

        false
    }
}

impl std::fmt::Debug for ExclusionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.policies.iter().map(|p| p.name()).collect();
        f.debug_struct("ExclusionSet")
            .field("root", &self.root)
            .field("policies", &names)
            .finish()
    }
}
