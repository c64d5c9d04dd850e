//! Structural renamer.
//!
//! Collects every eligible entity up front, orders them deepest first and
//! renames the ones whose name (basename mode) or root-relative path
//! (segment mode) matches the old token. Failures are recorded per entity and
//! never stop the batch.

use crate::exclusion::ExclusionSet;
use crate::safety::{RootGuard, SafetyError};
use crate::token::{split_extension, MatchMode, TokenPair};
use crate::walk::{collect_entities, sort_deepest_first, Entity, EntityKind};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("replacement leaves an empty name for {0}")]
    EmptyName(PathBuf),

    #[error(transparent)]
    Unsafe(#[from] SafetyError),

    #[error("failed to create parent directory {path}: {source}")]
    CreateParent { path: PathBuf, source: io::Error },

    #[error("rename failed: {0}")]
    Io(#[from] io::Error),
}

/// What matching decided for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenamePlan {
    /// The entity does not match the old token.
    NoMatch,
    /// The entity matches but replacement does not change its path, e.g. the
    /// token only occurs in a file extension.
    Unchanged,
    /// The entity should move to this path.
    Move(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already moved earlier in this run.
    AlreadyRenamed,
    /// Matched, but the computed path is identical.
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyRenamed => write!(f, "already renamed"),
            SkipReason::Unchanged => write!(f, "name unchanged by replacement"),
        }
    }
}

/// Result of handling one matching entity.
#[derive(Debug)]
#[must_use = "RenameOutcome should be checked for failures"]
pub enum RenameOutcome {
    Renamed {
        from: PathBuf,
        to: PathBuf,
        kind: EntityKind,
        mode: MatchMode,
    },
    Skipped {
        path: PathBuf,
        kind: EntityKind,
        reason: SkipReason,
    },
    Failed {
        from: PathBuf,
        to: PathBuf,
        kind: EntityKind,
        error: RenameError,
    },
}

impl RenameOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RenameOutcome::Failed { .. })
    }
}

/// Decide where `entity` should go. Pure: touches no filesystem state.
pub fn plan_destination(entity: &Entity, root: &Path, tokens: &TokenPair) -> RenamePlan {
    match tokens.mode() {
        MatchMode::Segment => plan_segment(entity, root, tokens),
        MatchMode::Basename => plan_basename(entity, tokens),
    }
}

fn plan_segment(entity: &Entity, root: &Path, tokens: &TokenPair) -> RenamePlan {
    let old = tokens.old();
    let Some(relative) = entity
        .path
        .strip_prefix(root)
        .ok()
        .and_then(|p| p.to_str())
    else {
        return RenamePlan::NoMatch;
    };

    if !relative.contains(old) {
        return RenamePlan::NoMatch;
    }

    // Only a trailing match counts as structural; a directory may also match a
    // suffix that starts mid-segment.
    let is_segment_match = relative == old
        || relative.ends_with(&format!("{MAIN_SEPARATOR}{old}"))
        || (entity.is_dir() && relative.ends_with(old));
    if !is_segment_match {
        return RenamePlan::NoMatch;
    }

    let replaced = relative.replace(old, tokens.new_token());
    if replaced == relative {
        return RenamePlan::Unchanged;
    }

    RenamePlan::Move(root.join(replaced))
}

fn plan_basename(entity: &Entity, tokens: &TokenPair) -> RenamePlan {
    let old = tokens.old();
    let Some(name) = entity.path.file_name().and_then(|n| n.to_str()) else {
        return RenamePlan::NoMatch;
    };

    if old.is_empty() || !name.contains(old) {
        return RenamePlan::NoMatch;
    }

    let new_name = match entity.kind {
        EntityKind::File => {
            let (stem, extension) = split_extension(name);
            format!(
                "{}{}",
                stem.replace(old, tokens.new_token()),
                extension.unwrap_or("")
            )
        }
        EntityKind::Directory => name.replace(old, tokens.new_token()),
    };

    if new_name == name {
        return RenamePlan::Unchanged;
    }

    let parent = entity.path.parent().unwrap_or_else(|| Path::new(""));
    RenamePlan::Move(parent.join(new_name))
}

fn apply_move(from: &Path, to: &Path, guard: &RootGuard) -> Result<(), RenameError> {
    // An empty replacement name joins back onto the parent itself.
    if from.parent() == Some(to) {
        return Err(RenameError::EmptyName(from.to_path_buf()));
    }

    guard.validate_destination(to)?;

    if fs::symlink_metadata(to).is_ok() {
        return Err(RenameError::DestinationExists(to.to_path_buf()));
    }

    if let Some(parent) = to.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| RenameError::CreateParent {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    fs::rename(from, to)?;
    Ok(())
}

/// Rename every matching entity under `root`.
///
/// `root` must be the resolved root the exclusions were built for. Only
/// entities that matched produce an outcome.
pub fn rename_tree(
    root: &Path,
    tokens: &TokenPair,
    exclusions: &ExclusionSet,
) -> Vec<RenameOutcome> {
    let guard = RootGuard::for_resolved(root);
    let mut entities = collect_entities(root, exclusions);
    sort_deepest_first(&mut entities);

    tracing::info!(
        entities = entities.len(),
        mode = ?tokens.mode(),
        "structural rename phase"
    );

    let mut renamed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut outcomes = Vec::new();

    for entity in entities {
        if renamed.contains_key(&entity.path) {
            outcomes.push(RenameOutcome::Skipped {
                path: entity.path,
                kind: entity.kind,
                reason: SkipReason::AlreadyRenamed,
            });
            continue;
        }

        let to = match plan_destination(&entity, root, tokens) {
            RenamePlan::NoMatch => continue,
            RenamePlan::Unchanged => {
                outcomes.push(RenameOutcome::Skipped {
                    path: entity.path,
                    kind: entity.kind,
                    reason: SkipReason::Unchanged,
                });
                continue;
            }
            RenamePlan::Move(to) => to,
        };

        match apply_move(&entity.path, &to, &guard) {
            Ok(()) => {
                tracing::info!(
                    from = %entity.path.display(),
                    to = %to.display(),
                    kind = %entity.kind,
                    "renamed"
                );
                renamed.insert(entity.path.clone(), to.clone());
                outcomes.push(RenameOutcome::Renamed {
                    from: entity.path,
                    to,
                    kind: entity.kind,
                    mode: tokens.mode(),
                });
            }
            Err(error) => {
                tracing::debug!(
                    from = %entity.path.display(),
                    to = %to.display(),
                    error = %error,
                    "rename failed"
                );
                outcomes.push(RenameOutcome::Failed {
                    from: entity.path,
                    to,
                    kind: entity.kind,
                    error,
                });
            }
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn file(path: impl Into<PathBuf>) -> Entity {
        Entity {
            path: path.into(),
            kind: EntityKind::File,
        }
    }

    fn dir(path: impl Into<PathBuf>) -> Entity {
        Entity {
            path: path.into(),
            kind: EntityKind::Directory,
        }
    }

    fn renamed_pairs(root: &Path, outcomes: &[RenameOutcome]) -> Vec<(PathBuf, PathBuf)> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                RenameOutcome::Renamed { from, to, .. } => Some((
                    from.strip_prefix(root).unwrap().to_path_buf(),
                    to.strip_prefix(root).unwrap().to_path_buf(),
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_basename_file_keeps_extension() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("old_component", "new_component");

        let plan = plan_destination(&file("/project/old_component.js"), root, &tokens);
        assert_eq!(plan, RenamePlan::Move(PathBuf::from("/project/new_component.js")));
    }

    #[test]
    fn test_basename_file_without_extension() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("old", "new");

        let plan = plan_destination(&file("/project/bin/old_tool"), root, &tokens);
        assert_eq!(plan, RenamePlan::Move(PathBuf::from("/project/bin/new_tool")));
    }

    #[test]
    fn test_basename_token_only_in_extension() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("old", "new");

        let plan = plan_destination(&file("/project/notes.old"), root, &tokens);
        assert_eq!(plan, RenamePlan::Unchanged);
    }

    #[test]
    fn test_basename_directory_replaces_whole_name() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("old", "new");

        let plan = plan_destination(&dir("/project/old.d"), root, &tokens);
        assert_eq!(plan, RenamePlan::Move(PathBuf::from("/project/new.d")));
    }

    #[test]
    fn test_basename_ignores_ancestor_matches() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("old_value", "new_value");

        let plan = plan_destination(&file("/project/old_value/index.js"), root, &tokens);
        assert_eq!(plan, RenamePlan::NoMatch);
    }

    #[test]
    #[cfg(unix)]
    fn test_segment_requires_trailing_match() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("src/old_feature", "src/new_module");

        assert_eq!(
            plan_destination(&dir("/project/src/old_feature"), root, &tokens),
            RenamePlan::Move(PathBuf::from("/project/src/new_module"))
        );
        assert_eq!(
            plan_destination(&file("/project/src/old_feature/index.js"), root, &tokens),
            RenamePlan::NoMatch
        );
        assert_eq!(
            plan_destination(&file("/project/src/old_feature_two"), root, &tokens),
            RenamePlan::NoMatch
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_segment_mid_segment_suffix_directory_only() {
        let root = Path::new("/project");
        let tokens = TokenPair::new("lib/old", "lib/new");

        assert_eq!(
            plan_destination(&dir("/project/mylib/old"), root, &tokens),
            RenamePlan::Move(PathBuf::from("/project/mylib/new"))
        );
        assert_eq!(
            plan_destination(&file("/project/mylib/old"), root, &tokens),
            RenamePlan::NoMatch
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_segment_never_touches_root_ancestors() {
        let root = Path::new("/home/src/old_feature/project");
        let tokens = TokenPair::new("src/old_feature", "src/new_module");

        assert_eq!(
            plan_destination(&dir("/home/src/old_feature/project/lib"), root, &tokens),
            RenamePlan::NoMatch
        );
    }

    #[test]
    fn test_rename_tree_deepest_first_nested_matches() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("a/old/b/old")).unwrap();
        fs::write(root.join("a/old/b/old/old.txt"), "x").unwrap();

        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &TokenPair::new("old", "new"), &exclusions);

        assert!(outcomes.iter().all(|o| !o.is_failure()));
        assert_eq!(renamed_pairs(&root, &outcomes).len(), 3);
        assert!(root.join("a/new/b/new/new.txt").is_file());
        assert!(!root.join("a/old").exists());
    }

    #[test]
    fn test_rename_tree_segment_mode_creates_parents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src/old_feature")).unwrap();
        fs::write(root.join("src/old_feature/index.js"), "x").unwrap();

        let tokens = TokenPair::new(
            format!("src{MAIN_SEPARATOR}old_feature"),
            format!("lib{MAIN_SEPARATOR}features{MAIN_SEPARATOR}new_module"),
        );
        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &tokens, &exclusions);

        assert!(outcomes.iter().all(|o| !o.is_failure()));
        assert!(root.join("lib/features/new_module/index.js").is_file());
        assert!(!root.join("src/old_feature").exists());
    }

    #[test]
    fn test_rename_tree_collision_fails_without_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::write(root.join("old.js"), "original").unwrap();
        fs::write(root.join("new.js"), "existing").unwrap();

        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &TokenPair::new("old", "new"), &exclusions);

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            &outcomes[0],
            RenameOutcome::Failed {
                error: RenameError::DestinationExists(_),
                ..
            }
        ));
        assert_eq!(fs::read_to_string(root.join("new.js")).unwrap(), "existing");
        assert!(root.join("old.js").exists());
    }

    #[test]
    fn test_rename_tree_failure_does_not_abort_batch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::write(root.join("old_a.js"), "").unwrap();
        fs::write(root.join("new_a.js"), "").unwrap();
        fs::write(root.join("old_b.js"), "").unwrap();

        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &TokenPair::new("old", "new"), &exclusions);

        assert_eq!(outcomes.iter().filter(|o| o.is_failure()).count(), 1);
        assert!(root.join("new_b.js").exists());
    }

    #[test]
    fn test_rename_tree_skips_excluded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("node_modules/old_pkg")).unwrap();
        fs::write(root.join("node_modules/old_pkg/old.js"), "").unwrap();

        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &TokenPair::new("old", "new"), &exclusions);

        assert!(outcomes.is_empty());
        assert!(root.join("node_modules/old_pkg/old.js").exists());
    }

    #[test]
    fn test_empty_replacement_name_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("old")).unwrap();

        let exclusions = ExclusionSet::new(&root, false, &[]);
        let outcomes = rename_tree(&root, &TokenPair::new("old", ""), &exclusions);

        assert!(matches!(
            &outcomes[0],
            RenameOutcome::Failed {
                error: RenameError::EmptyName(_),
                ..
            }
        ));
        assert!(root.join("old").is_dir());
    }

    proptest! {
        #[test]
        fn prop_basename_rename_keeps_extension(
            prefix in "[a-z_]{0,6}",
            suffix in "[a-z_]{0,6}",
            ext in "[a-z]{1,4}",
        ) {
            let root = Path::new("/r");
            let stem = format!("{prefix}old{suffix}");
            let entity = file(root.join(format!("{stem}.{ext}")));

            let plan = plan_destination(&entity, root, &TokenPair::new("old", "fresh"));
            let expected = root.join(format!("{}.{}", stem.replace("old", "fresh"), ext));
            prop_assert_eq!(plan, RenamePlan::Move(expected));
        }
    }
}
