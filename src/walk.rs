//! Tree walks. Both return fully materialized lists so nothing is mutated
//! while a walk is in progress.

use crate::exclusion::ExclusionSet;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    File,
    Directory,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::File => write!(f, "file"),
            EntityKind::Directory => write!(f, "directory"),
        }
    }
}

/// A filesystem node as observed at walk time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub path: PathBuf,
    pub kind: EntityKind,
}

impl Entity {
    pub fn is_dir(&self) -> bool {
        self.kind == EntityKind::Directory
    }
}

fn walk<'a>(root: &Path, exclusions: &'a ExclusionSet) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !exclusions.is_excluded(entry.path()))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                None
            }
        })
}

/// Every non-excluded file and directory under `root`, root excluded.
///
/// Excluded directories are pruned, so nothing beneath them is listed.
/// Symlinks and special files are left out.
pub fn collect_entities(root: &Path, exclusions: &ExclusionSet) -> Vec<Entity> {
    walk(root, exclusions)
        .filter_map(|entry| {
            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntityKind::Directory
            } else if file_type.is_file() {
                EntityKind::File
            } else {
                return None;
            };
            Some(Entity {
                path: entry.into_path(),
                kind,
            })
        })
        .collect()
}

/// Every non-excluded regular file under `root`.
pub fn collect_files(root: &Path, exclusions: &ExclusionSet) -> Vec<PathBuf> {
    walk(root, exclusions)
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .collect()
}

/// Order entities deepest first: by path length, longest first.
///
/// A directory's path is always shorter than any of its descendants', so every
/// descendant is handled before the directory itself is moved.
pub fn sort_deepest_first(entities: &mut [Entity]) {
    entities.sort_by(|a, b| b.path.as_os_str().len().cmp(&a.path.as_os_str().len()));
}
