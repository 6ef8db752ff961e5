//! Enumeration of hierarchical nodes
//!
//! The walker never looks inside a node itself. It asks a [`Hierarchy`] for
//! the direct children of each node and classifies them as leaves or
//! containers. [`FsHierarchy`] is the filesystem implementation used by the
//! CLI; tests plug in an in-memory tree.

use crate::error::{ConfigError, EnumerateError, EnumerateResult};
use regex::Regex;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Whether a child can itself be enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    /// Terminal node (e.g. a file)
    Leaf,
    /// Node with children of its own (e.g. a directory)
    Container,
}

/// A direct child of an enumerated node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child<N> {
    pub kind: ChildKind,
    pub node: N,
}

impl<N> Child<N> {
    pub fn leaf(node: N) -> Self {
        Self {
            kind: ChildKind::Leaf,
            node,
        }
    }

    pub fn container(node: N) -> Self {
        Self {
            kind: ChildKind::Container,
            node,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == ChildKind::Leaf
    }
}

/// Lazy sequence of children
pub type Children<'a, N> = Box<dyn Iterator<Item = Child<N>> + 'a>;

/// Source of children for the walker
///
/// Implementations must skip children they cannot inspect (for example on
/// permission errors) rather than fail the whole enumeration.
pub trait Hierarchy: Send + Sync + 'static {
    /// Opaque node handle
    type Node: Clone + Debug + Send + Sync + 'static;

    /// Reject a starting node that cannot hold children
    fn validate_root(&self, root: &Self::Node) -> Result<(), ConfigError>;

    /// Direct children of `node`, produced lazily
    fn children<'a>(&'a self, node: &Self::Node) -> EnumerateResult<Children<'a, Self::Node>>;
}

/// Filesystem hierarchy backed by `std::fs::read_dir`
#[derive(Debug, Clone, Default)]
pub struct FsHierarchy {
    exclude_patterns: Vec<Regex>,
    follow_symlinks: bool,
}

impl FsHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip children whose path matches any of these patterns
    pub fn with_excludes(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Treat symlinks to directories as containers
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }

    fn classify(&self, entry: &fs::DirEntry) -> Option<ChildKind> {
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                trace!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                return None;
            }
        };

        if file_type.is_dir() {
            return Some(ChildKind::Container);
        }

        if file_type.is_symlink() && self.follow_symlinks {
            // Broken or unreadable links fall back to being leaves
            let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
            if is_dir {
                return Some(ChildKind::Container);
            }
        }

        Some(ChildKind::Leaf)
    }
}

impl Hierarchy for FsHierarchy {
    type Node = PathBuf;

    fn validate_root(&self, root: &PathBuf) -> Result<(), ConfigError> {
        let metadata = fs::metadata(root).map_err(|e| ConfigError::InvalidRoot {
            root: root.display().to_string(),
            reason: e.to_string(),
        })?;

        if !metadata.is_dir() {
            return Err(ConfigError::InvalidRoot {
                root: root.display().to_string(),
                reason: "not a directory".into(),
            });
        }

        Ok(())
    }

    fn children<'a>(&'a self, node: &PathBuf) -> EnumerateResult<Children<'a, PathBuf>> {
        let entries = fs::read_dir(node)
            .map_err(|e| EnumerateError::from_io(node.display().to_string(), &e))?;

        let children = entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    trace!(error = %e, "Skipping unreadable entry");
                    return None;
                }
            };

            let path = entry.path();
            if self.is_excluded(&path) {
                trace!(path = %path.display(), "Excluded");
                return None;
            }

            self.classify(&entry).map(|kind| Child { kind, node: path })
        });

        Ok(Box::new(children))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemTree;
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_fs_children_classified() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("a.txt")).unwrap();
        File::create(dir.path().join("b.txt")).unwrap();

        let hierarchy = FsHierarchy::new();
        let children: Vec<_> = hierarchy
            .children(&dir.path().to_path_buf())
            .unwrap()
            .collect();

        assert_eq!(children.len(), 3);
        assert_eq!(children.iter().filter(|c| c.is_leaf()).count(), 2);
        assert!(children
            .iter()
            .any(|c| c.kind == ChildKind::Container && c.node.ends_with("sub")));
    }

    #[test]
    fn test_fs_exclude_pattern() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".snapshot")).unwrap();
        File::create(dir.path().join("keep.txt")).unwrap();

        let hierarchy =
            FsHierarchy::new().with_excludes(vec![Regex::new(r"\.snapshot").unwrap()]);
        let children: Vec<_> = hierarchy
            .children(&dir.path().to_path_buf())
            .unwrap()
            .collect();

        assert_eq!(children.len(), 1);
        assert!(children[0].node.ends_with("keep.txt"));
    }

    #[test]
    fn test_fs_validate_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        File::create(&file).unwrap();

        let hierarchy = FsHierarchy::new();
        assert!(hierarchy.validate_root(&dir.path().to_path_buf()).is_ok());
        assert!(matches!(
            hierarchy.validate_root(&file),
            Err(ConfigError::InvalidRoot { .. })
        ));
        assert!(hierarchy.validate_root(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_fs_missing_node_is_recoverable() {
        let dir = tempdir().unwrap();
        let err = FsHierarchy::new()
            .children(&dir.path().join("missing"))
            .err()
            .unwrap();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_mem_tree_shape() {
        let tree = MemTree::generate(2, 2, 3);
        let root: Vec<_> = tree.children(&0).unwrap().collect();
        assert_eq!(root.len(), 5);

        let leaf = tree.first_leaf(0).unwrap();
        assert!(tree.validate_root(&leaf).is_err());
        assert!(tree.validate_root(&tree.first_container(0).unwrap()).is_ok());
    }
}
