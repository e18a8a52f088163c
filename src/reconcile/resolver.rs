use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("path {0} is not inside the working tree")]
    OutsideTree(String),
}

/// Source of current file contents for paths named in the diff.
///
/// The content must reflect the diff's end revision; nothing here checks
/// that.
pub trait FileResolver {
    fn read(&self, path: &str) -> Result<String, ResolveError>;
}

/// Reads files relative to a checked-out working tree.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, path: &str) -> Result<PathBuf, ResolveError> {
        let relative = Path::new(path);
        let stays_inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !stays_inside {
            return Err(ResolveError::OutsideTree(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileResolver for WorkingTree {
    fn read(&self, path: &str) -> Result<String, ResolveError> {
        let full = self.locate(path)?;
        debug!(path = %full.display(), "reading working tree file");
        let bytes = std::fs::read(&full).map_err(|source| ResolveError::Unreadable {
            path: path.to_string(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Fixed in-memory contents, keyed by diff-relative path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryTree {
    files: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryTree {
    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

#[cfg(test)]
impl FileResolver for MemoryTree {
    fn read(&self, path: &str) -> Result<String, ResolveError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::Unreadable {
                path: path.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("xpcom/base")).unwrap();
        fs::write(dir.path().join("xpcom/base/nsIFoo.idl"), "interface nsIFoo;\n").unwrap();

        let tree = WorkingTree::new(dir.path());
        let content = tree.read("xpcom/base/nsIFoo.idl").unwrap();
        assert_eq!(content, "interface nsIFoo;\n");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let tree = WorkingTree::new(dir.path());
        assert!(matches!(
            tree.read("nope.idl"),
            Err(ResolveError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_paths_escaping_the_tree_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tree = WorkingTree::new(dir.path());
        assert!(matches!(
            tree.read("../outside.idl"),
            Err(ResolveError::OutsideTree(_))
        ));
        assert!(matches!(
            tree.read("/etc/passwd"),
            Err(ResolveError::OutsideTree(_))
        ));
    }

    #[test]
    fn test_memory_tree() {
        let tree = MemoryTree::default().with("a.idl", "x");
        assert_eq!(tree.read("a.idl").unwrap(), "x");
        assert!(tree.read("b.idl").is_err());
    }
}
