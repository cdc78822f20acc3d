use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::fs::{copy_file_preserving, copy_tree_preserving, walk_tree, write_atomic};

/// One entry produced by [`FileSystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the walk root; empty for the root itself.
    pub relative: PathBuf,
    pub is_dir: bool,
}

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Replace `path` with `contents` in one step.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Copy a file, keeping permissions and timestamps.
    fn copy(&self, src: &Path, dest: &Path) -> Result<()>;
    /// Copy a directory tree into a destination that must not exist yet.
    fn copy_tree(&self, src: &Path, dest: &Path) -> Result<Vec<PathBuf>>;
    /// Immediate children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    /// Recursive listing of `root` (root first, then sorted children).
    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

pub trait Effects: Send + Sync {
    fn fs(&self) -> &dyn FileSystem;
}

pub struct SystemEffects {
    fs: Arc<SystemFileSystem>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fs: Arc::new(SystemFileSystem),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        write_atomic(path, contents).with_context(|| format!("writing {}", path.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<()> {
        copy_file_preserving(src, dest)
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))
    }

    fn copy_tree(&self, src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        copy_tree_preserving(src, dest)
            .with_context(|| format!("copying tree {} to {}", src.display(), dest.display()))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)
            .with_context(|| format!("reading dir {}", path.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("listing {}", path.display()))?;
        entries.sort();
        Ok(entries)
    }

    fn walk(&self, root: &Path) -> Result<Vec<WalkEntry>> {
        walk_tree(root).with_context(|| format!("walking {}", root.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).with_context(|| format!("canonicalizing {}", path.display()))
    }
}
