use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use filetime::FileTime;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::effects::WalkEntry;

/// Write through a sibling temp file and rename it over `path`, so readers
/// never observe a half-written file. Existing permissions are kept.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    match fs::metadata(path) {
        Ok(meta) => fs::set_permissions(tmp.path(), meta.permissions())?,
        Err(_) => set_default_file_mode(tmp.path())?,
    }
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_default_file_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_default_file_mode(_path: &Path) -> Result<()> {
    Ok(())
}

/// Copy `src` to `dest`, overwriting it, and carry over permission bits plus
/// access and modification times.
pub(crate) fn copy_file_preserving(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)?;
    let meta = fs::metadata(src)?;
    copy_times(&meta, dest)
}

/// Recursively copy `src` into a not-yet-existing `dest`. Returns the copied
/// files as paths relative to `src`.
pub(crate) fn copy_tree_preserving(src: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    if dest.exists() {
        bail!("destination {} already exists", dest.display());
    }
    let mut copied = Vec::new();
    let mut dirs = Vec::new();
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| anyhow!("{} escaped {}", entry.path().display(), src.display()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            dirs.push((entry.path().to_path_buf(), target));
        } else {
            copy_file_preserving(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
            copied.push(rel.to_path_buf());
        }
    }
    // Directory stats go last; populating a directory bumps its mtime.
    for (source_dir, target_dir) in dirs.iter().rev() {
        let meta = fs::metadata(source_dir)?;
        fs::set_permissions(target_dir, meta.permissions())?;
        copy_times(&meta, target_dir)?;
    }
    Ok(copied)
}

pub(crate) fn walk_tree(root: &Path) -> Result<Vec<WalkEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .map_err(|_| anyhow!("{} escaped {}", entry.path().display(), root.display()))?;
        entries.push(WalkEntry {
            path: entry.path().to_path_buf(),
            relative,
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

fn copy_times(meta: &fs::Metadata, dest: &Path) -> Result<()> {
    let atime = FileTime::from_last_access_time(meta);
    let mtime = FileTime::from_last_modification_time(meta);
    filetime::set_file_times(dest, atime, mtime)
        .with_context(|| format!("failed to set times on {}", dest.display()))
}
