/*
File: hoist-aio/src/fs.rs
Purpose: Primitive synchronous filesystem operations.
*/
use std::{
    ffi::OsStr,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use hoist_common::error::{HoistError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        HoistError::from(e)
    })
}

/// Removes a directory and all its contents recursively.
pub fn remove_directory_recursive(path: &Path) -> Result<()> {
    debug!("Removing directory recursively: {}", path.display());
    fs::remove_dir_all(path).map_err(|e| {
        if e.kind() != io::ErrorKind::NotFound {
            error!("Failed remove dir_all {}: {}", path.display(), e);
        }
        HoistError::from(e)
    })
}

/// Removes a directory tree if it exists. Failures are logged, never returned.
/// Returns whether the path is gone afterwards.
pub fn remove_dir_best_effort(path: &Path) -> bool {
    if path.symlink_metadata().is_err() {
        return true;
    }
    match remove_directory_recursive(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Reads the entire contents of a file into a string.
pub fn read_to_string(path: &Path) -> Result<String> {
    debug!("Reading file to string: {}", path.display());
    fs::read_to_string(path).map_err(|e| {
        error!("Failed read file {}: {}", path.display(), e);
        HoistError::from(e)
    })
}

/// Atomically writes data to a file using a temporary file in the same
/// directory. Preserves original permissions if possible.
pub fn atomic_write_file(original_path: &Path, content: &[u8]) -> Result<()> {
    let dir = original_path.parent().ok_or_else(|| {
        HoistError::StorageError(format!(
            "Cannot get parent directory for {}",
            original_path.display()
        ))
    })?;

    create_dir_all(dir)?;

    let original_perms = fs::metadata(original_path).map(|m| m.permissions()).ok();

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let temp_path = temp_file.path().to_path_buf();

    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        original_path.display(),
        temp_path.display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(original_path).map_err(|e| {
        error!(
            "Failed to persist/rename temporary file {} over {}: {}",
            temp_path.display(),
            original_path.display(),
            e.error
        );
        HoistError::Io(Arc::new(e.error))
    })?;

    if let Some(perms) = original_perms {
        if let Err(e) = fs::set_permissions(original_path, perms) {
            warn!(
                "Failed to restore original permissions on {}: {}",
                original_path.display(),
                e
            );
        }
    } else {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // NamedTempFile is created 0600
            if let Err(e) = fs::set_permissions(original_path, fs::Permissions::from_mode(0o644)) {
                warn!(
                    "Failed to set default permissions on new file {}: {}",
                    original_path.display(),
                    e
                );
            }
        }
    }

    Ok(())
}

fn is_excluded(name: &OsStr, excluded: &[String]) -> bool {
    name.to_str()
        .is_some_and(|n| excluded.iter().any(|x| x == n))
}

/// Recursively copies `src` into `dst`, skipping every directory whose name is
/// listed in `excluded` (at any depth). Returns the number of files copied.
pub fn copy_dir_filtered(src: &Path, dst: &Path, excluded: &[String]) -> Result<u64> {
    if !src.is_dir() {
        return Err(HoistError::Io(Arc::new(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source directory not found: {}", src.display()),
        ))));
    }
    debug!(
        "Copying {} -> {} (excluding {:?})",
        src.display(),
        dst.display(),
        excluded
    );
    create_dir_all(dst)?;

    let mut copied = 0u64;
    let walker = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && is_excluded(e.file_name(), excluded)));

    for entry in walker {
        let entry = entry.map_err(|e| HoistError::from(io::Error::from(e)))?;
        let relative = entry.path().strip_prefix(src).map_err(|e| {
            HoistError::Generic(format!(
                "Walked path {} escaped {}: {}",
                entry.path().display(),
                src.display(),
                e
            ))
        })?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|e| {
                error!(
                    "Failed copy {} -> {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                );
                HoistError::from(e)
            })?;
            copied += 1;
        }
    }
    debug!("Copied {} files into {}", copied, dst.display());
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link)?;
    std::os::unix::fs::symlink(points_to, target).map_err(HoistError::from)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target).map(|_| ()).map_err(HoistError::from)
}

/// Removes every directory named in `excluded` below `root`.
pub fn prune_excluded_dirs(root: &Path, excluded: &[String]) -> Result<usize> {
    let doomed: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && is_excluded(e.file_name(), excluded))
        .map(|e| e.into_path())
        .collect();

    let mut removed = 0;
    for dir in doomed {
        // A parent of this entry may already have been removed.
        if dir.exists() {
            remove_directory_recursive(&dir)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Moves a directory tree. Tries a single rename first and falls back to a
/// filtered copy plus removal of the source when the rename fails (for
/// example across filesystems). Excluded directories never reach `dst`.
pub fn move_dir(src: &Path, dst: &Path, excluded: &[String]) -> Result<()> {
    debug!("Moving {} -> {}", src.display(), dst.display());
    match fs::rename(src, dst) {
        Ok(()) => {
            prune_excluded_dirs(dst, excluded)?;
            Ok(())
        }
        Err(e) => {
            debug!(
                "Rename {} -> {} failed ({}); copying instead",
                src.display(),
                dst.display(),
                e
            );
            copy_dir_filtered(src, dst, excluded)?;
            remove_dir_best_effort(src);
            Ok(())
        }
    }
}

/// `<parent>/<name>.<suffix>` for a path with a file name.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded() -> Vec<String> {
        vec![".git".to_string()]
    }

    #[test]
    fn atomic_write_creates_parent_and_replaces_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("version.txt");

        atomic_write_file(&target, b"1.0.0").unwrap();
        atomic_write_file(&target, b"1.1.0").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "1.1.0");
        let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn copy_dir_filtered_skips_vcs_dirs_at_any_depth() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join(".git").join("objects")).unwrap();
        fs::create_dir_all(src.join("lib").join(".git")).unwrap();
        fs::write(src.join(".git").join("HEAD"), "ref").unwrap();
        fs::write(src.join("lib").join(".git").join("config"), "x").unwrap();
        fs::write(src.join("lib").join("core.dll"), "dll").unwrap();
        fs::write(src.join("app.exe"), "exe").unwrap();
        fs::write(src.join(".gitignore"), "*.log").unwrap();

        let dst = tmp.path().join("dst");
        let copied = copy_dir_filtered(&src, &dst, &excluded()).unwrap();

        assert_eq!(copied, 3);
        assert!(dst.join("app.exe").is_file());
        assert!(dst.join("lib").join("core.dll").is_file());
        assert!(dst.join(".gitignore").is_file());
        assert!(!dst.join(".git").exists());
        assert!(!dst.join("lib").join(".git").exists());
    }

    #[test]
    fn copy_dir_filtered_requires_a_source_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let err = copy_dir_filtered(&tmp.path().join("missing"), &tmp.path().join("dst"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("Source directory not found"));
    }

    #[test]
    fn move_dir_relocates_tree_and_drops_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("payload");
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::write(src.join("app.exe"), "exe").unwrap();

        let dst = tmp.path().join("install");
        move_dir(&src, &dst, &excluded()).unwrap();

        assert!(!src.exists());
        assert!(dst.join("app.exe").is_file());
        assert!(!dst.join(".git").exists());
    }

    #[test]
    fn best_effort_removal_tolerates_missing_paths() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(remove_dir_best_effort(&tmp.path().join("nope")));

        let dir = tmp.path().join("stage");
        fs::create_dir_all(dir.join("inner")).unwrap();
        assert!(remove_dir_best_effort(&dir));
        assert!(!dir.exists());
    }

    #[test]
    fn sibling_path_appends_suffix_to_name() {
        let path = Path::new("/data/app/report");
        assert_eq!(sibling_path(path, "incoming"), Path::new("/data/app/report.incoming"));
    }
}
