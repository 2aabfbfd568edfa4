// hoist-aio/src/extract.rs
// Handles zip archive extraction.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use hoist_common::error::{HoistError, Result};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Extracts a zip file into `target_dir` on the blocking pool. Returns the
/// number of regular files written.
pub async fn extract_zip_async(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    let archive_path = archive_path.to_path_buf();
    let target_dir = target_dir.to_path_buf();
    tokio::task::spawn_blocking(move || extract_zip_file(&archive_path, &target_dir))
        .await
        .map_err(|e| HoistError::ArchiveError(format!("ZIP extraction task failed: {e}")))?
}

pub fn extract_zip_file(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    debug!(
        "Extracting ZIP '{}' to '{}'",
        archive_path.display(),
        target_dir.display()
    );
    let file = File::open(archive_path).map_err(|e| {
        HoistError::ArchiveError(format!(
            "Failed to open archive {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    extract_zip(BufReader::new(file), target_dir)
}

/// Extracts every entry of a zip stream below `target_dir`. Entries whose
/// names would escape `target_dir` make the whole archive invalid.
pub fn extract_zip<R: Read + Seek>(reader: R, target_dir: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| HoistError::ArchiveError(format!("Failed to open ZIP: {e}")))?;

    std::fs::create_dir_all(target_dir)?;
    let mut files_written = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| HoistError::ArchiveError(format!("Failed to access ZIP entry {i}: {e}")))?;

        let relative: PathBuf = entry.enclosed_name().ok_or_else(|| {
            HoistError::ArchiveError(format!("Unsafe path in ZIP entry '{}'", entry.name()))
        })?;
        let outpath = target_dir.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| {
                HoistError::ArchiveError(format!(
                    "Failed to create ZIP dir {}: {}",
                    outpath.display(),
                    e
                ))
            })?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HoistError::ArchiveError(format!(
                    "Failed to create ZIP parent dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let mut outfile = File::create(&outpath).map_err(|e| {
            HoistError::ArchiveError(format!(
                "Failed to create ZIP file {}: {}",
                outpath.display(),
                e
            ))
        })?;
        // Truncated or corrupt entries surface here as CRC/read errors.
        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            HoistError::ArchiveError(format!(
                "Failed to write ZIP entry {}: {}",
                relative.display(),
                e
            ))
        })?;
        files_written += 1;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                if let Err(e) =
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                {
                    warn!(
                        "Failed set permissions on ZIP entry {}: {}",
                        outpath.display(),
                        e
                    );
                }
            }
        }
    }

    if files_written == 0 {
        warn!("ZIP archive contained no files");
    }
    debug!(
        "Finished ZIP extraction: {} files into {}",
        files_written,
        target_dir.display()
    );
    Ok(files_written)
}
