use super::entry::{ArchiveEntry, ExtractOptions};
use crate::error::CliDownloaderError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

/// `dir/basename(entry)`, discarding any directories stored in the archive.
pub fn flattened_destination(
    dir: &Path,
    entry: &ArchiveEntry,
) -> Result<PathBuf, CliDownloaderError> {
    match entry.base_name() {
        Some(base) if base != "." && base != ".." => Ok(dir.join(base)),
        _ => Err(CliDownloaderError::PathTraversal {
            entry: entry.name.clone(),
            root: dir.to_path_buf(),
        }),
    }
}

/// `root/name`, rejected unless the lexically cleaned path stays strictly inside `root`.
pub fn hierarchical_destination(root: &Path, name: &str) -> Result<PathBuf, CliDownloaderError> {
    let clean_root = clean_path(root);
    let resolved = clean_path(&clean_root.join(name));

    if resolved == clean_root || !resolved.starts_with(&clean_root) {
        return Err(CliDownloaderError::PathTraversal {
            entry: name.to_string(),
            root: root.to_path_buf(),
        });
    }
    Ok(resolved)
}

fn clean_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}

pub(crate) fn create_dir_restricted(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

fn open_destination(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)
}

/// Writes one entry's decompressed bytes to `destination`.
///
/// At most `options.max_file_size` bytes are written. An entry holding more than
/// that fails with [`CliDownloaderError::SizeLimitExceeded`] and the partial file is removed.
/// Symbolic link entries are rejected with [`CliDownloaderError::ExtractionFailed`].
pub fn extract_entry<R: Read>(
    entry: &ArchiveEntry,
    reader: &mut R,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<(), CliDownloaderError> {
    if !destination.is_absolute() {
        return Err(CliDownloaderError::InvalidDestination {
            path: destination.to_path_buf(),
        });
    }

    let extraction_failed = |reason: String| CliDownloaderError::ExtractionFailed {
        entry: entry.name.clone(),
        path: destination.to_path_buf(),
        reason,
    };

    // Only regular files and directories are ever written.
    if entry.is_symlink() {
        return Err(extraction_failed(
            "symbolic link entries are not extracted".to_string(),
        ));
    }

    if entry.is_dir {
        tracing::debug!(entry = %entry.name, path = %destination.display(), "Creating directory");
        create_dir_restricted(destination, options.dir_mode)
            .map_err(|e| extraction_failed(format!("Failed to create directory: {}", e)))?;
        return Ok(());
    }

    if let Some(parent) = destination.parent() {
        create_dir_restricted(parent, options.dir_mode).map_err(|e| {
            extraction_failed(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    tracing::debug!(
        entry = %entry.name,
        path = %destination.display(),
        declared_size = entry.size,
        "Extracting"
    );

    let mode = entry.file_mode();
    let mut file = open_destination(destination, mode)
        .map_err(|e| extraction_failed(format!("Failed to open destination: {}", e)))?;

    let written = io::copy(&mut reader.by_ref().take(options.max_file_size), &mut file)
        .map_err(|e| extraction_failed(format!("Failed to copy data: {}", e)))?;

    let mut overflow = [0u8; 1];
    let exceeded = written == options.max_file_size
        && reader
            .read(&mut overflow)
            .map_err(|e| extraction_failed(format!("Failed to read data: {}", e)))?
            > 0;

    if exceeded {
        drop(file);
        if let Err(e) = fs::remove_file(destination) {
            tracing::warn!(path = %destination.display(), "Failed to remove oversized file: {}", e);
        }
        return Err(CliDownloaderError::SizeLimitExceeded {
            entry: entry.name.clone(),
            limit: options.max_file_size,
        });
    }

    file.flush()
        .map_err(|e| extraction_failed(format!("Failed to flush: {}", e)))?;

    // The open mode only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| extraction_failed(format!("Failed to set permissions: {}", e)))?;
    }

    Ok(())
}
