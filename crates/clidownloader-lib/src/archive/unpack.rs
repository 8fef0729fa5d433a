use super::entry::{ArchiveEntry, ExtractOptions, base_name};
use super::extract::{extract_entry, flattened_destination, hierarchical_destination};
use crate::error::CliDownloaderError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnpackMode {
    /// Write every selected entry directly under the destination directory.
    #[default]
    Flatten,
    /// Keep the archive's internal directories below the destination directory.
    Hierarchical,
}

pub fn unpack_selected(
    archive_path: &Path,
    destination_dir: &Path,
    selector_names: &[&str],
) -> Result<Vec<PathBuf>, CliDownloaderError> {
    unpack_selected_with_options(
        archive_path,
        destination_dir,
        selector_names,
        UnpackMode::Flatten,
        &ExtractOptions::default(),
    )
}

/// Extracts every entry whose base filename is one of `selector_names`.
///
/// Returns the written paths in archive order. The first failing entry aborts the rest.
pub fn unpack_selected_with_options(
    archive_path: &Path,
    destination_dir: &Path,
    selector_names: &[&str],
    mode: UnpackMode,
    options: &ExtractOptions,
) -> Result<Vec<PathBuf>, CliDownloaderError> {
    let open_failed = |reason: String| CliDownloaderError::ArchiveOpenFailed {
        path: archive_path.to_path_buf(),
        reason,
    };

    let file = File::open(archive_path).map_err(|e| open_failed(e.to_string()))?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| open_failed(e.to_string()))?;

    tracing::debug!(
        archive = %archive_path.display(),
        entries = archive.len(),
        "Opened archive"
    );

    let mut written = Vec::new();
    for index in 0..archive.len() {
        // Unselected entries are matched by central-directory name only and never decoded.
        let selected = archive
            .name_for_index(index)
            .and_then(base_name)
            .is_some_and(|name| selector_names.contains(&name));
        if !selected {
            tracing::trace!(index, "Skipping unselected entry");
            continue;
        }

        let mut zip_file = archive
            .by_index(index)
            .map_err(|e| open_failed(format!("Failed to read entry {}: {}", index, e)))?;

        let entry = ArchiveEntry {
            name: zip_file.name().to_string(),
            is_dir: zip_file.is_dir(),
            mode: zip_file.unix_mode(),
            size: zip_file.size(),
        };

        let destination = match mode {
            UnpackMode::Flatten => flattened_destination(destination_dir, &entry)?,
            UnpackMode::Hierarchical => hierarchical_destination(destination_dir, &entry.name)?,
        };

        extract_entry(&entry, &mut zip_file, &destination, options)?;
        tracing::info!(entry = %entry.name, path = %destination.display(), "Extracted");
        written.push(destination);
    }

    Ok(written)
}
