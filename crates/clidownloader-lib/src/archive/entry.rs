/// Largest number of bytes written for a single entry (100 MiB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
/// Owner rwx, group r-x, nothing for others.
pub const SAFE_DIR_MODE: u32 = 0o750;
/// Used when the archive carries no unix permissions for an entry.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Metadata of a single record inside a zip archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name as stored in the archive, possibly with internal path segments
    pub name: String,
    pub is_dir: bool,
    /// Unix permission bits recorded by the archiver, if any
    pub mode: Option<u32>,
    /// Declared decompressed size; never trusted for bounding writes
    pub size: u64,
}

impl ArchiveEntry {
    pub fn base_name(&self) -> Option<&str> {
        base_name(&self.name)
    }

    pub fn is_symlink(&self) -> bool {
        self.mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK)
    }

    /// Permission bits for the extracted file, with file type and setuid/setgid/sticky bits stripped.
    pub fn file_mode(&self) -> u32 {
        self.mode
            .map(|mode| mode & 0o777)
            .unwrap_or(DEFAULT_FILE_MODE)
    }
}

/// Last path segment of an archive entry name.
///
/// Both separators are honoured since archives built on Windows may use `\`.
pub fn base_name(name: &str) -> Option<&str> {
    name.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
}

#[derive(Clone, Copy, Debug)]
pub struct ExtractOptions {
    pub max_file_size: u64,
    pub dir_mode: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            dir_mode: SAFE_DIR_MODE,
        }
    }
}
