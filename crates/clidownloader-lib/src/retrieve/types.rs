use crate::config::DEFAULT_DOWNLOAD_TIMEOUT_SECS;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed name of the downloaded archive inside the temporary directory.
pub const ARCHIVE_FILE_NAME: &str = "vsphere-plugin.zip";

#[derive(Clone, Debug)]
pub struct RetrieverOptions {
    /// Where the archive is written; never derived from the request
    pub download_path: PathBuf,
    pub timeout: Duration,
    /// Trust this PEM CA instead of skipping certificate verification
    pub ca_certificate: Option<PathBuf>,
    pub archive_sha256: Option<String>,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            download_path: std::env::temp_dir().join(ARCHIVE_FILE_NAME),
            timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            ca_certificate: None,
            archive_sha256: None,
        }
    }
}
