use crate::error::CliDownloaderError;
use crate::probe::ProbeOptions;
use crate::retrieve::RetrieverOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL_PATH: &str = "wcp/plugin/linux-amd64/vsphere-plugin.zip";
pub const DEFAULT_APP_PATH: &str = "/app";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

// Unknown fields are tolerated: every TANZU_* variable in the environment lands here.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub datacenter_url: String,
    pub url_path: String,
    pub app_path: PathBuf,
    #[serde(default)]
    pub download: DownloadSettings,
    #[serde(default)]
    pub probe: ProbeSettings,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadSettings {
    /// Upper bound for the whole HTTPS request, body included.
    pub timeout_secs: u64,
    /// PEM bundle of the datacenter's internal CA. Without it certificate checks are skipped.
    #[serde(default)]
    pub ca_certificate: Option<PathBuf>,
    /// Hex SHA-256 the downloaded archive must match.
    #[serde(default)]
    pub archive_sha256: Option<String>,
    /// Overrides the temporary location the archive is written to.
    #[serde(default)]
    pub archive_path: Option<PathBuf>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            ca_certificate: None,
            archive_sha256: None,
            archive_path: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            datacenter_url: self.datacenter_url.clone(),
            url_path: self.url_path.clone(),
            app_path: self.app_path.clone(),
        }
    }

    pub fn retriever_options(&self) -> RetrieverOptions {
        let mut options = RetrieverOptions {
            timeout: Duration::from_secs(self.download.timeout_secs),
            ca_certificate: self.download.ca_certificate.clone(),
            archive_sha256: self.download.archive_sha256.clone(),
            ..RetrieverOptions::default()
        };
        if let Some(archive_path) = &self.download.archive_path {
            options.download_path = archive_path.clone();
        }
        options
    }

    pub fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_secs(self.probe.timeout_secs),
        }
    }
}

/// Where the archive comes from and where its tools are installed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadConfig {
    pub datacenter_url: String,
    pub url_path: String,
    pub app_path: PathBuf,
}

impl DownloadConfig {
    pub fn new(
        datacenter_url: impl Into<String>,
        url_path: impl Into<String>,
        app_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            datacenter_url: datacenter_url.into(),
            url_path: url_path.into(),
            app_path: app_path.into(),
        }
    }

    /// Builds `https://{datacenter_url}/{url_path}`.
    pub fn datacenter_uri(&self) -> Result<String, CliDownloaderError> {
        let datacenter_url = self.datacenter_url.trim().trim_end_matches('/');
        let url_path = self.url_path.trim().trim_start_matches('/');
        if datacenter_url.is_empty() || url_path.is_empty() {
            return Err(CliDownloaderError::InvalidUrl {
                url: format!("https://{}/{}", datacenter_url, url_path),
                reason: "datacenter URL and URL path must both be set".to_string(),
            });
        }
        Ok(format!("https://{}/{}", datacenter_url, url_path))
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }
}
