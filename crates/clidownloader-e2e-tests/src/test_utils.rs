use clidownloader_lib::archive::ExtractOptions;
use clidownloader_lib::config::{DEFAULT_URL_PATH, DownloadConfig};
use clidownloader_lib::error::CliDownloaderError;
use clidownloader_lib::pipeline::Pipeline;
use clidownloader_lib::probe::ProbeOptions;
use clidownloader_lib::retrieve::{Retrieve, validate_url};
use eyre::Result;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const TEST_DATACENTER: &str = "vcenter.example.internal";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Shell script that answers `kubectl version --client=true -o json`.
pub fn kubectl_script(major: &str, minor: &str) -> String {
    format!(
        r#"#!/bin/sh
[ "$*" = "version --client=true -o json" ] || {{ echo "unexpected args: $*" >&2; exit 1; }}
cat <<'JSON'
{{"clientVersion":{{"major":"{major}","minor":"{minor}","gitVersion":"v{major}.{minor}.0"}},"kustomizeVersion":"v5.0.4"}}
JSON
"#
    )
}

/// Shell script that answers `kubectl-vsphere version`.
pub fn kubectl_vsphere_script(version: &str) -> String {
    format!(
        r#"#!/bin/sh
[ "$*" = "version" ] || {{ echo "unexpected args: $*" >&2; exit 1; }}
echo "kubectl-vsphere version {version} build 22801021"
"#
    )
}

/// Builds an in-memory zip. Names ending in `/` become directory entries.
pub fn build_zip(entries: &[(&str, &[u8], u32)]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, mode) in entries {
        let options = SimpleFileOptions::default().unix_permissions(*mode);
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(data)?;
        }
    }
    Ok(zip.finish()?.into_inner())
}

/// The layout shipped by vSphere: both tools below nested directories.
pub fn plugin_archive(kubectl_mode: u32, kubectl_vsphere_mode: u32) -> Result<Vec<u8>> {
    let kubectl = kubectl_script("1", "29");
    let kubectl_vsphere = kubectl_vsphere_script("3.1.0");
    build_zip(&[
        ("wcp/", b"", 0o755),
        ("wcp/kubectl", kubectl.as_bytes(), kubectl_mode),
        ("bin/", b"", 0o755),
        ("bin/kubectl-vsphere", kubectl_vsphere.as_bytes(), kubectl_vsphere_mode),
        ("README.txt", b"not selected", 0o644),
    ])
}

/// Serves a prepared archive from memory instead of the network.
pub struct FixtureRetriever {
    archive: Vec<u8>,
    download_path: PathBuf,
    requested: Mutex<Vec<String>>,
}

impl FixtureRetriever {
    pub fn new(archive: Vec<u8>, download_path: impl Into<PathBuf>) -> Self {
        Self {
            archive,
            download_path: download_path.into(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }
}

impl Retrieve for FixtureRetriever {
    async fn retrieve(&self, uri: &str) -> Result<PathBuf, CliDownloaderError> {
        validate_url(uri)?;
        self.requested.lock().unwrap().push(uri.to_string());
        tokio::fs::write(&self.download_path, &self.archive).await?;
        Ok(self.download_path.clone())
    }
}

/// Answers every request with a fixed non-success HTTP status.
pub struct StatusRetriever {
    pub status: &'static str,
}

impl Retrieve for StatusRetriever {
    async fn retrieve(&self, uri: &str) -> Result<PathBuf, CliDownloaderError> {
        validate_url(uri)?;
        Err(CliDownloaderError::DownloadFailed {
            url: uri.to_string(),
            reason: format!("bad status: {}", self.status),
        })
    }
}

pub fn create_test_config(app_path: &Path) -> DownloadConfig {
    DownloadConfig::new(TEST_DATACENTER, DEFAULT_URL_PATH, app_path)
}

pub fn create_test_pipeline<R: Retrieve>(app_path: &Path, retriever: R) -> Pipeline<R> {
    Pipeline::with_retriever(
        create_test_config(app_path),
        retriever,
        ExtractOptions::default(),
        ProbeOptions::default(),
    )
}

pub fn setup_test_environment() -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    std::fs::create_dir_all(temp_dir.path().join("tmp"))?;
    Ok(temp_dir)
}
