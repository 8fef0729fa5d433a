use super::{Retrieve, RetrieverOptions};
use crate::error::CliDownloaderError;
use crate::verification::ArchiveDigestVerifier;
use eyre::WrapErr;
use std::path::PathBuf;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Accepts only absolute `https` URLs with a host.
pub fn validate_url(uri: &str) -> Result<Url, CliDownloaderError> {
    let invalid = |reason: String| CliDownloaderError::InvalidUrl {
        url: uri.to_string(),
        reason,
    };

    let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "https" {
        return Err(invalid(format!(
            "only HTTPS URLs are allowed, got scheme {:?}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(url)
}

/// Downloads over a dedicated client so relaxed TLS settings never leak into other connections.
pub struct HttpsRetriever {
    client: reqwest::Client,
    options: RetrieverOptions,
}

impl HttpsRetriever {
    pub fn new(options: RetrieverOptions) -> Result<Self, CliDownloaderError> {
        if let Some(expected) = &options.archive_sha256 {
            ArchiveDigestVerifier::from_hex(expected).map_err(|e| {
                CliDownloaderError::ConfigValidation {
                    details: e.to_string(),
                }
            })?;
        }

        let mut builder = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(concat!("clidownloader/", env!("CARGO_PKG_VERSION")));

        builder = match &options.ca_certificate {
            Some(ca_path) => {
                let pem = std::fs::read(ca_path).map_err(|e| {
                    CliDownloaderError::ConfigValidation {
                        details: format!(
                            "Failed to read CA certificate {}: {}",
                            ca_path.display(),
                            e
                        ),
                    }
                })?;
                let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    CliDownloaderError::ConfigValidation {
                        details: format!(
                            "Invalid CA certificate {}: {}",
                            ca_path.display(),
                            e
                        ),
                    }
                })?;
                tracing::debug!(ca = %ca_path.display(), "Trusting internal CA");
                builder.add_root_certificate(certificate)
            }
            None => {
                tracing::debug!("No CA certificate configured, skipping certificate verification");
                builder.danger_accept_invalid_certs(true)
            }
        };

        let client = builder
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self { client, options })
    }

    pub fn options(&self) -> &RetrieverOptions {
        &self.options
    }

    /// Streams `url` to the download path. The scheme has already been validated.
    async fn fetch(&self, url: Url) -> Result<PathBuf, CliDownloaderError> {
        let download_path = &self.options.download_path;
        let download_failed = |reason: String| CliDownloaderError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        tracing::info!(url = %url, output = %download_path.display(), "Downloading");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| download_failed(format!("{:#}", eyre::Report::new(e))))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_failed(format!("bad status: {}", status)));
        }

        if let Some(parent) = download_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                download_failed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let file = tokio::fs::File::create(download_path).await.map_err(|e| {
            download_failed(format!(
                "Failed to create {}: {}",
                download_path.display(),
                e
            ))
        })?;
        let mut writer = BufWriter::new(file);

        let mut verifier = self
            .options
            .archive_sha256
            .as_deref()
            .map(ArchiveDigestVerifier::from_hex)
            .transpose()
            .map_err(|source| CliDownloaderError::ChecksumMismatch {
                url: url.to_string(),
                source,
            })?;

        let mut total: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_failed(format!("{:#}", eyre::Report::new(e))))?
        {
            if let Some(verifier) = verifier.as_mut() {
                verifier.update(&chunk);
            }
            writer.write_all(&chunk).await.map_err(|e| {
                download_failed(format!(
                    "Failed to write to {}: {}",
                    download_path.display(),
                    e
                ))
            })?;
            total += chunk.len() as u64;
        }

        writer.flush().await.map_err(|e| {
            download_failed(format!(
                "Failed to flush {}: {}",
                download_path.display(),
                e
            ))
        })?;

        if let Some(verifier) = verifier {
            verifier
                .verify()
                .map_err(|source| CliDownloaderError::ChecksumMismatch {
                    url: url.to_string(),
                    source,
                })?;
            tracing::debug!(url = %url, "Archive digest verified");
        }

        tracing::info!(url = %url, output = %download_path.display(), bytes = total, "Downloaded");
        Ok(download_path.clone())
    }
}

impl Retrieve for HttpsRetriever {
    async fn retrieve(&self, uri: &str) -> Result<PathBuf, CliDownloaderError> {
        let url = validate_url(uri)?;
        self.fetch(url).await
    }
}
