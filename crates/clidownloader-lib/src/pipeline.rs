use crate::archive::{
    ExtractOptions, SAFE_DIR_MODE, UnpackMode, create_dir_restricted,
    unpack_selected_with_options,
};
use crate::config::DownloadConfig;
use crate::error::CliDownloaderError;
use crate::probe::{CliVersions, KUBECTL, KUBECTL_VSPHERE, ProbeOptions, probe_cli_versions};
use crate::retrieve::{HttpsRetriever, Retrieve, RetrieverOptions};
use eyre::WrapErr;
use std::fmt;
use std::path::{Path, PathBuf};

/// Tools pulled out of the vSphere plugin archive.
pub const SELECTED_TOOLS: [&str; 2] = [KUBECTL, KUBECTL_VSPHERE];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Validated,
    Retrieved,
    Unpacked,
    Probed,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Validated => "validated",
            PipelineStage::Retrieved => "retrieved",
            PipelineStage::Unpacked => "unpacked",
            PipelineStage::Probed => "probed",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PipelineOptions {
    pub retriever: RetrieverOptions,
    pub extract: ExtractOptions,
    pub probe: ProbeOptions,
    /// Remove the downloaded archive once its tools are extracted.
    pub remove_archive: bool,
}

/// Validate, retrieve, unpack and probe, in that order and without retries.
pub struct Pipeline<R> {
    config: DownloadConfig,
    retriever: R,
    extract: ExtractOptions,
    probe: ProbeOptions,
    remove_archive: bool,
    stage: PipelineStage,
}

impl Pipeline<HttpsRetriever> {
    pub fn new(
        config: DownloadConfig,
        options: PipelineOptions,
    ) -> Result<Self, CliDownloaderError> {
        let retriever = HttpsRetriever::new(options.retriever)?;
        Ok(Self::with_retriever(
            config,
            retriever,
            options.extract,
            options.probe,
        )
        .remove_archive(options.remove_archive))
    }
}

impl<R: Retrieve> Pipeline<R> {
    pub fn with_retriever(
        config: DownloadConfig,
        retriever: R,
        extract: ExtractOptions,
        probe: ProbeOptions,
    ) -> Self {
        Self {
            config,
            retriever,
            extract,
            probe,
            remove_archive: false,
            stage: PipelineStage::Idle,
        }
    }

    pub fn remove_archive(mut self, remove_archive: bool) -> Self {
        self.remove_archive = remove_archive;
        self
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    fn advance(&mut self, stage: PipelineStage) {
        tracing::debug!(from = %self.stage, to = %stage, "Pipeline stage");
        self.stage = stage;
    }

    /// Runs every stage. Any error moves the pipeline to [`PipelineStage::Failed`] and is returned as-is.
    pub async fn run(&mut self) -> Result<CliVersions, CliDownloaderError> {
        match self.run_stages().await {
            Ok(versions) => {
                self.advance(PipelineStage::Done);
                Ok(versions)
            }
            Err(err) => {
                tracing::error!(stage = %self.stage, "Pipeline failed: {}", err);
                self.advance(PipelineStage::Failed);
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<CliVersions, CliDownloaderError> {
        let (uri, app_path) = self.validate()?;
        self.advance(PipelineStage::Validated);

        let archive_path = self.retriever.retrieve(&uri).await?;
        self.advance(PipelineStage::Retrieved);

        self.unpack(&archive_path, &app_path).await?;
        self.advance(PipelineStage::Unpacked);

        let versions = probe_cli_versions(&app_path, &self.probe).await?;
        self.advance(PipelineStage::Probed);

        Ok(versions)
    }

    fn validate(&self) -> Result<(String, PathBuf), CliDownloaderError> {
        let uri = self.config.datacenter_uri()?;
        crate::retrieve::validate_url(&uri)?;

        let app_path = std::path::absolute(self.config.app_path()).map_err(|_| {
            CliDownloaderError::InvalidDestination {
                path: self.config.app_path().to_path_buf(),
            }
        })?;
        create_dir_restricted(&app_path, SAFE_DIR_MODE).map_err(|e| {
            CliDownloaderError::ExtractionFailed {
                entry: String::new(),
                path: app_path.clone(),
                reason: format!("Failed to create app directory: {}", e),
            }
        })?;

        tracing::info!(url = %uri, app_path = %app_path.display(), "Configuration validated");
        Ok((uri, app_path))
    }

    async fn unpack(&self, archive_path: &Path, app_path: &Path) -> Result<(), CliDownloaderError> {
        let archive = archive_path.to_path_buf();
        let destination = app_path.to_path_buf();
        let options = self.extract;

        let written = tokio::task::spawn_blocking(move || {
            unpack_selected_with_options(
                &archive,
                &destination,
                &SELECTED_TOOLS,
                UnpackMode::Flatten,
                &options,
            )
        })
        .await
        .wrap_err("Extraction task panicked")??;

        for tool in SELECTED_TOOLS {
            if !written.iter().any(|path| path.ends_with(tool)) {
                return Err(CliDownloaderError::ExtractionFailed {
                    entry: tool.to_string(),
                    path: app_path.join(tool),
                    reason: format!("{} not found in {}", tool, archive_path.display()),
                });
            }
        }

        if self.remove_archive {
            if let Err(e) = tokio::fs::remove_file(archive_path).await {
                tracing::warn!(path = %archive_path.display(), "Failed to remove archive: {}", e);
            }
        }

        Ok(())
    }
}

/// Downloads the plugin archive described by `config`, installs its tools and reports their versions.
pub async fn download_cli(
    config: DownloadConfig,
    options: PipelineOptions,
) -> Result<CliVersions, CliDownloaderError> {
    Pipeline::new(config, options)?.run().await
}
