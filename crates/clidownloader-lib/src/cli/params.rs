use crate::config::DownloadConfig;
use crate::pipeline::PipelineOptions;
use crate::probe::ProbeOptions;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DownloadParams {
    pub download_config: DownloadConfig,
    pub options: PipelineOptions,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct VersionsParams {
    pub app_path: PathBuf,
    pub probe: ProbeOptions,
    pub json: bool,
}
