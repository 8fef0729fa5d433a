pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod retrieve;
pub mod verification;

pub use config::{Config, DownloadConfig};
pub use error::CliDownloaderError;
pub use pipeline::{Pipeline, PipelineOptions, PipelineStage, download_cli};
pub use probe::CliVersions;
