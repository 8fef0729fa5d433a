use crate::cli::DownloadParams;
use crate::error::CliDownloaderError;
use crate::pipeline::download_cli;
use crate::probe::CliVersions;
use tracing;

pub async fn run_download(params: DownloadParams) -> Result<CliVersions, CliDownloaderError> {
    let DownloadParams {
        download_config,
        options,
        json,
    } = params;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Tanzu CLI downloader is starting"
    );
    let versions = download_cli(download_config, options).await?;

    tracing::info!(version = %versions.kubectl_version, "kubectl downloaded");
    tracing::info!(
        version = %versions.kubectl_vsphere_version,
        "kubectl-vsphere downloaded"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    }
    Ok(versions)
}
