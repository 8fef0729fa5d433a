use crate::cli::VersionsParams;
use crate::error::CliDownloaderError;
use crate::probe::{CliVersions, probe_cli_versions};
use tracing;

pub async fn run_versions(params: VersionsParams) -> Result<CliVersions, CliDownloaderError> {
    let VersionsParams {
        app_path,
        probe,
        json,
    } = params;

    tracing::info!("Probing installed tools in {}", app_path.display());
    let app_path = std::path::absolute(&app_path)?;
    let versions = probe_cli_versions(&app_path, &probe).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    }
    Ok(versions)
}
