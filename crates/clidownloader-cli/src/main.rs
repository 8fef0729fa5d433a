use clidownloader_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_download, run_versions,
};
use clidownloader_lib::error::CliDownloaderError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), CliDownloaderError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;

    match command {
        ResolvedCommand::Download(params) => {
            run_download(params).await?;
        }
        ResolvedCommand::Versions(params) => {
            run_versions(params).await?;
        }
    }

    Ok(())
}
