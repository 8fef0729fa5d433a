mod args;
mod download;
mod params;
mod resolved_command;
mod versions;

pub use args::{Args, Cli, Command, init_tracing, parse_args};
pub use download::run_download;
pub use params::{DownloadParams, VersionsParams};
pub use resolved_command::{ResolvedCommand, resolve_command, resolve_command_with_env};
pub use versions::run_versions;
