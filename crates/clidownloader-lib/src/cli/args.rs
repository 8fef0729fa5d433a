use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Download {
        config_path: Option<String>,
        datacenter_url: Option<String>,
        url_path: Option<String>,
        app_path: Option<String>,
        ca_certificate: Option<String>,
        archive_sha256: Option<String>,
        download_timeout_secs: Option<u64>,
        probe_timeout_secs: Option<u64>,
        keep_archive: bool,
        json: bool,
    },
    Versions {
        config_path: Option<String>,
        app_path: Option<String>,
        probe_timeout_secs: Option<u64>,
        json: bool,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "clidownloader",
    version,
    about = "Download kubectl and kubectl-vsphere from a vSphere datacenter and report their versions"
)]
pub struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download the vSphere plugin archive, install its tools and report their versions
    Download {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional config file; TANZU_* environment variables take precedence"
        )]
        config: Option<String>,

        #[arg(
            short = 'd',
            long = "datacenter-url",
            value_name = "HOST",
            help = "Overrides the datacenter host (TANZU_AGENT_DATACENTER_URL)"
        )]
        datacenter_url: Option<String>,

        #[arg(
            long = "url-path",
            value_name = "PATH",
            help = "Overrides the archive path on the datacenter (TANZU_URL_PATH)"
        )]
        url_path: Option<String>,

        #[arg(
            short = 'o',
            long = "app-path",
            value_name = "DIR",
            help = "Overrides the directory the tools are installed into (TANZU_APP_PATH)"
        )]
        app_path: Option<String>,

        #[arg(
            long = "ca-certificate",
            value_name = "FILE",
            help = "PEM CA to trust for the datacenter instead of skipping certificate verification"
        )]
        ca_certificate: Option<String>,

        #[arg(
            long = "archive-sha256",
            value_name = "HEX",
            help = "Expected SHA-256 of the downloaded archive"
        )]
        archive_sha256: Option<String>,

        #[arg(
            long = "download-timeout",
            value_name = "SECONDS",
            help = "Overall timeout for the archive download"
        )]
        download_timeout: Option<u64>,

        #[arg(
            long = "probe-timeout",
            value_name = "SECONDS",
            help = "Timeout for each version probe"
        )]
        probe_timeout: Option<u64>,

        #[arg(long = "keep-archive", help = "Keep the downloaded archive after extraction")]
        keep_archive: bool,

        #[arg(long = "json", help = "Print the installed versions as JSON")]
        json: bool,
    },

    /// Report the versions of already installed tools
    Versions {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Optional config file for the app path fallback"
        )]
        config: Option<String>,

        #[arg(
            short = 'o',
            long = "app-path",
            value_name = "DIR",
            help = "Overrides the directory the tools are installed in (TANZU_APP_PATH)"
        )]
        app_path: Option<String>,

        #[arg(
            long = "probe-timeout",
            value_name = "SECONDS",
            help = "Timeout for each version probe"
        )]
        probe_timeout: Option<u64>,

        #[arg(long = "json", help = "Print the installed versions as JSON")]
        json: bool,
    },
}

impl From<Cli> for Args {
    fn from(cli: Cli) -> Self {
        let log_level = match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let command = match cli.command {
            CliCommand::Download {
                config,
                datacenter_url,
                url_path,
                app_path,
                ca_certificate,
                archive_sha256,
                download_timeout,
                probe_timeout,
                keep_archive,
                json,
            } => Command::Download {
                config_path: config,
                datacenter_url,
                url_path,
                app_path,
                ca_certificate,
                archive_sha256,
                download_timeout_secs: download_timeout,
                probe_timeout_secs: probe_timeout,
                keep_archive,
                json,
            },
            CliCommand::Versions {
                config,
                app_path,
                probe_timeout,
                json,
            } => Command::Versions {
                config_path: config,
                app_path,
                probe_timeout_secs: probe_timeout,
                json,
            },
        };

        Args { command, log_level }
    }
}

pub fn init_tracing(log_level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap())
                .add_directive("reqwest=info".parse().unwrap()),
        )
        .init();
}

pub fn parse_args() -> Args {
    let args = Args::from(Cli::parse());
    init_tracing(args.log_level);
    args
}
