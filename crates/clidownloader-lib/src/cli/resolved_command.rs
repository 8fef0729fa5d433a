use crate::archive::ExtractOptions;
use crate::cli::args::Command;
use crate::cli::params::{DownloadParams, VersionsParams};
use crate::config::{DATACENTER_URL_ENV, load_config_with_env};
use crate::error::CliDownloaderError;
use crate::pipeline::PipelineOptions;
use config::Map;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Download(DownloadParams),
    Versions(VersionsParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, CliDownloaderError> {
    resolve_command_with_env(command, None)
}

/// Merges CLI flags over the loaded configuration. `env` replaces the process environment when given.
pub fn resolve_command_with_env(
    command: Command,
    env: Option<Map<String, String>>,
) -> Result<ResolvedCommand, CliDownloaderError> {
    match command {
        Command::Download {
            config_path,
            datacenter_url,
            url_path,
            app_path,
            ca_certificate,
            archive_sha256,
            download_timeout_secs,
            probe_timeout_secs,
            keep_archive,
            json,
        } => {
            let mut app_config = load_config_with_env(config_path.as_deref(), env)?;

            if let Some(datacenter_url) = datacenter_url {
                app_config.datacenter_url = datacenter_url;
            }
            if let Some(url_path) = url_path {
                app_config.url_path = url_path;
            }
            if let Some(app_path) = app_path {
                app_config.app_path = PathBuf::from(app_path);
            }
            if let Some(ca_certificate) = ca_certificate {
                app_config.download.ca_certificate = Some(PathBuf::from(ca_certificate));
            }
            if let Some(archive_sha256) = archive_sha256 {
                app_config.download.archive_sha256 = Some(archive_sha256);
            }
            if let Some(timeout) = download_timeout_secs {
                app_config.download.timeout_secs = timeout;
            }
            if let Some(timeout) = probe_timeout_secs {
                app_config.probe.timeout_secs = timeout;
            }

            if app_config.datacenter_url.trim().is_empty() {
                return Err(CliDownloaderError::ConfigValidation {
                    details: format!(
                        "No datacenter URL provided. Set {} or pass --datacenter-url.",
                        DATACENTER_URL_ENV
                    ),
                });
            }
            if app_config.url_path.trim().is_empty() {
                return Err(CliDownloaderError::ConfigValidation {
                    details: "URL path must not be empty.".to_string(),
                });
            }
            for (name, value) in [
                ("download timeout", app_config.download.timeout_secs),
                ("probe timeout", app_config.probe.timeout_secs),
            ] {
                if value == 0 {
                    return Err(CliDownloaderError::CliArgumentValidation {
                        details: format!("{name} must be greater than 0."),
                    });
                }
            }

            Ok(ResolvedCommand::Download(DownloadParams {
                download_config: app_config.download_config(),
                options: PipelineOptions {
                    retriever: app_config.retriever_options(),
                    extract: ExtractOptions::default(),
                    probe: app_config.probe_options(),
                    remove_archive: !keep_archive,
                },
                json,
            }))
        }
        Command::Versions {
            config_path,
            app_path,
            probe_timeout_secs,
            json,
        } => {
            let mut app_config = load_config_with_env(config_path.as_deref(), env)?;

            if let Some(app_path) = app_path {
                app_config.app_path = PathBuf::from(app_path);
            }
            if let Some(timeout) = probe_timeout_secs {
                app_config.probe.timeout_secs = timeout;
            }
            if app_config.probe.timeout_secs == 0 {
                return Err(CliDownloaderError::CliArgumentValidation {
                    details: "probe timeout must be greater than 0.".to_string(),
                });
            }

            Ok(ResolvedCommand::Versions(VersionsParams {
                app_path: app_config.app_path.clone(),
                probe: app_config.probe_options(),
                json,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn download(datacenter_url: Option<&str>) -> Command {
        Command::Download {
            config_path: None,
            datacenter_url: datacenter_url.map(str::to_string),
            url_path: None,
            app_path: None,
            ca_certificate: None,
            archive_sha256: None,
            download_timeout_secs: None,
            probe_timeout_secs: None,
            keep_archive: false,
            json: false,
        }
    }

    #[test]
    fn test_download_requires_datacenter_url() {
        let result = resolve_command_with_env(download(None), env(&[]));
        assert!(matches!(
            result,
            Err(CliDownloaderError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_download_from_environment() {
        let resolved = resolve_command_with_env(
            download(None),
            env(&[
                ("TANZU_AGENT_DATACENTER_URL", "vcenter.example.internal"),
                ("TANZU_APP_PATH", "/opt/tools"),
            ]),
        )
        .unwrap();

        let ResolvedCommand::Download(params) = resolved else {
            panic!("expected download params");
        };
        assert_eq!(
            params.download_config.datacenter_uri().unwrap(),
            "https://vcenter.example.internal/wcp/plugin/linux-amd64/vsphere-plugin.zip"
        );
        assert_eq!(params.download_config.app_path, PathBuf::from("/opt/tools"));
        assert_eq!(params.options.probe.timeout, Duration::from_secs(5));
        assert_eq!(params.options.retriever.timeout, Duration::from_secs(300));
        assert!(params.options.remove_archive);
    }

    #[test]
    fn test_flags_override_environment() {
        let command = Command::Download {
            config_path: None,
            datacenter_url: Some("flag.example.internal".to_string()),
            url_path: Some("other/plugin.zip".to_string()),
            app_path: Some("/flag/app".to_string()),
            ca_certificate: Some("/etc/ssl/internal-ca.pem".to_string()),
            archive_sha256: None,
            download_timeout_secs: Some(42),
            probe_timeout_secs: Some(7),
            keep_archive: true,
            json: true,
        };

        let resolved = resolve_command_with_env(
            command,
            env(&[
                ("TANZU_AGENT_DATACENTER_URL", "env.example.internal"),
                ("TANZU_APP_PATH", "/env/app"),
            ]),
        )
        .unwrap();

        let ResolvedCommand::Download(params) = resolved else {
            panic!("expected download params");
        };
        assert_eq!(
            params.download_config.datacenter_uri().unwrap(),
            "https://flag.example.internal/other/plugin.zip"
        );
        assert_eq!(params.download_config.app_path, PathBuf::from("/flag/app"));
        assert_eq!(
            params.options.retriever.ca_certificate,
            Some(PathBuf::from("/etc/ssl/internal-ca.pem"))
        );
        assert_eq!(params.options.retriever.timeout, Duration::from_secs(42));
        assert_eq!(params.options.probe.timeout, Duration::from_secs(7));
        assert!(!params.options.remove_archive);
        assert!(params.json);
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let command = Command::Versions {
            config_path: None,
            app_path: None,
            probe_timeout_secs: Some(0),
            json: false,
        };
        assert!(matches!(
            resolve_command_with_env(command, env(&[])),
            Err(CliDownloaderError::CliArgumentValidation { .. })
        ));
    }

    #[test]
    fn test_versions_uses_configured_app_path() {
        let command = Command::Versions {
            config_path: None,
            app_path: None,
            probe_timeout_secs: None,
            json: false,
        };

        let resolved =
            resolve_command_with_env(command, env(&[("TANZU_APP_PATH", "/srv/tools")])).unwrap();

        let ResolvedCommand::Versions(params) = resolved else {
            panic!("expected versions params");
        };
        assert_eq!(params.app_path, PathBuf::from("/srv/tools"));
    }
}
