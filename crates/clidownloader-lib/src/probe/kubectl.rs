use super::command::{ProbeOptions, VersionParseError, probe_version};
use crate::error::CliDownloaderError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const KUBECTL: &str = "kubectl";
pub const KUBECTL_VSPHERE: &str = "kubectl-vsphere";

pub const KUBECTL_VERSION_ARGS: [&str; 4] = ["version", "--client=true", "-o", "json"];
pub const KUBECTL_VSPHERE_VERSION_ARGS: [&str; 1] = ["version"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliVersions {
    pub kubectl_version: String,
    pub kubectl_vsphere_version: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubectlVersionOutput {
    client_version: KubectlClientVersion,
}

#[derive(Deserialize)]
struct KubectlClientVersion {
    major: String,
    minor: String,
}

/// `"{major}.{minor}"` from `kubectl version --client=true -o json`.
///
/// Only the first JSON document is read, so warnings trailing on stderr are ignored.
pub fn parse_kubectl_version(output: &str) -> Result<String, VersionParseError> {
    let parsed = serde_json::Deserializer::from_str(output)
        .into_iter::<KubectlVersionOutput>()
        .next()
        .unwrap_or_else(|| serde_json::from_str::<KubectlVersionOutput>(output))?;

    Ok(format!(
        "{}.{}",
        parsed.client_version.major, parsed.client_version.minor
    ))
}

/// Third space-separated token of `kubectl-vsphere version`.
pub fn parse_kubectl_vsphere_version(output: &str) -> Result<String, VersionParseError> {
    let tokens: Vec<&str> = output.split(' ').collect();
    let token = tokens
        .get(2)
        .ok_or(VersionParseError::MissingToken {
            expected: 3,
            actual: tokens.len(),
        })?
        .trim()
        .trim_end_matches(',');

    if token.is_empty() {
        return Err(VersionParseError::EmptyToken);
    }
    Ok(token.to_string())
}

pub async fn probe_kubectl_version(
    app_path: &Path,
    options: &ProbeOptions,
) -> Result<String, CliDownloaderError> {
    probe_version(
        &app_path.join(KUBECTL),
        &KUBECTL_VERSION_ARGS,
        parse_kubectl_version,
        options,
    )
    .await
}

pub async fn probe_kubectl_vsphere_version(
    app_path: &Path,
    options: &ProbeOptions,
) -> Result<String, CliDownloaderError> {
    probe_version(
        &app_path.join(KUBECTL_VSPHERE),
        &KUBECTL_VSPHERE_VERSION_ARGS,
        parse_kubectl_vsphere_version,
        options,
    )
    .await
}

/// Probes both tools concurrently; either failure fails the whole probe.
pub async fn probe_cli_versions(
    app_path: &Path,
    options: &ProbeOptions,
) -> Result<CliVersions, CliDownloaderError> {
    let (kubectl_version, kubectl_vsphere_version) = tokio::try_join!(
        probe_kubectl_version(app_path, options),
        probe_kubectl_vsphere_version(app_path, options),
    )?;

    tracing::info!(version = %kubectl_version, "kubectl version");
    tracing::info!(version = %kubectl_vsphere_version, "kubectl-vsphere version");

    Ok(CliVersions {
        kubectl_version,
        kubectl_vsphere_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kubectl_version() {
        let output = r#"{"clientVersion":{"major":"1","minor":"29"}}"#;
        assert_eq!(parse_kubectl_version(output).unwrap(), "1.29");
    }

    #[test]
    fn test_parse_kubectl_version_full_output() {
        let output = r#"{
  "clientVersion": {
    "major": "1",
    "minor": "28",
    "gitVersion": "v1.28.3+vmware.wcp.1",
    "gitCommit": "f5a7f9e6b1e4b1c8d6d0d0f1e0c1c5d9a0a2f3f1",
    "gitTreeState": "clean",
    "buildDate": "2023-11-08T10:14:33Z",
    "goVersion": "go1.20.10",
    "compiler": "gc",
    "platform": "linux/amd64"
  },
  "kustomizeVersion": "v5.0.4-0.20230601165947-6ce0bf390ce3"
}
"#;
        assert_eq!(parse_kubectl_version(output).unwrap(), "1.28");
    }

    #[test]
    fn test_parse_kubectl_version_ignores_trailing_warnings() {
        let output = "{\"clientVersion\":{\"major\":\"1\",\"minor\":\"30\"}}\nWARNING: version difference\n";
        assert_eq!(parse_kubectl_version(output).unwrap(), "1.30");
    }

    #[test]
    fn test_parse_kubectl_version_rejects_malformed_output() {
        for output in [
            "",
            "Client Version: v1.29.0",
            r#"{"clientVersion":{"major":"1"}}"#,
            r#"{"serverVersion":{"major":"1","minor":"29"}}"#,
        ] {
            assert!(
                parse_kubectl_version(output).is_err(),
                "{output:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_kubectl_vsphere_version() {
        assert_eq!(
            parse_kubectl_vsphere_version("kubectl-vsphere version 3.1.0 build 12345").unwrap(),
            "3.1.0"
        );
        assert_eq!(
            parse_kubectl_vsphere_version("kubectl-vsphere version 3.1.0\n").unwrap(),
            "3.1.0"
        );
        assert_eq!(
            parse_kubectl_vsphere_version(
                "kubectl-vsphere: version 0.1.9, build 22801021, change 12150313\n"
            )
            .unwrap(),
            "0.1.9"
        );
    }

    #[test]
    fn test_parse_kubectl_vsphere_version_too_few_tokens() {
        assert!(matches!(
            parse_kubectl_vsphere_version("kubectl-vsphere version"),
            Err(VersionParseError::MissingToken {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            parse_kubectl_vsphere_version(""),
            Err(VersionParseError::MissingToken { .. })
        ));
    }

    #[test]
    fn test_parse_kubectl_vsphere_version_empty_token() {
        assert!(matches!(
            parse_kubectl_vsphere_version("kubectl-vsphere version  3.1.0"),
            Err(VersionParseError::EmptyToken)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_cli_versions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            (
                KUBECTL,
                r#"[ "$*" = "version --client=true -o json" ] || exit 1
echo '{"clientVersion":{"major":"1","minor":"29"}}'"#,
            ),
            (
                KUBECTL_VSPHERE,
                r#"[ "$*" = "version" ] || exit 1
echo 'kubectl-vsphere version 3.1.0 build 1'"#,
            ),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let versions = probe_cli_versions(dir.path(), &ProbeOptions::default())
            .await
            .unwrap();

        assert_eq!(
            versions,
            CliVersions {
                kubectl_version: "1.29".to_string(),
                kubectl_vsphere_version: "3.1.0".to_string(),
            }
        );
    }
}
