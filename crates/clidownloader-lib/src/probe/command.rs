use crate::config::DEFAULT_PROBE_TIMEOUT_SECS;
use crate::error::CliDownloaderError;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS);

#[derive(Clone, Copy, Debug)]
pub struct ProbeOptions {
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

#[derive(Error, Debug)]
pub enum VersionParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected at least {expected} space-separated tokens, got {actual}")]
    MissingToken { expected: usize, actual: usize },

    #[error("version token is empty")]
    EmptyToken,
}

/// Fails unless `path` is a file with the owner-execute bit set.
pub fn ensure_owner_executable(path: &Path) -> Result<(), CliDownloaderError> {
    let metadata = std::fs::metadata(path).map_err(|e| CliDownloaderError::NotExecutable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !metadata.is_file() {
        return Err(CliDownloaderError::NotExecutable {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o100 == 0 {
            return Err(CliDownloaderError::NotExecutable {
                path: path.to_path_buf(),
                reason: format!(
                    "owner execute bit is not set (mode {:o})",
                    metadata.permissions().mode() & 0o7777
                ),
            });
        }
    }

    Ok(())
}

const SPAWN_BUSY_RETRIES: u32 = 10;
const SPAWN_BUSY_BACKOFF: Duration = Duration::from_millis(20);

/// Spawns `command`, retrying while the executable is still open for writing elsewhere (`ETXTBSY`).
async fn spawn_when_ready(command: &mut Command) -> std::io::Result<Child> {
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Err(e) if e.kind() == ErrorKind::ExecutableFileBusy && attempt < SPAWN_BUSY_RETRIES => {
                attempt += 1;
                tracing::debug!(attempt, "Executable busy, retrying spawn");
                tokio::time::sleep(SPAWN_BUSY_BACKOFF * attempt).await;
            }
            result => return result,
        }
    }
}

/// Runs `executable` with `args` and extracts a version from its combined output.
///
/// The child is killed once `options.timeout` elapses. Standard output comes before
/// standard error in the text handed to `parse`.
pub async fn probe_version<F>(
    executable: &Path,
    args: &[&str],
    parse: F,
    options: &ProbeOptions,
) -> Result<String, CliDownloaderError>
where
    F: FnOnce(&str) -> Result<String, VersionParseError>,
{
    ensure_owner_executable(executable)?;

    tracing::debug!(cmd = %executable.display(), ?args, "Executing");
    let mut command = Command::new(executable);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let child = spawn_when_ready(&mut command)
        .await
        .map_err(|e| CliDownloaderError::NotExecutable {
            path: executable.to_path_buf(),
            reason: format!("failed to spawn: {}", e),
        })?;

    // Dropping the pending future drops the child, which kills it.
    let output = match tokio::time::timeout(options.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| CliDownloaderError::ProbeFailed {
            path: executable.to_path_buf(),
            status: "unknown".to_string(),
            output: e.to_string(),
        })?,
        Err(_) => {
            return Err(CliDownloaderError::Timeout {
                path: executable.to_path_buf(),
                timeout: options.timeout,
            });
        }
    };

    let status = output.status;
    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);
    let combined = String::from_utf8_lossy(&combined);

    if !status.success() {
        return Err(CliDownloaderError::ProbeFailed {
            path: executable.to_path_buf(),
            status: status.to_string(),
            output: combined.trim().to_string(),
        });
    }

    let version = parse(&combined).map_err(|e| CliDownloaderError::VersionParseFailed {
        path: executable.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::debug!(cmd = %executable.display(), version = %version, "Version found");
    Ok(version)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn write_script(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn first_line(output: &str) -> Result<String, VersionParseError> {
        output
            .lines()
            .next()
            .map(str::to_string)
            .ok_or(VersionParseError::EmptyToken)
    }

    #[tokio::test]
    async fn test_probe_version_passes_args_and_parses_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "tool", r#"echo "args:$*""#, 0o755);

        let version = probe_version(
            &script,
            &["version", "--short"],
            first_line,
            &ProbeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(version, "args:version --short");
    }

    #[tokio::test]
    async fn test_probe_version_combines_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "tool", "echo out\necho err >&2", 0o755);

        let combined = probe_version(
            &script,
            &[],
            |output| Ok(output.to_string()),
            &ProbeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(combined, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_probe_version_requires_owner_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "tool", "echo 1.0", 0o644);

        let result =
            probe_version(&script, &[], first_line, &ProbeOptions::default()).await;
        assert!(matches!(
            result,
            Err(CliDownloaderError::NotExecutable { .. })
        ));

        // Group and world execute do not count.
        let script = write_script(dir.path(), "tool2", "echo 1.0", 0o655);
        let result =
            probe_version(&script, &[], first_line, &ProbeOptions::default()).await;
        assert!(matches!(
            result,
            Err(CliDownloaderError::NotExecutable { .. })
        ));
    }

    #[tokio::test]
    async fn test_probe_version_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = probe_version(
            &dir.path().join("missing"),
            &[],
            first_line,
            &ProbeOptions::default(),
        )
        .await;
        assert!(matches!(
            result,
            Err(CliDownloaderError::NotExecutable { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_probe_version_waits_for_busy_executable() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "tool", "echo 2.0", 0o755);

        // An open write handle makes exec fail with ETXTBSY until it is closed.
        let writer = std::fs::OpenOptions::new().write(true).open(&script).unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(writer);
        });

        let version = probe_version(&script, &[], first_line, &ProbeOptions::default())
            .await
            .unwrap();

        assert_eq!(version, "2.0");
        release.await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_version_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "slow", "sleep 10\necho 1.0", 0o755);
        let options = ProbeOptions {
            timeout: Duration::from_millis(300),
        };

        let started = std::time::Instant::now();
        let result = probe_version(&script, &[], first_line, &options).await;

        assert!(matches!(result, Err(CliDownloaderError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_probe_version_reports_failed_exit() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "broken", "echo boom >&2\nexit 3", 0o755);

        let result =
            probe_version(&script, &[], first_line, &ProbeOptions::default()).await;

        match result {
            Err(CliDownloaderError::ProbeFailed { output, .. }) => assert_eq!(output, "boom"),
            other => panic!("expected ProbeFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_version_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "quiet", "true", 0o755);

        let result =
            probe_version(&script, &[], first_line, &ProbeOptions::default()).await;
        assert!(matches!(
            result,
            Err(CliDownloaderError::VersionParseFailed { .. })
        ));
    }

    #[test]
    fn test_default_timeout_is_five_seconds() {
        assert_eq!(ProbeOptions::default().timeout, Duration::from_secs(5));
    }
}
