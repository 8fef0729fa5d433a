mod command;
mod kubectl;

pub use command::{
    DEFAULT_PROBE_TIMEOUT, ProbeOptions, VersionParseError, ensure_owner_executable,
    probe_version,
};
pub use kubectl::{
    CliVersions, KUBECTL, KUBECTL_VERSION_ARGS, KUBECTL_VSPHERE, KUBECTL_VSPHERE_VERSION_ARGS,
    parse_kubectl_version, parse_kubectl_vsphere_version, probe_cli_versions,
    probe_kubectl_version, probe_kubectl_vsphere_version,
};
