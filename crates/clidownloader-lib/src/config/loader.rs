use super::Config;
use super::model::{
    DEFAULT_APP_PATH, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_URL_PATH,
};
use crate::error::CliDownloaderError;
use config::{Config as ConfigBuilder, Environment, Map};

pub const ENV_PREFIX: &str = "TANZU";
pub const DATACENTER_URL_ENV: &str = "TANZU_AGENT_DATACENTER_URL";

pub fn load_config(config_path: Option<&str>) -> Result<Config, CliDownloaderError> {
    load_config_with_env(config_path, None)
}

/// Loads defaults, then the optional config file, then `TANZU_*` variables.
///
/// `env` replaces the process environment when given.
pub fn load_config_with_env(
    config_path: Option<&str>,
    env: Option<Map<String, String>>,
) -> Result<Config, CliDownloaderError> {
    let datacenter_url = match &env {
        Some(vars) => vars.get(DATACENTER_URL_ENV).cloned(),
        None => std::env::var(DATACENTER_URL_ENV).ok(),
    };

    let mut builder = ConfigBuilder::builder()
        .set_default("url_path", DEFAULT_URL_PATH)?
        .set_default("app_path", DEFAULT_APP_PATH)?
        .set_default("download.timeout_secs", DEFAULT_DOWNLOAD_TIMEOUT_SECS)?
        .set_default("probe.timeout_secs", DEFAULT_PROBE_TIMEOUT_SECS)?;

    if let Some(config_path) = config_path {
        builder = builder.add_source(config::File::with_name(config_path));
    }

    let config_builder = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        )
        .set_override_option("datacenter_url", datacenter_url)?
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
