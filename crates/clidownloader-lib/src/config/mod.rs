mod loader;
mod model;

pub use loader::{DATACENTER_URL_ENV, ENV_PREFIX, load_config, load_config_with_env};
pub use model::{
    Config, DEFAULT_APP_PATH, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_URL_PATH, DownloadConfig, DownloadSettings, ProbeSettings,
};
