mod https;
#[cfg(test)]
pub(crate) mod test_server;
mod types;

pub use https::{HttpsRetriever, validate_url};
pub use types::{ARCHIVE_FILE_NAME, RetrieverOptions};

use crate::error::CliDownloaderError;
use std::future::Future;
use std::path::PathBuf;

/// Fetches the archive behind `uri` into a local file and returns its path.
pub trait Retrieve {
    fn retrieve(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<PathBuf, CliDownloaderError>> + Send;
}
