mod archive_digest;

pub use archive_digest::{ArchiveDigestVerifier, VerificationError};
