use digest::Digest;
use sha2::Sha256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Invalid expected SHA-256 digest {digest:?}: {reason}")]
    InvalidExpectedDigest { digest: String, reason: String },

    #[error("Verification failed: expected {}, got {}",
        hex::encode(.expected),
        hex::encode(.actual)
    )]
    VerificationFailed { expected: Vec<u8>, actual: Vec<u8> },
}

/// Streams archive bytes through SHA-256 and compares the result against a pinned digest.
pub struct ArchiveDigestVerifier {
    hasher: Sha256,
    expected_digest: Vec<u8>,
}

impl ArchiveDigestVerifier {
    pub fn from_hex(expected: &str) -> Result<Self, VerificationError> {
        let expected_digest = hex::decode(expected.trim()).map_err(|e| {
            VerificationError::InvalidExpectedDigest {
                digest: expected.to_string(),
                reason: e.to_string(),
            }
        })?;
        if expected_digest.len() != <Sha256 as Digest>::output_size() {
            return Err(VerificationError::InvalidExpectedDigest {
                digest: expected.to_string(),
                reason: format!(
                    "expected {} bytes, got {}",
                    <Sha256 as Digest>::output_size(),
                    expected_digest.len()
                ),
            });
        }

        Ok(Self {
            hasher: Sha256::new(),
            expected_digest,
        })
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(&mut self.hasher, data.as_ref());
    }

    pub fn verify(self) -> Result<(), VerificationError> {
        let actual_digest = self.hasher.finalize().to_vec();

        if actual_digest == self.expected_digest {
            Ok(())
        } else {
            Err(VerificationError::VerificationFailed {
                expected: self.expected_digest,
                actual: actual_digest,
            })
        }
    }
}
