//! Credential vault boundary - an opaque decrypt capability.

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

/// Failures of the decrypt capability.
///
/// Variants never carry plaintext or ciphertext content.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Ciphertext was not valid base64 or is too short to hold a nonce and
    /// authentication tag.
    #[error("ciphertext is malformed")]
    Malformed,

    /// Authenticated decryption failed: wrong key or corrupted data.
    #[error("decryption failed")]
    Decrypt,

    /// Decrypted bytes were not valid UTF-8.
    #[error("decrypted credential is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// On-demand decryption of stored credentials.
///
/// Implementations must not cache plaintext across calls and must not log
/// input or output. Callers must not hold the plaintext beyond a single
/// options-build step.
#[async_trait]
pub trait CredentialVault: Send + Sync {
    async fn decrypt(&self, ciphertext: &str) -> Result<Zeroizing<String>, VaultError>;
}
