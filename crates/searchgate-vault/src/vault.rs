//! Default `CredentialVault` implementation backed by the field cipher.

use async_trait::async_trait;
use searchgate_core::{CredentialVault, VaultError};
use zeroize::Zeroizing;

use crate::crypto::CredentialCipher;
use crate::keychain::MasterKeyProvider;

/// Vault that decrypts stored credentials with a locally-held master key.
///
/// Plaintext is never cached; each `decrypt` performs the full
/// authenticated decryption.
pub struct EncryptionVault {
    cipher: CredentialCipher,
}

impl EncryptionVault {
    /// Build a vault from a master key provider.
    pub fn new(keys: &dyn MasterKeyProvider) -> anyhow::Result<Self> {
        let key = keys.get_or_create_key()?;
        Ok(Self {
            cipher: CredentialCipher::new(&key)?,
        })
    }

    /// Build a vault around an existing cipher.
    pub fn with_cipher(cipher: CredentialCipher) -> Self {
        Self { cipher }
    }

    /// Encrypt helper for provisioning paths and tests; the broker itself
    /// only ever decrypts.
    pub fn encrypt(&self, plaintext: &str) -> anyhow::Result<String> {
        self.cipher.encrypt(plaintext)
    }
}

#[async_trait]
impl CredentialVault for EncryptionVault {
    async fn decrypt(&self, ciphertext: &str) -> Result<Zeroizing<String>, VaultError> {
        self.cipher.decrypt(ciphertext)
    }
}
