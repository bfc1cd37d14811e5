//! Field-level encryption for data source credentials.
//!
//! AES-256-GCM with a random nonce per encryption. The stored form is
//! `base64(nonce || ciphertext || tag)`.

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use searchgate_core::VaultError;
use zeroize::Zeroizing;

/// Size of the master key (32 bytes = 256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of the nonce (12 bytes for AES-GCM).
const NONCE_SIZE: usize = 12;

/// Cipher for credential fields.
pub struct CredentialCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl CredentialCipher {
    /// Create a cipher with the given master key.
    pub fn new(master_key: &[u8; KEY_SIZE]) -> Result<Self> {
        let unbound = UnboundKey::new(&AES_256_GCM, master_key)
            .map_err(|_| anyhow::anyhow!("failed to create encryption key"))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a plaintext credential.
    ///
    /// The broker never encrypts; this exists for provisioning paths and
    /// tests.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| anyhow::anyhow!("failed to generate nonce"))?;

        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| anyhow::anyhow!("encryption failed"))?;

        let mut blob = nonce_bytes.to_vec();
        blob.extend_from_slice(&in_out);

        Ok(BASE64.encode(blob))
    }

    /// Decrypt a `base64(nonce || ciphertext || tag)` blob.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Zeroizing<String>, VaultError> {
        let blob = BASE64.decode(ciphertext).map_err(|_| VaultError::Malformed)?;

        if blob.len() < NONCE_SIZE + AES_256_GCM.tag_len() {
            return Err(VaultError::Malformed);
        }

        let (nonce_bytes, encrypted) = blob.split_at(NONCE_SIZE);
        let nonce_array: [u8; NONCE_SIZE] =
            nonce_bytes.try_into().map_err(|_| VaultError::Malformed)?;
        let nonce = Nonce::assume_unique_for_key(nonce_array);

        let mut in_out = encrypted.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Decrypt)?;

        let text = std::str::from_utf8(plaintext)
            .map_err(|_| VaultError::InvalidUtf8)?
            .to_owned();

        Ok(Zeroizing::new(text))
    }
}

/// Generate a random master key.
pub fn generate_master_key() -> Result<[u8; KEY_SIZE]> {
    let rng = SystemRandom::new();
    let mut key = [0u8; KEY_SIZE];
    rng.fill(&mut key)
        .map_err(|_| anyhow::anyhow!("failed to generate random key"))?;
    Ok(key)
}
