//! Master key storage.
//!
//! The default provider keeps the key in the platform-native secure store:
//! Credential Manager on Windows, Keychain on macOS, Secret Service on
//! Linux. Deployments that provision keys externally can inject a
//! `StaticKeyProvider` instead.

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::{generate_master_key, KEY_SIZE};

/// Keychain service name the master key is registered under.
const KEYCHAIN_SERVICE: &str = "searchgate";

/// Key name for the master encryption key.
const MASTER_KEY_NAME: &str = "master-encryption-key";

/// Trait for providing the master encryption key.
pub trait MasterKeyProvider: Send + Sync {
    /// Get the master key, creating one if it doesn't exist.
    fn get_or_create_key(&self) -> Result<Zeroizing<[u8; KEY_SIZE]>>;

    /// Check if a master key exists.
    fn key_exists(&self) -> bool;

    /// Delete the master key (for testing or reset).
    fn delete_key(&self) -> Result<()>;
}

/// OS keychain-backed master key provider.
pub struct KeychainKeyProvider {
    entry: Entry,
}

impl KeychainKeyProvider {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(KEYCHAIN_SERVICE, MASTER_KEY_NAME)
            .context("failed to create keychain entry")?;

        Ok(Self { entry })
    }

}

impl MasterKeyProvider for KeychainKeyProvider {
    fn get_or_create_key(&self) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        match self.entry.get_password() {
            Ok(hex_key) => {
                debug!("retrieved existing master key from keychain");
                let key_bytes = hex::decode(&hex_key).context("invalid key format in keychain")?;

                if key_bytes.len() != KEY_SIZE {
                    anyhow::bail!(
                        "invalid key size in keychain: expected {}, got {}",
                        KEY_SIZE,
                        key_bytes.len()
                    );
                }

                let mut key = Zeroizing::new([0u8; KEY_SIZE]);
                key.copy_from_slice(&key_bytes);
                Ok(key)
            }
            Err(keyring::Error::NoEntry) => {
                info!("no master key found, generating new key");
                let key = generate_master_key()?;

                self.entry
                    .set_password(&hex::encode(key))
                    .context("failed to store master key in keychain")?;

                Ok(Zeroizing::new(key))
            }
            Err(e) => {
                warn!("keychain error: {:?}", e);
                Err(anyhow::anyhow!("failed to access keychain: {}", e))
            }
        }
    }

    fn key_exists(&self) -> bool {
        self.entry.get_password().is_ok()
    }

    fn delete_key(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) => {
                info!("master key deleted from keychain");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("no key to delete");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("failed to delete key from keychain: {}", e)),
        }
    }
}

/// Fixed-key provider for tests and externally-provisioned deployments.
pub struct StaticKeyProvider {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl StaticKeyProvider {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }
}

impl MasterKeyProvider for StaticKeyProvider {
    fn get_or_create_key(&self) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        Ok(self.key.clone())
    }

    fn key_exists(&self) -> bool {
        true
    }

    fn delete_key(&self) -> Result<()> {
        Ok(())
    }
}
