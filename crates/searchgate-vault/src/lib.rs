//! # Searchgate Vault
//!
//! Credential decryption for data source descriptors:
//!
//! - `crypto` - AES-256-GCM field cipher over base64 blobs
//! - `keychain` - master key storage in the OS keychain
//! - `vault` - the `CredentialVault` implementation the broker consumes

pub mod crypto;
pub mod keychain;
pub mod vault;

pub use crypto::{generate_master_key, CredentialCipher, KEY_SIZE};
pub use keychain::{KeychainKeyProvider, MasterKeyProvider, StaticKeyProvider};
pub use vault::EncryptionVault;
