//! Vault behaviour end to end: round trips, key isolation, and tamper
//! detection through the `CredentialVault` trait the broker consumes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use searchgate_core::{CredentialVault, VaultError};
use searchgate_vault::{
    generate_master_key, CredentialCipher, EncryptionVault, MasterKeyProvider, StaticKeyProvider,
    KEY_SIZE,
};

fn vault_with_key(key: [u8; KEY_SIZE]) -> EncryptionVault {
    EncryptionVault::new(&StaticKeyProvider::new(key)).unwrap()
}

#[tokio::test]
async fn test_round_trip_through_the_broker_facing_trait() {
    let vault = vault_with_key([1u8; KEY_SIZE]);
    let ciphertext = vault.encrypt("admin-password").unwrap();

    let dyn_vault: &dyn CredentialVault = &vault;
    let plaintext = dyn_vault.decrypt(&ciphertext).await.unwrap();

    assert_eq!(plaintext.as_str(), "admin-password");
}

#[tokio::test]
async fn test_ciphertext_is_stable_across_vault_instances_with_same_key() {
    let ciphertext = vault_with_key([2u8; KEY_SIZE]).encrypt("secret").unwrap();

    // A new vault holding the same master key can decrypt it.
    let other = vault_with_key([2u8; KEY_SIZE]);
    assert_eq!(other.decrypt(&ciphertext).await.unwrap().as_str(), "secret");
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let ciphertext = vault_with_key([3u8; KEY_SIZE]).encrypt("secret").unwrap();

    let err = vault_with_key([4u8; KEY_SIZE])
        .decrypt(&ciphertext)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Decrypt));
}

#[tokio::test]
async fn test_malformed_ciphertext_is_rejected_before_crypto() {
    let vault = vault_with_key([5u8; KEY_SIZE]);

    for bad in ["???", "", &BASE64.encode([0u8; 4])] {
        let err = vault.decrypt(bad).await.unwrap_err();
        assert!(matches!(err, VaultError::Malformed), "input {bad:?}");
    }
}

#[tokio::test]
async fn test_bit_flip_is_detected() {
    let vault = vault_with_key([6u8; KEY_SIZE]);
    let ciphertext = vault.encrypt("secret").unwrap();

    let mut blob = BASE64.decode(&ciphertext).unwrap();
    blob[15] ^= 0x80;

    let err = vault.decrypt(&BASE64.encode(blob)).await.unwrap_err();
    assert!(matches!(err, VaultError::Decrypt));
}

#[test]
fn test_generated_keys_are_unique() {
    let a = generate_master_key().unwrap();
    let b = generate_master_key().unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_cipher_accepts_provider_key() {
    let provider = StaticKeyProvider::new([9u8; KEY_SIZE]);
    let key = provider.get_or_create_key().unwrap();
    assert!(CredentialCipher::new(&key).is_ok());
}

#[tokio::test]
async fn test_error_text_never_contains_secret_material() {
    let vault = vault_with_key([8u8; KEY_SIZE]);
    let ciphertext = vault.encrypt("super-secret-password").unwrap();

    let err = vault_with_key([7u8; KEY_SIZE])
        .decrypt(&ciphertext)
        .await
        .unwrap_err();

    let rendered = format!("{err} {err:?}");
    assert!(!rendered.contains("super-secret-password"));
    assert!(!rendered.contains(&ciphertext));
}
