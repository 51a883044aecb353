//! The vault: keychain entries and PIN hash, persisted as one
//! encrypted blob.
//!
//! Encryption happens at two levels. The vault as a whole seals to a
//! single blob under the active seed, and every keychain entry
//! additionally carries its own sealed secret material. The session's
//! committed vault always holds sealed entries; secrets are opened
//! transiently (signing, rotation) and never persisted in cleartext.

use serde::Deserialize;
use serde::Serialize;
use zeroize::Zeroize;

use crate::cipher::DecryptError;
use crate::cipher::EncryptError;
use crate::cipher::VaultCipher;
use crate::seed::Seed;

/// Represents a failed state transition or crypto operation on an
/// entry's secret material.
#[derive(Debug, thiserror::Error)]
pub enum EntryCryptoError {
    #[error("entry secret is already decrypted")]
    NotSealed,

    #[error("entry secret is still sealed")]
    NotOpen,

    #[error(transparent)]
    Decrypt(#[from] DecryptError),

    #[error(transparent)]
    Encrypt(#[from] EncryptError),
}

/// Represents a failure to decrypt and materialize a vault blob.
///
/// A wrong seed, a corrupted blob, and a structurally invalid vault
/// are deliberately collapsed into this one type; callers must not be
/// able to tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum VaultOpenError {
    #[error(transparent)]
    Decryption(#[from] DecryptError),

    #[error("decrypted data is not a vault")]
    Malformed(#[from] serde_json::Error),

    #[error("decrypted structure has no keychain")]
    MissingKeychain,
}

/// Represents a failure to serialize and encrypt a vault.
#[derive(Debug, thiserror::Error)]
pub enum VaultSealError {
    #[error("vault serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Encryption(#[from] EncryptError),
}

/// Secret bytes of a single keychain entry, sealed under the active
/// seed while at rest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretMaterial {
    sealed: bool,
    bytes: Vec<u8>,
}

impl SecretMaterial {
    /// Seal fresh plaintext under `seed`.
    pub fn seal_new(plaintext: &[u8], seed: &Seed) -> Result<Self, EncryptError> {
        let bytes = VaultCipher::for_seed(seed).encrypt(plaintext)?;
        Ok(Self { sealed: true, bytes })
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Decrypt in place. The material must currently be sealed.
    pub fn decrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        if !self.sealed {
            return Err(EntryCryptoError::NotSealed);
        }
        let plaintext = VaultCipher::for_seed(seed).decrypt(&self.bytes)?;
        self.replace_bytes(plaintext, false);
        Ok(())
    }

    /// Re-encrypt in place. The material must currently be open.
    pub fn encrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        if self.sealed {
            return Err(EntryCryptoError::NotOpen);
        }
        let ciphertext = VaultCipher::for_seed(seed).encrypt(&self.bytes)?;
        self.replace_bytes(ciphertext, true);
        Ok(())
    }

    /// The plaintext bytes, when open.
    pub fn expose(&self) -> Option<&[u8]> {
        (!self.sealed).then_some(self.bytes.as_slice())
    }

    /// Whether `seed` decrypts this material, without mutating it.
    pub(crate) fn unlocks_with(&self, seed: &Seed) -> bool {
        self.sealed && VaultCipher::for_seed(seed).decrypt(&self.bytes).is_ok()
    }

    fn replace_bytes(&mut self, bytes: Vec<u8>, sealed: bool) {
        self.bytes.zeroize();
        self.bytes = bytes;
        self.sealed = sealed;
    }
}

impl Drop for SecretMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// A keypair entry: public half in the clear, private half sealed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeypairEntry {
    pub name: String,
    pub public_key: String,
    secret: SecretMaterial,
}

impl KeypairEntry {
    pub fn new(
        name: impl Into<String>,
        public_key: impl Into<String>,
        private_key: &[u8],
        seed: &Seed,
    ) -> Result<Self, EncryptError> {
        Ok(Self {
            name: name.into(),
            public_key: public_key.into(),
            secret: SecretMaterial::seal_new(private_key, seed)?,
        })
    }

    pub fn decrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        self.secret.decrypt(seed)
    }

    pub fn encrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        self.secret.encrypt(seed)
    }

    pub fn secret(&self) -> &SecretMaterial {
        &self.secret
    }
}

/// An identity entry with sealed personal data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityEntry {
    pub name: String,
    secret: SecretMaterial,
}

impl IdentityEntry {
    pub fn new(
        name: impl Into<String>,
        personal_data: &[u8],
        seed: &Seed,
    ) -> Result<Self, EncryptError> {
        Ok(Self {
            name: name.into(),
            secret: SecretMaterial::seal_new(personal_data, seed)?,
        })
    }

    pub fn decrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        self.secret.decrypt(seed)
    }

    pub fn encrypt(&mut self, seed: &Seed) -> Result<(), EntryCryptoError> {
        self.secret.encrypt(seed)
    }

    pub fn secret(&self) -> &SecretMaterial {
        &self.secret
    }
}

/// The mutable aggregate of keypair and identity entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keychain {
    pub keypairs: Vec<KeypairEntry>,
    pub identities: Vec<IdentityEntry>,
}

impl Keychain {
    /// Whether `seed` decrypts every entry. Mutates nothing.
    pub fn unlocks_with(&self, seed: &Seed) -> bool {
        self.keypairs
            .iter()
            .all(|keypair| keypair.secret.unlocks_with(seed))
            && self
                .identities
                .iter()
                .all(|identity| identity.secret.unlocks_with(seed))
    }

    pub fn len(&self) -> usize {
        self.keypairs.len() + self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypairs.is_empty() && self.identities.is_empty()
    }
}

/// The top-level persisted structure: keychain plus optional PIN
/// hash. Lives encrypted under the active seed while at rest.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vault {
    pub keychain: Keychain,
    pub pin: Option<String>,
}

impl Vault {
    pub fn new(keychain: Keychain) -> Self {
        Self {
            keychain,
            pin: None,
        }
    }

    pub fn pin_configured(&self) -> bool {
        self.pin.as_deref().is_some_and(|pin| !pin.is_empty())
    }

    /// Serialize and encrypt the vault under `seed`.
    pub fn seal(&self, seed: &Seed) -> Result<Vec<u8>, VaultSealError> {
        let plaintext = serde_json::to_vec(self)?;
        Ok(VaultCipher::for_seed(seed).encrypt(&plaintext)?)
    }

    /// Decrypt `blob` under `seed` and materialize the typed vault.
    ///
    /// The decrypted JSON must carry a `keychain` key; anything else
    /// is rejected as wrong-seed-or-malformed.
    pub fn open(blob: &[u8], seed: &Seed) -> Result<Self, VaultOpenError> {
        let plaintext = VaultCipher::for_seed(seed).decrypt(blob)?;
        let value: serde_json::Value = serde_json::from_slice(&plaintext)?;
        if value.get("keychain").is_none() {
            return Err(VaultOpenError::MissingKeychain);
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SEED_LEN;

    fn seed_of(byte: u8) -> Seed {
        Seed::new([byte; SEED_LEN])
    }

    fn sample_vault(seed: &Seed) -> Vault {
        let keychain = Keychain {
            keypairs: vec![
                KeypairEntry::new("hot", "PUB_K1_alpha", b"alpha-private", seed).unwrap(),
                KeypairEntry::new("cold", "PUB_K1_beta", b"beta-private", seed).unwrap(),
            ],
            identities: vec![IdentityEntry::new("main", b"{\"email\":\"a@b\"}", seed).unwrap()],
        };
        Vault::new(keychain)
    }

    #[test]
    fn secret_material_seal_open_roundtrip() {
        let seed = seed_of(7);
        let mut secret = SecretMaterial::seal_new(b"private-key", &seed).unwrap();
        assert!(secret.is_sealed());
        assert!(secret.expose().is_none());

        secret.decrypt(&seed).unwrap();
        assert_eq!(secret.expose(), Some(b"private-key".as_slice()));

        secret.encrypt(&seed).unwrap();
        assert!(secret.is_sealed());
    }

    #[test]
    fn secret_material_rejects_state_mismatch() {
        let seed = seed_of(7);
        let mut secret = SecretMaterial::seal_new(b"x", &seed).unwrap();

        assert!(matches!(
            secret.encrypt(&seed),
            Err(EntryCryptoError::NotOpen)
        ));

        secret.decrypt(&seed).unwrap();
        assert!(matches!(
            secret.decrypt(&seed),
            Err(EntryCryptoError::NotSealed)
        ));
    }

    #[test]
    fn secret_material_rejects_wrong_seed() {
        let mut secret = SecretMaterial::seal_new(b"x", &seed_of(1)).unwrap();
        assert!(matches!(
            secret.decrypt(&seed_of(2)),
            Err(EntryCryptoError::Decrypt(_))
        ));
        // The failed attempt must leave the material sealed.
        assert!(secret.is_sealed());
    }

    #[test]
    fn keychain_unlocks_with_reports_seed_match() {
        let seed = seed_of(3);
        let vault = sample_vault(&seed);
        assert!(vault.keychain.unlocks_with(&seed));
        assert!(!vault.keychain.unlocks_with(&seed_of(4)));
    }

    #[test]
    fn vault_seal_open_roundtrip() {
        let seed = seed_of(9);
        let vault = sample_vault(&seed);

        let blob = vault.seal(&seed).unwrap();
        let reopened = Vault::open(&blob, &seed).unwrap();
        assert_eq!(reopened, vault);
    }

    #[test]
    fn vault_open_with_wrong_seed_fails() {
        let blob = sample_vault(&seed_of(9)).seal(&seed_of(9)).unwrap();
        assert!(matches!(
            Vault::open(&blob, &seed_of(10)),
            Err(VaultOpenError::Decryption(_))
        ));
    }

    #[test]
    fn vault_without_keychain_key_is_rejected() {
        let seed = seed_of(9);
        let impostor = serde_json::json!({ "pin": null, "settings": {} });
        let blob = VaultCipher::for_seed(&seed)
            .encrypt(&serde_json::to_vec(&impostor).unwrap())
            .unwrap();

        assert!(matches!(
            Vault::open(&blob, &seed),
            Err(VaultOpenError::MissingKeychain)
        ));
    }

    #[test]
    fn pin_configured_treats_empty_as_absent() {
        let mut vault = Vault::default();
        assert!(!vault.pin_configured());
        vault.pin = Some(String::new());
        assert!(!vault.pin_configured());
        vault.pin = Some("hash".to_string());
        assert!(vault.pin_configured());
    }
}
