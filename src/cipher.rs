//! AES-256-GCM authenticated encryption of vault data under a seed.
//!
//! Both the vault blob and each keychain entry's secret material go
//! through this cipher. The nonce is prefixed to the ciphertext, so a
//! sealed blob is `nonce(12) || ciphertext+tag`.

use aead::Aead;
use aead::KeyInit;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use rand::Rng;

use crate::seed::Seed;

/// Byte length of the AES-GCM nonce prefixed to every sealed blob.
pub const NONCE_LEN: usize = 12;

/// Represents a vault decryption error.
///
/// Wrong seed and corrupted blob are indistinguishable here; GCM
/// authentication fails identically for both.
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("invalid input to decrypt. blob is missing the nonce prefix")]
    MissingNonce,

    #[error("decryption failed")]
    DecryptionFailed(#[from] aead::Error),
}

/// Represents a vault encryption error.
#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error("encryption failed")]
    EncryptionFailed(#[from] aead::Error),
}

/// Symmetric encrypt/decrypt of arbitrary bytes under a [`Seed`].
pub struct VaultCipher {
    cipher: Aes256Gcm,
}

impl VaultCipher {
    pub fn for_seed(seed: &Seed) -> Self {
        Self {
            cipher: Aes256Gcm::new(&seed.encryption_key()),
        }
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce);
        nonce
    }

    /// Encrypt `plaintext`, returning `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptError> {
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self.cipher.encrypt(nonce, plaintext)?;
        Ok([nonce_bytes.as_slice(), &ciphertext].concat())
    }

    /// Decrypt a `nonce || ciphertext` blob produced by
    /// [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, DecryptError> {
        let (nonce_bytes, ciphertext) = match blob.len() > NONCE_LEN {
            true => blob.split_at(NONCE_LEN),
            false => return Err(DecryptError::MissingNonce),
        };
        let nonce = Nonce::from_slice(nonce_bytes);

        Ok(self.cipher.decrypt(nonce, ciphertext)?)
    }
}
