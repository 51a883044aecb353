//! The active seed: the root of all vault encryption.
//!
//! A [`Seed`] is 64 bytes of BIP-39 seed material, derived from a
//! mnemonic phrase. It lives only in volatile memory (or in the
//! external secure store, see [`SeedStore`](crate::collaborator::SeedStore)) and is zeroed on drop.

use std::fmt;

use aead::Key;
use aes_gcm::Aes256Gcm;
use sha3::digest::ExtendableOutput;
use sha3::digest::Update;
use sha3::Shake256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::mnemonic;

/// Byte length of the seed material produced by mnemonic-to-seed
/// derivation.
pub const SEED_LEN: usize = 64;

/// Symmetric key material derived from a mnemonic phrase.
///
/// Exactly one seed is "active" at a time; the external
/// [`SeedStore`](crate::collaborator::SeedStore) is the source of truth for which one that is.
#[derive(Clone)]
pub struct Seed(Zeroizing<[u8; SEED_LEN]>);

impl Seed {
    pub fn new(bytes: [u8; SEED_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Wrap a byte slice as a seed. Returns `None` unless the slice
    /// is exactly [`SEED_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SEED_LEN] = bytes.try_into().ok()?;
        Some(Self::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Derive the AES-256 vault encryption key from the seed with
    /// SHAKE-256.
    pub(crate) fn encryption_key(&self) -> Key<Aes256Gcm> {
        let mut hasher = Shake256::default();
        hasher.update(self.0.as_ref());

        let mut key = [0u8; 32];
        hasher.finalize_xof_into(&mut key);
        key.into()
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Eq for Seed {}

// The seed must never leak through logs.
impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(..)")
    }
}

/// A freshly derived `(mnemonic, seed)` pair.
#[derive(Clone, Debug)]
pub struct DerivedSeed {
    /// The recovery phrase the seed was derived from. When the user
    /// supplied an existing phrase as their password, this is that
    /// phrase verbatim.
    pub phrase: String,
    pub seed: Seed,
}

/// Turns a password (or an existing mnemonic phrase) into a
/// `(mnemonic, seed)` pair.
///
/// Derivation is pure: publishing a seed to the secure store is a
/// commit-time decision of the caller, made only once the vault has
/// validated under the derived seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeedDeriver;

impl SeedDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Derive a seed from `password`.
    ///
    /// A password of [`mnemonic::WORD_THRESHOLD`] or more whitespace
    /// separated tokens is treated as an existing recovery phrase;
    /// anything shorter is stretched into the entropy of a fresh
    /// 12-word phrase. Both paths are deterministic, so the same
    /// password always reproduces the same seed.
    ///
    /// Returns `None` on any derivation failure (invalid phrase).
    /// Callers must treat this as definitive, not retry.
    pub fn derive(&self, password: &str) -> Option<DerivedSeed> {
        if mnemonic::looks_like_phrase(password) {
            match mnemonic::seed_from_phrase(password) {
                Ok(derived) => Some(derived),
                Err(e) => {
                    debug!("seed derivation from supplied phrase failed: {e}");
                    None
                }
            }
        } else {
            Some(mnemonic::generate(password))
        }
    }
}
