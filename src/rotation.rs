//! Password change: atomic re-encryption of the keychain.
//!
//! The rotation walks three phases, `DerivingNewSeed`,
//! `RotatingEntries`, `Committing`, and is all-or-nothing: entries
//! are re-encrypted on a deep copy of the session keychain, and the
//! copy replaces the committed vault only after every entry and every
//! storage write has succeeded. Any failure discards the copy; the
//! previously committed vault and the active seed stay authoritative.
//!
//! The session lock is held across the whole operation, so no unlock
//! or second rotation can interleave.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::hasher;
use crate::seed::SeedDeriver;
use crate::session::Session;
use crate::vault::EntryCryptoError;
use crate::vault::VaultSealError;

/// Length of the random token hashed into the stored salt.
const SALT_TOKEN_LEN: usize = 32;

/// The phase a rotation was in when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPhase {
    DerivingNewSeed,
    RotatingEntries,
    Committing,
}

impl fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DerivingNewSeed => write!(f, "seed derivation"),
            Self::RotatingEntries => write!(f, "entry re-encryption"),
            Self::Committing => write!(f, "commit"),
        }
    }
}

/// Why a password change failed. In every case the committed vault is
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("no active seed in the secure store; unlock the vault first")]
    NoActiveSession,

    #[error("no vault is loaded in the current session")]
    NoVaultLoaded,

    #[error("could not derive a seed from the new password")]
    DerivationFailed,

    #[error("keychain entry `{name}` failed during {phase}")]
    EntryRotation {
        name: String,
        phase: RotationPhase,
        #[source]
        source: EntryCryptoError,
    },

    #[error("could not seal the rotated vault")]
    Seal(#[from] VaultSealError),

    #[error("storage write failed during {phase}")]
    Storage {
        phase: RotationPhase,
        #[source]
        source: anyhow::Error,
    },
}

/// Re-encrypts the whole keychain from the current seed to one
/// derived from a new password.
pub struct KeychainRotation {
    session: Arc<Session>,
    deriver: SeedDeriver,
}

impl KeychainRotation {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            deriver: SeedDeriver::new(),
        }
    }

    /// Change the vault password to `new_password`.
    ///
    /// Returns the new mnemonic phrase on success. On any error the
    /// committed vault, the persisted blob and the active seed are
    /// exactly what they were before the call; only the salt may
    /// already have been replaced (a salt alone grants no vault
    /// access).
    pub async fn change_password(&self, new_password: &str) -> Result<String, RotationError> {
        let mut state = self.session.lock().await;

        let old_seed = self
            .session
            .seed_store
            .active_seed()
            .await
            .ok_or(RotationError::NoActiveSession)?;

        // Deep copy; the committed vault stays untouched until commit.
        let mut vault = state.vault.clone().ok_or(RotationError::NoVaultLoaded)?;

        // Phase 1: new salt, new seed. The salt is replaced eagerly,
        // matching the storage collaborator's expectation that it
        // changes on every password-change attempt.
        debug!("rotation phase: {}", RotationPhase::DerivingNewSeed);
        let salt_hash = hasher::quick_hash(&hasher::random_token(SALT_TOKEN_LEN));
        self.session
            .storage
            .write_salt(&salt_hash)
            .await
            .map_err(|source| RotationError::Storage {
                phase: RotationPhase::DerivingNewSeed,
                source,
            })?;

        // The new seed stays out of the secure store until commit so
        // a failed rotation cannot leave a seed that matches no
        // vault.
        let derived = self
            .deriver
            .derive(new_password)
            .ok_or(RotationError::DerivationFailed)?;
        let new_seed = derived.seed;

        // Phase 2: re-encrypt every entry on the working copy,
        // keypairs first, then identities.
        debug!("rotation phase: {}", RotationPhase::RotatingEntries);
        let phase = RotationPhase::RotatingEntries;
        for keypair in vault.keychain.keypairs.iter_mut() {
            keypair
                .decrypt(&old_seed)
                .and_then(|()| keypair.encrypt(&new_seed))
                .map_err(|source| RotationError::EntryRotation {
                    name: keypair.name.clone(),
                    phase,
                    source,
                })?;
        }
        for identity in vault.keychain.identities.iter_mut() {
            identity
                .decrypt(&old_seed)
                .and_then(|()| identity.encrypt(&new_seed))
                .map_err(|source| RotationError::EntryRotation {
                    name: identity.name.clone(),
                    phase,
                    source,
                })?;
        }

        // Phase 3: persist the rotated vault, publish the new seed,
        // swap the committed state. The blob is sealed first so a
        // seal failure costs nothing.
        debug!("rotation phase: {}", RotationPhase::Committing);
        let blob = vault.seal(&new_seed)?;
        self.session
            .seed_store
            .set_active_seed(new_seed)
            .await
            .map_err(|source| RotationError::Storage {
                phase: RotationPhase::Committing,
                source,
            })?;
        if let Err(source) = self.session.storage.write_vault_blob(&blob).await {
            // Undo the seed publication so the store keeps matching
            // the still-authoritative old vault.
            if let Err(e) = self.session.seed_store.set_active_seed(old_seed).await {
                warn!("could not restore the previous active seed: {e}");
            }
            return Err(RotationError::Storage {
                phase: RotationPhase::Committing,
                source,
            });
        }

        let rotated = vault.keychain.len();
        state.vault = Some(vault);

        // Auxiliary session data; failures here do not undo the
        // rotation.
        if let Err(e) = self.session.storage.write_history(&state.history).await {
            warn!("could not persist session history after rotation: {e}");
        }
        if let Err(e) = self.session.storage.write_language(&state.language).await {
            warn!("could not persist language after rotation: {e}");
        }

        info!(entries = rotated, "keychain rotated to new seed");
        Ok(derived.phrase)
    }
}
