//! The active session and vault access.
//!
//! A [`Session`] owns the committed vault state for one unlocked user
//! plus handles to the secure seed store and encrypted persistence.
//! All state sits behind one async mutex; unlocks, rotations and PIN
//! mutations all take that lock, so none of them can interleave or
//! observe each other's partial state.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::MutexGuard;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::collaborator::SeedStore;
use crate::collaborator::VaultStorage;
use crate::seed::Seed;
use crate::seed::SeedDeriver;
use crate::vault::Vault;

/// Mutable per-session state, guarded by [`Session`]'s lock.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// The committed vault, present while the session is unlocked.
    pub(crate) vault: Option<Vault>,

    /// Auxiliary session data, persisted at rotation commit. Opaque
    /// to this core.
    pub(crate) history: Vec<serde_json::Value>,
    pub(crate) language: String,
}

/// One logical user session.
///
/// Created once at startup, unlocked by [`VaultAccess`], torn down
/// with [`close`](Session::close). Components receive it by `Arc`
/// instead of reaching for ambient global state.
pub struct Session {
    pub(crate) seed_store: Arc<dyn SeedStore>,
    pub(crate) storage: Arc<dyn VaultStorage>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(seed_store: Arc<dyn SeedStore>, storage: Arc<dyn VaultStorage>) -> Self {
        Self {
            seed_store,
            storage,
            state: Mutex::new(SessionState {
                language: "en".to_string(),
                ..SessionState::default()
            }),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Snapshot of the committed vault, if the session is unlocked.
    pub async fn active_vault(&self) -> Option<Vault> {
        self.lock().await.vault.clone()
    }

    pub async fn is_unlocked(&self) -> bool {
        self.lock().await.vault.is_some()
    }

    /// Record an auxiliary history entry for the next rotation commit.
    pub async fn record_history(&self, entry: serde_json::Value) {
        self.lock().await.history.push(entry);
    }

    pub async fn set_language(&self, language: impl Into<String>) {
        self.lock().await.language = language.into();
    }

    /// Tear the session down: forget the committed vault.
    ///
    /// The seed held by the external secure store is that
    /// collaborator's to retire.
    pub async fn close(&self) {
        let mut state = self.lock().await;
        if state.vault.take().is_some() {
            info!("session closed; vault dropped from memory");
        }
    }
}

/// Whether an unlock attempt commits the decrypted vault to the
/// session or only renders a verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockMode {
    /// Password verification only. Nothing is committed.
    Probe,
    /// Login. The decrypted vault becomes the session vault.
    Commit,
}

/// Decrypts the stored vault under a seed and, in commit mode, makes
/// it the active session vault.
pub struct VaultAccess {
    session: Arc<Session>,
    deriver: SeedDeriver,
}

impl VaultAccess {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            deriver: SeedDeriver::new(),
        }
    }

    /// Log in with `password`. On success the vault is committed, the
    /// validated seed is published as the active seed, and the
    /// mnemonic phrase is returned. A failed attempt leaves both the
    /// session and the secure store untouched.
    pub async fn unlock_with_password(&self, password: &str) -> Option<String> {
        let derived = self.deriver.derive(password)?;
        self.open_with_seed(&derived.seed, UnlockMode::Commit)
            .await
            .then_some(derived.phrase)
    }

    /// Check `password` against the stored vault without committing
    /// anything. Returns the derived mnemonic phrase on success, for
    /// continued use by display-on-change flows.
    pub async fn verify_password(&self, password: &str) -> Option<String> {
        let derived = self.deriver.derive(password)?;
        self.open_with_seed(&derived.seed, UnlockMode::Probe)
            .await
            .then_some(derived.phrase)
    }

    /// Re-open the vault with the seed already held by the secure
    /// store, committing it to the session.
    pub async fn unlock_with_stored_seed(&self) -> bool {
        let Some(seed) = self.session.seed_store.active_seed().await else {
            debug!("no active seed in the secure store");
            return false;
        };
        self.open_with_seed(&seed, UnlockMode::Commit).await
    }

    /// Decrypt the persisted vault blob under `seed` and validate it
    /// down to the entry level. In commit mode the vault becomes the
    /// session vault and `seed` is published as the active seed,
    /// still under the session lock so no rotation can interleave.
    ///
    /// Every failure path answers `false` and leaves the secure store
    /// untouched; callers cannot tell a wrong seed from a malformed
    /// vault.
    async fn open_with_seed(&self, seed: &Seed, mode: UnlockMode) -> bool {
        let mut state = self.session.lock().await;

        let blob = match self.session.storage.read_vault_blob().await {
            Ok(blob) => blob,
            Err(e) => {
                warn!("could not read vault blob: {e}");
                return false;
            }
        };

        let vault = match Vault::open(&blob, seed) {
            Ok(vault) => vault,
            Err(e) => {
                debug!("vault did not open: {e}");
                return false;
            }
        };

        if !vault.keychain.unlocks_with(seed) {
            debug!("vault opened but keychain entries reject the seed");
            return false;
        }

        if mode == UnlockMode::Commit {
            // Only a seed the vault has just validated may become the
            // active one. The store write is fire-and-forget: the
            // session still unlocks, stored-seed re-unlock is what
            // degrades.
            if let Err(e) = self.session.seed_store.set_active_seed(seed.clone()).await {
                warn!("could not publish the unlocking seed to the secure store: {e}");
            }
            info!(
                keypairs = vault.keychain.keypairs.len(),
                identities = vault.keychain.identities.len(),
                "vault unlocked and committed to session"
            );
            state.vault = Some(vault);
        }
        true
    }
}
