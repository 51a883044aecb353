//! The PIN gate: a seed-independent secondary secret.
//!
//! The PIN protects sensitive UI actions from someone with access to
//! an already-unlocked session; it never touches the seed or any
//! entry's encryption key. It is stored inside the vault as an
//! unsalted quick hash.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::collaborator::VerificationKind;
use crate::collaborator::Verifier;
use crate::hasher;
use crate::session::Session;

/// How long a verification prompt may stay open before it counts as
/// declined.
pub const VERIFICATION_PROMPT_TIMEOUT: Duration = Duration::from_secs(90);

/// Sets, clears and checks the session PIN.
pub struct PinGate {
    session: Arc<Session>,
    verifier: Arc<dyn Verifier>,
}

impl PinGate {
    pub fn new(session: Arc<Session>, verifier: Arc<dyn Verifier>) -> Self {
        Self { session, verifier }
    }

    /// Set `pin` (or clear it when `None`/empty), optionally guarded
    /// by a password re-entry prompt.
    ///
    /// Returns `None` without mutating anything when verification is
    /// declined, times out, or no session vault is loaded and sealed
    /// under an active seed.
    pub async fn set_pin(&self, pin: Option<&str>, require_verification: bool) -> Option<()> {
        if require_verification && !self.prompt(VerificationKind::Password).await {
            debug!("PIN change rejected: password verification declined");
            return None;
        }

        let mut state = self.session.lock().await;
        let seed = self.session.seed_store.active_seed().await?;

        // Work on a copy and swap only after persistence succeeds,
        // same discipline as the keychain rotation.
        let mut vault = state.vault.clone()?;
        vault.pin = pin.filter(|pin| !pin.is_empty()).map(hasher::quick_hash);

        // Persist under the unchanged active seed. Entry encryption
        // keys are untouched.
        let blob = match vault.seal(&seed) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("could not seal vault after PIN change: {e}");
                return None;
            }
        };
        if let Err(e) = self.session.storage.write_vault_blob(&blob).await {
            warn!("could not persist vault after PIN change: {e}");
            return None;
        }

        state.vault = Some(vault);
        Some(())
    }

    /// Check the PIN gate before a sensitive action.
    ///
    /// `true` immediately when no PIN is configured; otherwise
    /// exactly the verdict of the PIN-entry prompt.
    pub async fn verify_pin(&self) -> bool {
        let configured = self
            .session
            .active_vault()
            .await
            .is_some_and(|vault| vault.pin_configured());
        if !configured {
            return true;
        }
        self.prompt(VerificationKind::Pin).await
    }

    async fn prompt(&self, kind: VerificationKind) -> bool {
        match tokio::time::timeout(
            VERIFICATION_PROMPT_TIMEOUT,
            self.verifier.request_verification(kind),
        )
        .await
        {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!("verification prompt timed out; treating as declined");
                false
            }
        }
    }
}
