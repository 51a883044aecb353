//! Interfaces to the processes around the credential core.
//!
//! The core never talks to the UI, the disk, or the secure seed
//! process directly; everything goes through these traits so the
//! whole lifecycle can be driven (and tested) with in-memory doubles.

use async_trait::async_trait;

use crate::seed::Seed;

/// External secure store holding the seed of the currently unlocked
/// session. The single source of truth for "what seed is active".
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// The active seed, or `None` when no session is unlocked.
    async fn active_seed(&self) -> Option<Seed>;

    /// Replace the active seed.
    async fn set_active_seed(&self, seed: Seed) -> anyhow::Result<()>;
}

/// Encrypted persistence for the vault blob and auxiliary session
/// data. Opaque to the core beyond read/write semantics.
#[async_trait]
pub trait VaultStorage: Send + Sync {
    async fn read_vault_blob(&self) -> anyhow::Result<Vec<u8>>;

    async fn write_vault_blob(&self, blob: &[u8]) -> anyhow::Result<()>;

    /// Persist the (already hashed) salt. Called on every password
    /// change.
    async fn write_salt(&self, salt_hash: &str) -> anyhow::Result<()>;

    async fn write_history(&self, history: &[serde_json::Value]) -> anyhow::Result<()>;

    async fn write_language(&self, language: &str) -> anyhow::Result<()>;
}

/// What a verification prompt is asking the user to prove.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationKind {
    /// Re-enter the current password.
    Password,
    /// Enter the configured PIN.
    Pin,
}

/// Presents a challenge to the user and resolves to a boolean
/// verdict. Implementations own the comparison; the core only
/// consumes the answer.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn request_verification(&self, kind: VerificationKind) -> bool;
}

/// Identifier of a user-facing message. The core never formats
/// display text; localization happens on the other side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKey {
    PasswordTooShort,
    PasswordConfirmationMismatch,
}

/// Receives policy-violation messages for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, key: MessageKey);
}
