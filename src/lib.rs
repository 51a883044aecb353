//! Seed-derived credential lifecycle for a single-user wallet.
//!
//! This crate converts a human-chosen password into a deterministic
//! cryptographic seed, decrypts and re-encrypts the keychain vault
//! that seed protects, rotates every secret atomically on password
//! change, and gates sensitive operations behind an optional PIN.
//!
//! The UI, the persistent store, and the external secure seed process
//! are collaborators, injected through the traits in
//! [`collaborator`]; this crate contains the protocol, not the I/O.
//!
//! ## Overview
//!
//! ```text
//! password ──SeedDeriver──▶ (mnemonic, Seed)
//!                              │
//!               VaultAccess    │    KeychainRotation
//!            (unlock/verify) ◀─┴─▶ (atomic password change)
//!                              │
//!                        Session (one lock,
//!                        one committed Vault)
//!                              │
//!                           PinGate
//! ```

#![deny(clippy::shadow_unrelated)]

pub mod cipher;
pub mod collaborator;
pub mod hasher;
pub mod mnemonic;
pub mod pin;
pub mod policy;
pub mod rotation;
pub mod seed;
pub mod session;
pub mod vault;

pub use collaborator::MessageKey;
pub use collaborator::Notifier;
pub use collaborator::SeedStore;
pub use collaborator::VaultStorage;
pub use collaborator::VerificationKind;
pub use collaborator::Verifier;
pub use pin::PinGate;
pub use policy::PasswordPolicy;
pub use rotation::KeychainRotation;
pub use rotation::RotationError;
pub use seed::DerivedSeed;
pub use seed::Seed;
pub use seed::SeedDeriver;
pub use session::Session;
pub use session::VaultAccess;
pub use vault::IdentityEntry;
pub use vault::Keychain;
pub use vault::KeypairEntry;
pub use vault::Vault;
