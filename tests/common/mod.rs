//! In-memory collaborator doubles for driving the credential core.

// Each integration test binary uses its own subset of these doubles.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use seedvault::MessageKey;
use seedvault::Notifier;
use seedvault::Seed;
use seedvault::SeedStore;
use seedvault::VaultStorage;
use seedvault::VerificationKind;
use seedvault::Verifier;

/// Secure-store double holding the active seed in memory.
#[derive(Default)]
pub struct MemorySeedStore {
    seed: Mutex<Option<Seed>>,
    pub fail_writes: AtomicBool,
}

impl MemorySeedStore {
    pub fn with_seed(seed: Seed) -> Self {
        Self {
            seed: Mutex::new(Some(seed)),
            fail_writes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl SeedStore for MemorySeedStore {
    async fn active_seed(&self) -> Option<Seed> {
        self.seed.lock().unwrap().clone()
    }

    async fn set_active_seed(&self, seed: Seed) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("secure store unavailable"));
        }
        *self.seed.lock().unwrap() = Some(seed);
        Ok(())
    }
}

/// Persistence double keeping the blob and auxiliary writes in memory.
#[derive(Default)]
pub struct MemoryVaultStorage {
    pub blob: Mutex<Option<Vec<u8>>>,
    pub salt_hashes: Mutex<Vec<String>>,
    pub history: Mutex<Option<Vec<serde_json::Value>>>,
    pub language: Mutex<Option<String>>,
    pub fail_blob_writes: AtomicBool,
}

impl MemoryVaultStorage {
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
            ..Self::default()
        }
    }

    pub fn stored_blob(&self) -> Option<Vec<u8>> {
        self.blob.lock().unwrap().clone()
    }
}

#[async_trait]
impl VaultStorage for MemoryVaultStorage {
    async fn read_vault_blob(&self) -> anyhow::Result<Vec<u8>> {
        self.blob
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no vault on disk"))
    }

    async fn write_vault_blob(&self, blob: &[u8]) -> anyhow::Result<()> {
        if self.fail_blob_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        *self.blob.lock().unwrap() = Some(blob.to_vec());
        Ok(())
    }

    async fn write_salt(&self, salt_hash: &str) -> anyhow::Result<()> {
        self.salt_hashes.lock().unwrap().push(salt_hash.to_string());
        Ok(())
    }

    async fn write_history(&self, history: &[serde_json::Value]) -> anyhow::Result<()> {
        *self.history.lock().unwrap() = Some(history.to_vec());
        Ok(())
    }

    async fn write_language(&self, language: &str) -> anyhow::Result<()> {
        *self.language.lock().unwrap() = Some(language.to_string());
        Ok(())
    }
}

/// Verifier double answering prompts from a scripted queue.
///
/// An exhausted queue declines, so a test that expects no prompt at
/// all can assert via [`prompts_seen`](Self::prompts_seen).
#[derive(Default)]
pub struct ScriptedVerifier {
    verdicts: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<VerificationKind>>,
}

impl ScriptedVerifier {
    pub fn answering(verdicts: impl IntoIterator<Item = bool>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts_seen(&self) -> Vec<VerificationKind> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn request_verification(&self, kind: VerificationKind) -> bool {
        self.prompts.lock().unwrap().push(kind);
        self.verdicts.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Verifier double whose prompt never resolves, for timeout tests.
pub struct UnresponsiveVerifier;

#[async_trait]
impl Verifier for UnresponsiveVerifier {
    async fn request_verification(&self, _kind: VerificationKind) -> bool {
        std::future::pending().await
    }
}

/// Notifier double collecting message keys.
#[derive(Default)]
pub struct CollectingNotifier {
    pub messages: Mutex<Vec<MessageKey>>,
}

impl Notifier for CollectingNotifier {
    fn notify(&self, key: MessageKey) {
        self.messages.lock().unwrap().push(key);
    }
}
