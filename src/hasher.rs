//! Unsalted quick hashes and random tokens for non-seed auxiliary data.
//!
//! These are deliberately fast hashes: they protect the PIN (a short
//! secondary secret gating UI actions, not funds) and fingerprint the
//! salt. The vault encryption key never passes through here.

use sha3::Digest;
use sha3::Sha3_256;

/// Hash `input` with SHA3-256 and return the lowercase hex digest.
pub fn quick_hash(input: &str) -> String {
    let digest = Sha3_256::digest(input.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Generate a random alphanumeric token of `length` characters.
pub fn random_token(length: usize) -> String {
    use rand::distr::Alphanumeric;
    use rand::Rng;

    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
