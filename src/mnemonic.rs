//! Conversion between recovery phrases and binary seeds.
//!
//! Thin wrapper around BIP-39 (via `tiny-bip39`): 12-word English
//! phrases, 64-byte seeds. The wordlist and checksum algorithm are
//! the library's concern, not ours.
//!
//! Derivation is deterministic end to end: a password maps to exactly
//! one phrase (its SHAKE-256 digest is the phrase entropy) and a
//! phrase maps to exactly one seed. Password verification depends on
//! re-deriving the same seed from the same password.

use anyhow::Result;
use bip39::Language;
use bip39::Mnemonic;
use sha3::digest::ExtendableOutput;
use sha3::digest::Update;
use sha3::Shake256;

use crate::seed::DerivedSeed;
use crate::seed::Seed;

/// Minimum number of whitespace-separated tokens for a password to be
/// treated as an existing recovery phrase rather than a plain
/// password.
pub const WORD_THRESHOLD: usize = 12;

/// Entropy bytes backing a generated phrase; 16 bytes yields 12 words.
const PHRASE_ENTROPY_LEN: usize = 16;

/// True if `password` should be interpreted as a recovery phrase.
pub fn looks_like_phrase(password: &str) -> bool {
    password.split_whitespace().count() >= WORD_THRESHOLD
}

/// Generate the 12-word phrase for `password` and derive its seed.
///
/// The password is stretched to phrase entropy with SHAKE-256, so the
/// same password always yields the same phrase and the same seed.
pub fn generate(password: &str) -> DerivedSeed {
    let mut hasher = Shake256::default();
    hasher.update(password.as_bytes());
    let mut entropy = [0u8; PHRASE_ENTROPY_LEN];
    hasher.finalize_xof_into(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy, Language::English)
        .expect("16 bytes is a valid BIP-39 entropy length");
    DerivedSeed {
        seed: seed_of(&mnemonic),
        phrase: mnemonic.into_phrase(),
    }
}

/// Derive the seed of an existing recovery phrase.
///
/// Fails if the phrase is not a valid BIP-39 mnemonic.
pub fn seed_from_phrase(phrase: &str) -> Result<DerivedSeed> {
    let mnemonic = Mnemonic::from_phrase(phrase, Language::English)?;
    Ok(DerivedSeed {
        seed: seed_of(&mnemonic),
        phrase: mnemonic.into_phrase(),
    })
}

fn seed_of(mnemonic: &Mnemonic) -> Seed {
    let seed = bip39::Seed::new(mnemonic, "");
    Seed::from_slice(seed.as_bytes()).expect("BIP-39 seeds are always 64 bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_detection_counts_tokens() {
        assert!(!looks_like_phrase("hunter2 hunter2 hunter2"));
        assert!(looks_like_phrase(
            "legal winner thank year wave sausage worth useful legal winner thank yellow"
        ));
        // Extra whitespace does not change the token count.
        assert!(looks_like_phrase(
            "  legal  winner thank year wave sausage worth useful legal winner thank yellow "
        ));
    }

    #[test]
    fn generated_phrase_round_trips_to_the_same_seed() {
        let derived = generate("correcthorsebattery");
        assert_eq!(derived.phrase.split_whitespace().count(), 12);

        let replayed = seed_from_phrase(&derived.phrase).unwrap();
        assert_eq!(replayed.phrase, derived.phrase);
        assert_eq!(replayed.seed, derived.seed);
    }

    #[test]
    fn generation_is_deterministic_per_password() {
        assert_eq!(generate("hunter22").seed, generate("hunter22").seed);
        assert_ne!(generate("hunter22").seed, generate("hunter23").seed);
    }

    #[test]
    fn phrase_derivation_is_deterministic() {
        let phrase = "legal winner thank year wave sausage worth useful legal winner thank yellow";
        let a = seed_from_phrase(phrase).unwrap();
        let b = seed_from_phrase(phrase).unwrap();
        assert_eq!(a.seed, b.seed);
    }

    #[test]
    fn bad_phrase_fails() {
        assert!(
            seed_from_phrase("twelve words that are not on the bip39 wordlist at all nope")
                .is_err()
        );
    }
}
