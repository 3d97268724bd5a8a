//! Mnemonic phrase generation and handling

use bip39::{Language, Mnemonic};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    Words12,
    /// 24 words (256 bits)
    #[default]
    Words24,
}

impl MnemonicStrength {
    /// Get entropy length in bytes
    fn entropy_bytes(&self) -> usize {
        match self {
            Self::Words12 => 16,
            Self::Words24 => 32,
        }
    }

    /// Number of words a phrase of this strength has
    pub fn word_count(&self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words24 => 24,
        }
    }
}

/// Generate a new random mnemonic phrase with the specified strength
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<Zeroizing<String>> {
    let mut entropy = Zeroizing::new(vec![0u8; strength.entropy_bytes()]);
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Collapse runs of whitespace and lowercase the phrase.
pub fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    Zeroizing::new(
        phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}

fn parse(phrase: &str) -> Result<Mnemonic> {
    let normalized = normalize_phrase(phrase);
    // bip39 errors name the offending word index, never the word itself
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))
}

/// Validate a mnemonic phrase against the English wordlist and its checksum
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    parse(phrase).map(|_| ())
}

/// Check a phrase typed back by the user against the one just generated.
///
/// Whitespace and case are ignored. The error never names the words.
pub fn confirm_mnemonic(expected: &str, entered: &str) -> Result<()> {
    if normalize_phrase(expected) == normalize_phrase(entered) {
        return Ok(());
    }
    Err(Error::InvalidMnemonic(
        "re-entered phrase does not match the generated one".to_string(),
    ))
}

/// Generate a seed from a mnemonic phrase and optional passphrase
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> Result<Zeroizing<[u8; 64]>> {
    let mnemonic = parse(phrase)?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase.unwrap_or(""))))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic() {
        let mnemonic = generate_mnemonic(MnemonicStrength::Words12).unwrap();
        assert!(validate_mnemonic(&mnemonic).is_ok());
        assert_eq!(mnemonic.split_whitespace().count(), MnemonicStrength::Words12.word_count());

        let mnemonic = generate_mnemonic(MnemonicStrength::default()).unwrap();
        assert!(validate_mnemonic(&mnemonic).is_ok());
        assert_eq!(mnemonic.split_whitespace().count(), MnemonicStrength::Words24.word_count());
    }

    #[test]
    fn test_validate_mnemonic() {
        let invalid = "invalid mnemonic phrase test test test test test test test test test";

        assert!(validate_mnemonic(ABANDON).is_ok());
        assert!(matches!(validate_mnemonic(invalid), Err(Error::InvalidMnemonic(_))));
    }

    #[test]
    fn test_confirm_mnemonic() {
        assert!(confirm_mnemonic(ABANDON, &format!("  {}\n", ABANDON.to_uppercase())).is_ok());

        let swapped = ABANDON.replacen("abandon about", "about abandon", 1);
        let err = confirm_mnemonic(ABANDON, &swapped).unwrap_err();
        assert!(matches!(err, Error::InvalidMnemonic(_)));
        assert!(!err.to_string().contains("abandon"));
    }

    #[test]
    fn test_corrupted_checksum_word() {
        // "abandon" x12 uses valid words but fails the checksum
        let corrupted = vec!["abandon"; 12].join(" ");
        assert!(matches!(validate_mnemonic(&corrupted), Err(Error::InvalidMnemonic(_))));
    }

    #[test]
    fn test_error_does_not_echo_phrase() {
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon zebraz about";
        let err = validate_mnemonic(phrase).unwrap_err().to_string();
        assert!(!err.contains("zebraz"));
        assert!(!err.contains("abandon"));
    }

    #[test]
    fn test_normalization() {
        let messy = "  Abandon abandon\tabandon abandon abandon abandon\nabandon abandon abandon abandon abandon ABOUT ";
        assert_eq!(normalize_phrase(messy).as_str(), ABANDON);
        assert!(validate_mnemonic(messy).is_ok());
    }

    #[test]
    fn test_mnemonic_to_seed() {
        let seed = mnemonic_to_seed(ABANDON, None).unwrap();

        // BIP-39 test vector for this phrase with an empty passphrase
        assert_eq!(
            hex::encode(&seed[..8]),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1"[..16]
        );
        assert_eq!(seed.len(), 64);
    }
}
