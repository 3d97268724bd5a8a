//! Wallet identity derivation
//!
//! An [`Identity`] is one secp256k1 key viewed through both address formats.
//! The chain address re-encodes the Ethereum account hash, so a single key
//! is authoritative for both.

use std::fmt;

use zeroize::Zeroizing;

use crate::account::address::{to_alt_format_with_hrp, to_eth_format, ADDRESS_HASH_LEN};
use crate::config::DEFAULT_HRP;
use crate::crypto::keys::{derive_key_pair, ethereum, KeyPair, PrivateKey, DEFAULT_DERIVATION_PATH};
use crate::crypto::mnemonic::{generate_mnemonic, mnemonic_to_seed, normalize_phrase, MnemonicStrength};
use crate::error::{Error, Result};

/// A wallet identity: keypair plus both of its addresses
#[derive(Clone)]
pub struct Identity {
    public_key_hash: [u8; ADDRESS_HASH_LEN],
    eth_address: String,
    chain_address: String,
    key_pair: KeyPair,
    mnemonic: Option<Zeroizing<String>>,
}

impl Identity {
    /// Generate a fresh 24-word identity
    pub fn generate() -> Result<Self> {
        Self::generate_with_strength(MnemonicStrength::default())
    }

    /// Generate a fresh identity with the given mnemonic strength
    pub fn generate_with_strength(strength: MnemonicStrength) -> Result<Self> {
        let phrase = generate_mnemonic(strength)?;
        Self::from_seed_phrase(&phrase)
    }

    /// Import an identity from a seed phrase
    pub fn from_seed_phrase(phrase: &str) -> Result<Self> {
        Self::from_seed_phrase_with_hrp(phrase, DEFAULT_HRP)
    }

    /// Import an identity from a seed phrase, rendering the chain address under `hrp`
    pub fn from_seed_phrase_with_hrp(phrase: &str, hrp: &str) -> Result<Self> {
        let normalized = normalize_phrase(phrase);
        let seed = mnemonic_to_seed(&normalized, None)?;
        let key_pair = derive_key_pair(seed.as_slice(), DEFAULT_DERIVATION_PATH)?;

        let mut identity = Self::from_key_pair(key_pair, hrp)?;
        identity.mnemonic = Some(normalized);
        Ok(identity)
    }

    /// Import an identity from a hex private key; it carries no mnemonic
    pub fn from_private_key(hex_key: &str) -> Result<Self> {
        Self::from_private_key_with_hrp(hex_key, DEFAULT_HRP)
    }

    /// Import an identity from a hex private key, rendering the chain address under `hrp`
    pub fn from_private_key_with_hrp(hex_key: &str, hrp: &str) -> Result<Self> {
        let key_pair = KeyPair::from_private_key(PrivateKey::from_hex(hex_key)?)?;
        Self::from_key_pair(key_pair, hrp)
    }

    fn from_key_pair(key_pair: KeyPair, hrp: &str) -> Result<Self> {
        let public_key_hash = ethereum::public_key_hash(key_pair.public_key());

        Ok(Self {
            public_key_hash,
            eth_address: to_eth_format(&public_key_hash),
            chain_address: to_alt_format_with_hrp(&public_key_hash, hrp)?,
            key_pair,
            mnemonic: None,
        })
    }

    /// Re-attach the phrase an identity was derived from.
    ///
    /// Used when restoring from storage; the phrase is only kept if it
    /// derives this identity's key.
    pub fn with_mnemonic(mut self, phrase: &str) -> Result<Self> {
        let from_phrase = Self::from_seed_phrase(phrase)?;
        if from_phrase.public_key_hash != self.public_key_hash {
            return Err(Error::InvalidMnemonic(
                "phrase does not derive this identity's key".to_string(),
            ));
        }
        self.mnemonic = from_phrase.mnemonic.clone();
        Ok(self)
    }

    pub fn public_key_hash(&self) -> &[u8; ADDRESS_HASH_LEN] {
        &self.public_key_hash
    }

    /// `0x`-prefixed lowercase hex address
    pub fn eth_address(&self) -> &str {
        &self.eth_address
    }

    /// bech32 chain address
    pub fn chain_address(&self) -> &str {
        &self.chain_address
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// The seed phrase, when the identity was generated or imported from one
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(|m| m.as_str())
    }

    /// 33-byte SEC1 public key, as carried in transactions
    pub fn compressed_public_key(&self) -> [u8; 33] {
        self.key_pair.public_key().compressed()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("eth_address", &self.eth_address)
            .field("chain_address", &self.chain_address)
            .field("key_pair", &self.key_pair)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::address::{from_alt_format, from_eth_format};

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_known_seed_phrase() {
        let identity = Identity::from_seed_phrase(ABANDON).unwrap();

        assert_eq!(identity.eth_address(), "0x9858effd232b4033e47d90003d41ec34ecaeda94");
        assert_eq!(identity.chain_address(), "ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc7");
        assert_eq!(
            identity.key_pair().private_key().to_hex().as_str(),
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
        assert_eq!(
            hex::encode(identity.compressed_public_key()),
            "0237b0bb7a8288d38ed49a524b5dc98cff3eb5ca824c9f9dc0dfdb3d9cd600f299"
        );
        assert_eq!(identity.mnemonic(), Some(ABANDON));
    }

    #[test]
    fn test_generate_addresses_agree() {
        let identity = Identity::generate().unwrap();

        assert_eq!(identity.mnemonic().unwrap().split_whitespace().count(), 24);
        assert_eq!(
            from_alt_format(identity.chain_address()).unwrap(),
            from_eth_format(identity.eth_address()).unwrap()
        );
        assert_eq!(&from_alt_format(identity.chain_address()).unwrap(), identity.public_key_hash());
    }

    #[test]
    fn test_generate_twelve_words() {
        let identity = Identity::generate_with_strength(MnemonicStrength::Words12).unwrap();
        assert_eq!(identity.mnemonic().unwrap().split_whitespace().count(), 12);
    }

    #[test]
    fn test_private_key_import_matches_phrase_import() {
        let from_phrase = Identity::from_seed_phrase(ABANDON).unwrap();
        let from_key = Identity::from_private_key(
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727",
        )
        .unwrap();

        assert_eq!(from_key.eth_address(), from_phrase.eth_address());
        assert_eq!(from_key.chain_address(), from_phrase.chain_address());
        assert!(from_key.mnemonic().is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let corrupted = vec!["abandon"; 12].join(" ");
        assert!(matches!(Identity::from_seed_phrase(&corrupted), Err(Error::InvalidMnemonic(_))));
        assert!(matches!(Identity::from_private_key("0xdeadbeef"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_with_mnemonic_requires_matching_phrase() {
        let key_only = Identity::from_private_key(
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727",
        )
        .unwrap();

        let restored = key_only.clone().with_mnemonic(ABANDON).unwrap();
        assert_eq!(restored.mnemonic(), Some(ABANDON));

        let other = Identity::generate().unwrap();
        let other_phrase = other.mnemonic().unwrap().to_string();
        assert!(key_only.with_mnemonic(&other_phrase).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let identity = Identity::from_seed_phrase(ABANDON).unwrap();
        let debug = format!("{:?}", identity);

        assert!(debug.contains("ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc7"));
        assert!(!debug.contains("abandon"));
        assert!(!debug.contains("1ab42cc4"));
    }
}
