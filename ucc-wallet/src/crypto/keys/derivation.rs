//! secp256k1 key types and BIP-32 derivation

use std::fmt;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey as Secp256k1PublicKey, Secp256k1, SecretKey};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};

/// Ethereum's default HD path; the UCC identity always lives here.
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A secp256k1 private scalar.
///
/// Zeroized on drop and redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; 32],
}

impl PrivateKey {
    /// Create a private key from raw bytes, rejecting zero and values >= n
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self> {
        SecretKey::from_slice(&bytes)
            .map_err(|_| Error::InvalidKey("scalar is not a valid secp256k1 private key".to_string()))?;
        Ok(Self { bytes })
    }

    /// Parse a 32-byte hex private key, with or without a `0x` prefix
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let trimmed = hex_key.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if stripped.len() != 64 {
            return Err(Error::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                stripped.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(stripped, bytes.as_mut_slice())
            .map_err(|_| Error::InvalidKey("private key is not valid hex".to_string()))?;

        Self::from_bytes(*bytes)
    }

    /// Get the raw private key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Export as `0x`-prefixed lowercase hex. Only the persistent store should need this.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.bytes)))
    }

    pub(crate) fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.bytes)
            .map_err(|_| Error::InvalidKey("scalar is not a valid secp256k1 private key".to_string()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("bytes", &"[REDACTED]").finish()
    }
}

/// A secp256k1 public point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: Secp256k1PublicKey,
}

impl PublicKey {
    /// Parse a compressed (33 byte) or uncompressed (65 byte) public key
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let inner = Secp256k1PublicKey::from_slice(bytes)
            .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))?;
        Ok(Self { inner })
    }

    /// SEC1 compressed form, as carried in transaction signer infos
    pub fn compressed(&self) -> [u8; 33] {
        self.inner.serialize()
    }

    /// SEC1 uncompressed form (`0x04 || x || y`), as hashed for addresses
    pub fn uncompressed(&self) -> [u8; 65] {
        self.inner.serialize_uncompressed()
    }

    pub(crate) fn inner(&self) -> &Secp256k1PublicKey {
        &self.inner
    }
}

/// A secp256k1 key pair
#[derive(Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Build the key pair belonging to a private key
    pub fn from_private_key(private_key: PrivateKey) -> Result<Self> {
        let secp = Secp256k1::signing_only();
        let secret_key = private_key.secret_key()?;
        let public_key = PublicKey {
            inner: Secp256k1PublicKey::from_secret_key(&secp, &secret_key),
        };
        Ok(Self { private_key, public_key })
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &hex::encode(self.public_key.compressed()))
            .finish()
    }
}

/// Derive a key pair from a BIP-39 seed and derivation path
pub fn derive_key_pair(seed: &[u8], path: &str) -> Result<KeyPair> {
    let path_components = parse_derivation_path(path)?;

    let (mut secret_key, mut chain_code) = derive_master_key(seed)?;

    for component in path_components {
        (secret_key, chain_code) = derive_child_key(&secret_key, &chain_code, component)?;
    }

    KeyPair::from_private_key(PrivateKey::from_bytes(*secret_key)?)
}

/// Parse a BIP-32 derivation path
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>> {
    if !path.starts_with("m/") {
        return Err(Error::KeyDerivation(format!("Invalid derivation path: {}", path)));
    }

    let mut result = Vec::new();

    for component in path.trim_start_matches("m/").split('/') {
        if component.is_empty() {
            continue;
        }

        let hardened = component.ends_with('\'');
        let index = component
            .trim_end_matches('\'')
            .parse::<u32>()
            .ok()
            .filter(|index| *index < HARDENED_OFFSET)
            .ok_or_else(|| {
                Error::KeyDerivation(format!("Invalid derivation path component: {}", component))
            })?;

        result.push(if hardened { HARDENED_OFFSET + index } else { index });
    }

    Ok(result)
}

type SecretBytes = Zeroizing<[u8; 32]>;

fn split_hmac_output(output: &[u8]) -> (SecretBytes, [u8; 32]) {
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&output[0..32]);
    chain_code.copy_from_slice(&output[32..64]);
    (key, chain_code)
}

/// Derive the master key from a seed
fn derive_master_key(seed: &[u8]) -> Result<(SecretBytes, [u8; 32])> {
    let mut hmac = Hmac::<Sha512>::new_from_slice(b"Bitcoin seed")
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(seed);
    let mut result = Zeroizing::new([0u8; 64]);
    result.copy_from_slice(&hmac.finalize().into_bytes());

    let (key, chain_code) = split_hmac_output(result.as_slice());
    SecretKey::from_slice(key.as_slice())
        .map_err(|_| Error::KeyDerivation("Seed produced an invalid master key".to_string()))?;

    Ok((key, chain_code))
}

/// Derive a child key from a parent key
fn derive_child_key(
    parent_key: &[u8; 32],
    parent_chain_code: &[u8; 32],
    index: u32,
) -> Result<(SecretBytes, [u8; 32])> {
    let secp = Secp256k1::signing_only();
    let parent_secret_key = SecretKey::from_slice(parent_key)
        .map_err(|e| Error::KeyDerivation(format!("Invalid parent key: {}", e)))?;

    let mut data = Zeroizing::new(Vec::with_capacity(37));

    if index >= HARDENED_OFFSET {
        data.push(0);
        data.extend_from_slice(parent_key);
    } else {
        let parent_public_key = Secp256k1PublicKey::from_secret_key(&secp, &parent_secret_key);
        data.extend_from_slice(&parent_public_key.serialize());
    }

    data.extend_from_slice(&index.to_be_bytes());

    let mut hmac = Hmac::<Sha512>::new_from_slice(parent_chain_code)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(&data);
    let mut result = Zeroizing::new([0u8; 64]);
    result.copy_from_slice(&hmac.finalize().into_bytes());

    let (tweak, child_chain_code) = split_hmac_output(result.as_slice());

    // child = IL + parent (mod n)
    let child_secret_key = SecretKey::from_slice(tweak.as_slice())
        .map_err(|e| Error::KeyDerivation(format!("Invalid child key: {}", e)))?
        .add_tweak(&parent_secret_key.into())
        .map_err(|e| Error::KeyDerivation(format!("Key addition error: {}", e)))?;

    Ok((Zeroizing::new(child_secret_key.secret_bytes()), child_chain_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_derivation_path() {
        let path = parse_derivation_path(DEFAULT_DERIVATION_PATH).unwrap();
        assert_eq!(
            path,
            vec![HARDENED_OFFSET + 44, HARDENED_OFFSET + 60, HARDENED_OFFSET, 0, 0]
        );

        assert!(parse_derivation_path("44'/60'").is_err());
        assert!(parse_derivation_path("m/44'/x").is_err());
        assert!(parse_derivation_path("m/2147483648").is_err());
    }

    #[test]
    fn test_private_key_from_hex() {
        let hex_key = "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727";
        let key = PrivateKey::from_hex(hex_key).unwrap();
        assert_eq!(key.to_hex().as_str(), hex_key);

        let unprefixed = PrivateKey::from_hex(&hex_key[2..]).unwrap();
        assert_eq!(unprefixed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_private_key_rejects_bad_input() {
        assert!(matches!(PrivateKey::from_hex("0x1234"), Err(Error::InvalidKey(_))));
        assert!(matches!(
            PrivateKey::from_hex(&"zz".repeat(32)),
            Err(Error::InvalidKey(_))
        ));
        // zero is not a valid scalar
        assert!(matches!(
            PrivateKey::from_hex(&"00".repeat(32)),
            Err(Error::InvalidKey(_))
        ));
        // the group order itself is out of range
        assert!(matches!(
            PrivateKey::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = PrivateKey::from_bytes([7u8; 32]).unwrap();
        let pair = KeyPair::from_private_key(key.clone()).unwrap();

        assert!(!format!("{:?}", key).contains("0707"));
        assert!(format!("{:?}", pair).contains("REDACTED"));
    }

    #[test]
    fn test_public_key_forms() {
        let pair = KeyPair::from_private_key(PrivateKey::from_bytes([7u8; 32]).unwrap()).unwrap();
        let compressed = pair.public_key().compressed();
        let uncompressed = pair.public_key().uncompressed();

        assert!(compressed[0] == 0x02 || compressed[0] == 0x03);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(&compressed[1..], &uncompressed[1..33]);
        assert_eq!(PublicKey::from_slice(&compressed).unwrap(), *pair.public_key());
    }
}
