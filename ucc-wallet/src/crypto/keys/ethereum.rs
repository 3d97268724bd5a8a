//! Ethereum public key hashing

use sha3::{Digest, Keccak256};

use super::derivation::PublicKey;

/// Calculate the Keccak-256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The 20-byte account hash: last 20 bytes of Keccak-256 over the
/// uncompressed point without its `0x04` tag.
pub fn public_key_hash(public_key: &PublicKey) -> [u8; 20] {
    let key_hash = keccak256(&public_key.uncompressed()[1..]);

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&key_hash[12..]);
    hash
}

/// Get the Ethereum address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    format!("0x{}", hex::encode(public_key_hash(public_key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{KeyPair, PrivateKey};

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_known_private_key_address() {
        let key = PrivateKey::from_hex("1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727").unwrap();
        let pair = KeyPair::from_private_key(key).unwrap();

        assert_eq!(
            public_key_to_address(pair.public_key()),
            "0x9858effd232b4033e47d90003d41ec34ecaeda94"
        );
    }
}
