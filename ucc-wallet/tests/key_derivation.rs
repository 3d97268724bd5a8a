//! Tests for key derivation and the address codec

use ucc_wallet::account::{
    chain_to_eth_address, eth_to_chain_address, from_alt_format, from_eth_format, to_alt_format,
    Identity,
};
use ucc_wallet::crypto::keys::*;
use ucc_wallet::crypto::mnemonic::*;
use ucc_wallet::Error;

const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[test]
fn test_ethereum_path_derivation() {
    let seed = mnemonic_to_seed(ABANDON, None).unwrap();
    let key_pair = derive_key_pair(seed.as_slice(), DEFAULT_DERIVATION_PATH).unwrap();

    assert_eq!(
        ethereum::public_key_to_address(key_pair.public_key()),
        "0x9858effd232b4033e47d90003d41ec34ecaeda94"
    );
}

#[test]
fn test_other_index_gives_other_key() {
    let seed = mnemonic_to_seed(ABANDON, None).unwrap();
    let first = derive_key_pair(seed.as_slice(), "m/44'/60'/0'/0/0").unwrap();
    let second = derive_key_pair(seed.as_slice(), "m/44'/60'/0'/0/1").unwrap();

    assert_ne!(first.public_key(), second.public_key());
}

#[test]
fn test_import_is_deterministic() {
    let first = Identity::from_seed_phrase(ABANDON).unwrap();
    let second = Identity::from_seed_phrase(&ABANDON.to_uppercase()).unwrap();

    assert_eq!(first.eth_address(), second.eth_address());
    assert_eq!(first.chain_address(), second.chain_address());
    assert_eq!(
        first.key_pair().private_key().as_bytes(),
        second.key_pair().private_key().as_bytes()
    );
}

#[test]
fn test_generated_identity_formats() {
    let identity = Identity::generate().unwrap();

    let eth = identity.eth_address();
    assert_eq!(eth.len(), 42);
    assert!(eth.starts_with("0x"));
    assert!(eth[2..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

    let chain = identity.chain_address();
    assert!(chain.starts_with("ucc1"));
    assert!(chain[4..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

    assert_eq!(from_alt_format(chain).unwrap(), from_eth_format(eth).unwrap());
}

#[test]
fn test_codec_round_trip_over_many_hashes() {
    for seed in 0u8..=255 {
        let mut hash = [0u8; 20];
        for (i, byte) in hash.iter_mut().enumerate() {
            *byte = seed.wrapping_mul(31).wrapping_add(i as u8 * 7);
        }
        assert_eq!(from_alt_format(&to_alt_format(&hash)).unwrap(), hash);
    }
}

#[test]
fn test_conversion_helpers() {
    let eth = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
    let chain = eth_to_chain_address(eth).unwrap();

    assert_eq!(chain, "ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc7");
    assert_eq!(chain_to_eth_address(&chain).unwrap(), eth.to_lowercase());
}

#[test]
fn test_rejections() {
    let corrupted = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
    assert!(matches!(Identity::from_seed_phrase(corrupted), Err(Error::InvalidMnemonic(_))));

    let flipped = "ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc8";
    assert!(matches!(from_alt_format(flipped), Err(Error::AddressDecode(_))));

    assert!(matches!(Identity::from_private_key("0x00"), Err(Error::InvalidKey(_))));
}
