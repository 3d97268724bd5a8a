//! Address encoding
//!
//! One 20-byte account hash, two renderings:
//!
//! - Ethereum style: `0x` followed by 40 lowercase hex characters.
//! - Chain style: bech32 (BIP-173 checksum) under the `ucc` prefix, e.g.
//!   `ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc7`.
//!
//! Decoding accepts either all-lowercase or all-uppercase input; encoding
//! always emits lowercase.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_HRP;
use crate::error::{Error, Result};

/// Length of the account hash behind both address formats
pub const ADDRESS_HASH_LEN: usize = 20;

/// The two address renderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFormat {
    /// `0x`-prefixed hex
    Ethereum,
    /// bech32 with the chain prefix
    Chain,
}

impl AddressFormat {
    /// Guess the format of an address string from its prefix
    pub fn detect(address: &str) -> Self {
        let trimmed = address.trim();
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            Self::Ethereum
        } else {
            Self::Chain
        }
    }
}

/// Encode a 20-byte hash as a `ucc1...` chain address
pub fn to_alt_format(hash: &[u8; ADDRESS_HASH_LEN]) -> String {
    // the default prefix is a constant known to be a valid HRP
    to_alt_format_with_hrp(hash, DEFAULT_HRP).unwrap_or_default()
}

/// Encode a 20-byte hash as a bech32 address under `hrp`
pub fn to_alt_format_with_hrp(hash: &[u8; ADDRESS_HASH_LEN], hrp: &str) -> Result<String> {
    let hrp = Hrp::parse(hrp).map_err(|e| Error::AddressDecode(format!("Invalid prefix: {}", e)))?;
    bech32::encode::<Bech32>(hrp, hash)
        .map(|encoded| encoded.to_lowercase())
        .map_err(|e| Error::AddressDecode(format!("Bech32 encoding failed: {}", e)))
}

/// Decode a `ucc1...` chain address into its 20-byte hash
pub fn from_alt_format(address: &str) -> Result<[u8; ADDRESS_HASH_LEN]> {
    from_alt_format_with_hrp(address, DEFAULT_HRP)
}

/// Decode a bech32 address, requiring the prefix `expected_hrp`
pub fn from_alt_format_with_hrp(address: &str, expected_hrp: &str) -> Result<[u8; ADDRESS_HASH_LEN]> {
    let address = address.trim();

    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(Error::AddressDecode("mixed-case address".to_string()));
    }

    let (hrp, data) = bech32::decode(address)
        .map_err(|e| Error::AddressDecode(format!("Invalid bech32 address: {}", e)))?;

    if !hrp.as_str().eq_ignore_ascii_case(expected_hrp) {
        return Err(Error::AddressDecode(format!(
            "expected prefix '{}', got '{}'",
            expected_hrp,
            hrp.as_str().to_lowercase()
        )));
    }

    let hash: [u8; ADDRESS_HASH_LEN] = data.as_slice().try_into().map_err(|_| {
        Error::AddressDecode(format!(
            "expected {} byte payload, got {}",
            ADDRESS_HASH_LEN,
            data.len()
        ))
    })?;

    // bech32::decode also accepts bech32m checksums and non-zero padding;
    // only the canonical BIP-173 encoding of the hash is a valid address.
    if to_alt_format_with_hrp(&hash, expected_hrp)? != address.to_lowercase() {
        return Err(Error::AddressDecode("non-canonical bech32 encoding".to_string()));
    }

    Ok(hash)
}

/// Render a 20-byte hash as a lowercase `0x` address
pub fn to_eth_format(hash: &[u8; ADDRESS_HASH_LEN]) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Decode a `0x` address of any hex case (EIP-55 checksums are not enforced)
pub fn from_eth_format(address: &str) -> Result<[u8; ADDRESS_HASH_LEN]> {
    let address = address.trim();
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| Error::AddressDecode("Ethereum address must start with 0x".to_string()))?;

    if stripped.len() != ADDRESS_HASH_LEN * 2 {
        return Err(Error::AddressDecode(format!(
            "expected {} hex characters, got {}",
            ADDRESS_HASH_LEN * 2,
            stripped.len()
        )));
    }

    let mut hash = [0u8; ADDRESS_HASH_LEN];
    hex::decode_to_slice(stripped, &mut hash)
        .map_err(|e| Error::AddressDecode(format!("Invalid hex address: {}", e)))?;
    Ok(hash)
}

/// Convert an Ethereum address to its UCC address
pub fn eth_to_chain_address(eth_address: &str) -> Result<String> {
    Ok(to_alt_format(&from_eth_format(eth_address)?))
}

/// Convert a UCC address to its Ethereum address
pub fn chain_to_eth_address(chain_address: &str) -> Result<String> {
    Ok(to_eth_format(&from_alt_format(chain_address)?))
}

/// Decode an address given in either format
pub fn decode_any(address: &str, hrp: &str) -> Result<[u8; ADDRESS_HASH_LEN]> {
    match AddressFormat::detect(address) {
        AddressFormat::Ethereum => from_eth_format(address),
        AddressFormat::Chain => from_alt_format_with_hrp(address, hrp),
    }
}

/// Accept a recipient in either format and return the canonical chain address
pub fn normalize_recipient(address: &str, hrp: &str) -> Result<String> {
    to_alt_format_with_hrp(&decode_any(address, hrp)?, hrp)
}

/// Validate an address for a specific format
pub fn validate_address(address: &str, format: AddressFormat) -> bool {
    match format {
        AddressFormat::Ethereum => from_eth_format(address).is_ok(),
        AddressFormat::Chain => from_alt_format(address).is_ok(),
    }
}
