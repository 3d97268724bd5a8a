//! UCC Wallet Core - dual-address wallet for the UCC chain
//!
//! This library provides the core of a wallet whose single secp256k1 identity
//! is shown both as an Ethereum-style `0x` address and as a bech32 `ucc1...`
//! address, including mnemonic generation, key derivation, Cosmos SDK
//! transaction signing, broadcasting and balance queries.

pub mod error;
pub mod config;
pub mod crypto;
pub mod account;
pub mod transaction;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use config::{ProviderConfig, WalletConfig};
pub use account::{Identity, IdentityStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
