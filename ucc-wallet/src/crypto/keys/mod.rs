//! Key derivation and management
//!
//! secp256k1 keys derived along the Ethereum HD path, hashed the Ethereum way.

pub mod ethereum;
mod derivation;

pub use derivation::*;
