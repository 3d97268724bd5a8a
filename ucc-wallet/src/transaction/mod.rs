//! Transaction functionality
//!
//! This module provides building, signing and broadcasting of bank transfers
//! on the UCC chain, plus balance queries.

pub mod amount;
pub mod proto;
pub mod types;
mod sign_doc;
mod signer;
pub mod provider;
mod client;
mod balance;
mod send;

pub use amount::*;
pub use types::*;
pub use sign_doc::*;
pub use signer::*;
pub use provider::*;
pub use client::*;
pub use balance::*;
pub use send::*;
