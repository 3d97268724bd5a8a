//! Error types for the ucc-wallet library
//!
//! No variant ever carries a mnemonic or private key; messages are built from
//! error kinds, lengths and node responses only.

use thiserror::Error;

/// Custom error type for ucc-wallet operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Seed phrase failed the wordlist or checksum check
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Malformed private key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Bad checksum, prefix, or length on either address format
    #[error("Address decode error: {0}")]
    AddressDecode(String),

    /// The address has no on-chain account record yet
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The node refused the signed envelope
    #[error("Broadcast rejected (code {code}): {log}")]
    BroadcastRejected { code: u32, log: String },

    /// The transaction is not yet included in a block
    #[error("Transaction still pending: {0}")]
    StillPending(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Another send for the same identity has not finished
    #[error("Send already in progress for {0}")]
    SendInProgress(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the error was raised by local validation, before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMnemonic(_)
                | Self::InvalidKey(_)
                | Self::AddressDecode(_)
                | Self::InvalidAmount(_)
                | Self::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for ucc-wallet operations
pub type Result<T> = std::result::Result<T, Error>;
