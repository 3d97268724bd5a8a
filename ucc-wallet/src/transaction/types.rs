//! Transaction types

use std::fmt;

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// On-chain account state needed to sign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account number assigned by the chain
    pub account_number: u64,
    /// Replay-protection counter
    pub sequence: u64,
}

impl AccountInfo {
    pub fn new(account_number: u64, sequence: u64) -> Self {
        Self {
            account_number,
            sequence,
        }
    }
}

/// An amount of one denomination, in minimal units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Amount in minimal units
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: &str, amount: U256) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A bank transfer; both addresses in chain form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMessage {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Amount to send
    pub amount: Coin,
}

/// Transaction fee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee amount
    pub amount: Coin,
    /// Gas limit
    pub gas_limit: u64,
}

/// Outcome of a single broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Whether the node accepted the transaction into its mempool
    pub success: bool,
    /// Transaction hash, when known
    pub tx_hash: Option<String>,
    /// Node result code; zero on acceptance
    pub code: u32,
    /// Node log for rejected transactions
    pub error_detail: Option<String>,
    /// The request failed in transit, so the node may still have the transaction
    #[serde(default)]
    pub in_doubt: bool,
}

impl TransactionResult {
    pub fn accepted(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash),
            code: 0,
            error_detail: None,
            in_doubt: false,
        }
    }

    pub fn rejected(tx_hash: Option<String>, code: u32, detail: String) -> Self {
        Self {
            success: false,
            tx_hash,
            code,
            error_detail: Some(detail),
            in_doubt: false,
        }
    }

    /// A broadcast whose request failed before the node answered
    pub fn undelivered(tx_hash: String, detail: String) -> Self {
        Self {
            success: false,
            tx_hash: Some(tx_hash),
            code: 0,
            error_detail: Some(detail),
            in_doubt: true,
        }
    }

    pub fn outcome(&self) -> BroadcastOutcome {
        match (self.success, self.in_doubt) {
            (true, _) => BroadcastOutcome::Accepted,
            (false, true) => BroadcastOutcome::Unknown,
            (false, false) => BroadcastOutcome::Rejected,
        }
    }

    /// Convert into the accepted tx hash or `Error::BroadcastRejected`
    pub fn into_result(self) -> Result<String> {
        match (self.success, self.tx_hash) {
            (true, Some(hash)) => Ok(hash),
            (_, _) => Err(Error::BroadcastRejected {
                code: self.code,
                log: self.error_detail.unwrap_or_default(),
            }),
        }
    }
}

/// Final status of an included transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransactionFinalStatus {
    Confirmed {
        height: u64,
        gas_used: u64,
    },
    Failed {
        height: u64,
        code: u32,
        log: String,
    },
}

/// What the node said about a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastOutcome {
    Accepted,
    Rejected,
    /// No answer from the node; the transaction may still land
    Unknown,
}

/// Progress of a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendState {
    Building,
    Signed,
    Broadcast(BroadcastOutcome),
    Confirmed,
    Failed,
}

impl SendState {
    /// Whether the transaction can be polled for inclusion
    pub fn is_pollable(&self) -> bool {
        matches!(
            self,
            Self::Broadcast(BroadcastOutcome::Accepted) | Self::Broadcast(BroadcastOutcome::Unknown)
        )
    }

    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Failed | Self::Broadcast(BroadcastOutcome::Rejected)
        )
    }
}

/// U256 as a decimal string, the way the chain's JSON carries integers
pub(crate) mod decimal_u256 {
    use ethers_core::types::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(de::Error::custom)
    }
}
