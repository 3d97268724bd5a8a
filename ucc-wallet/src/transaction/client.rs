//! Account and broadcast client
//!
//! Every call is a single request: no retries, no resubmission and no
//! timeout beyond the transport's own.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::provider::{Transport, TransportResponse};
use super::signer::SignedTransaction;
use super::types::{AccountInfo, TransactionFinalStatus, TransactionResult};

const ACCOUNTS_PATH: &str = "/cosmos/auth/v1beta1/accounts";
const TXS_PATH: &str = "/cosmos/tx/v1beta1/txs";

/// gRPC `NotFound`, as relayed by the REST gateway
const GRPC_NOT_FOUND: u64 = 5;

/// Client for the node's auth and tx endpoints
#[derive(Clone)]
pub struct ChainClient {
    transport: Arc<dyn Transport>,
}

impl ChainClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the account number and sequence of `address`
    pub async fn fetch_account(&self, address: &str) -> Result<AccountInfo> {
        let response = self
            .transport
            .get(&format!("{}/{}", ACCOUNTS_PATH, address))
            .await?;

        if is_not_found(&response) {
            return Err(Error::AccountNotFound(address.to_string()));
        }
        ensure_success(&response, "account query")?;

        let account = response
            .body
            .get("account")
            .ok_or_else(|| Error::Serialization("account response has no account".to_string()))?;

        // EthAccount nests the base account
        let base = account.get("base_account").unwrap_or(account);
        let info = AccountInfo {
            account_number: base.get("account_number").and_then(json_u64).unwrap_or(0),
            sequence: base.get("sequence").and_then(json_u64).unwrap_or(0),
        };

        debug!(
            %address,
            account_number = info.account_number,
            sequence = info.sequence,
            "Fetched account"
        );
        Ok(info)
    }

    /// Like [`fetch_account`](Self::fetch_account), but a never-funded account signs with zeros
    pub async fn fetch_account_or_default(&self, address: &str) -> Result<AccountInfo> {
        match self.fetch_account(address).await {
            Err(Error::AccountNotFound(_)) => {
                info!(%address, "Account not on chain yet, using account number 0 and sequence 0");
                Ok(AccountInfo::default())
            }
            other => other,
        }
    }

    /// Submit a signed transaction once, in sync mode.
    ///
    /// A transport failure is not an error: the bytes may have reached the
    /// node, so the result keeps the locally computed hash for polling.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<TransactionResult> {
        let local_hash = signed.tx_hash();
        let body = json!({
            "tx_bytes": signed.to_base64(),
            "mode": "BROADCAST_MODE_SYNC",
        });

        let response = match self.transport.post_json(TXS_PATH, &body).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tx_hash = %local_hash, error = %e, "Broadcast request failed, outcome unknown");
                return Ok(TransactionResult::undelivered(local_hash, e.to_string()));
            }
        };

        let Some(tx_response) = response.body.get("tx_response") else {
            // gateway errors look like {"code": 3, "message": "..."}
            let code = response.body.get("code").and_then(json_u64).unwrap_or(0) as u32;
            let detail = response
                .body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.body));

            warn!(tx_hash = %local_hash, code, status = response.status, "Broadcast failed");
            return Ok(TransactionResult::rejected(None, code, detail));
        };

        let code = tx_response.get("code").and_then(json_u64).unwrap_or(0) as u32;
        let tx_hash = tx_response
            .get("txhash")
            .and_then(Value::as_str)
            .filter(|hash| !hash.is_empty())
            .map(str::to_string)
            .unwrap_or(local_hash);

        if code == 0 {
            info!(%tx_hash, "Broadcast accepted");
            return Ok(TransactionResult::accepted(tx_hash));
        }

        let raw_log = tx_response
            .get("raw_log")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        warn!(%tx_hash, code, raw_log = %raw_log, "Broadcast rejected");
        Ok(TransactionResult::rejected(Some(tx_hash), code, raw_log))
    }

    /// Query a transaction once; `Error::StillPending` until it is indexed
    pub async fn poll_status(&self, tx_hash: &str) -> Result<TransactionFinalStatus> {
        let response = self
            .transport
            .get(&format!("{}/{}", TXS_PATH, tx_hash))
            .await?;

        if is_not_found(&response) {
            debug!(%tx_hash, "Transaction not indexed yet");
            return Err(Error::StillPending(tx_hash.to_string()));
        }
        ensure_success(&response, "transaction query")?;

        let tx_response = response
            .body
            .get("tx_response")
            .ok_or_else(|| Error::Serialization("tx query response has no tx_response".to_string()))?;

        let height = tx_response.get("height").and_then(json_u64).unwrap_or(0);
        let code = tx_response.get("code").and_then(json_u64).unwrap_or(0) as u32;

        let status = if code == 0 {
            TransactionFinalStatus::Confirmed {
                height,
                gas_used: tx_response.get("gas_used").and_then(json_u64).unwrap_or(0),
            }
        } else {
            TransactionFinalStatus::Failed {
                height,
                code,
                log: tx_response
                    .get("raw_log")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        };

        info!(%tx_hash, height, code, "Transaction included");
        Ok(status)
    }
}

/// The chain encodes 64-bit integers as JSON strings; accept both forms
pub(crate) fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn is_not_found(response: &TransportResponse) -> bool {
    if response.status == 404 {
        return true;
    }
    if response.is_success() {
        return false;
    }

    let grpc_not_found = response.body.get("code").and_then(json_u64) == Some(GRPC_NOT_FOUND);
    let message_not_found = response
        .body
        .get("message")
        .and_then(Value::as_str)
        .map(|message| message.to_lowercase().contains("not found"))
        .unwrap_or(false);

    grpc_not_found || message_not_found
}

pub(crate) fn ensure_success(response: &TransportResponse, what: &str) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let message = response
        .body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.body.to_string());

    Err(Error::Network(format!(
        "{} failed with HTTP {}: {}",
        what, response.status, message
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_u64() {
        assert_eq!(json_u64(&json!("42")), Some(42));
        assert_eq!(json_u64(&json!(42)), Some(42));
        assert_eq!(json_u64(&json!("-1")), None);
        assert_eq!(json_u64(&json!(null)), None);
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found(&TransportResponse::new(404, json!({}))));
        assert!(is_not_found(&TransportResponse::new(
            500,
            json!({"code": 5, "message": "rpc error: code = NotFound"})
        )));
        assert!(is_not_found(&TransportResponse::new(
            400,
            json!({"code": 2, "message": "account ucc1x not found"})
        )));
        assert!(!is_not_found(&TransportResponse::new(500, json!({"code": 13, "message": "internal"}))));
        assert!(!is_not_found(&TransportResponse::new(200, json!({"account": {}}))));
    }

    #[test]
    fn test_ensure_success_reports_node_message() {
        let err = ensure_success(
            &TransportResponse::new(500, json!({"code": 13, "message": "internal"})),
            "account query",
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::Network("account query failed with HTTP 500: internal".to_string())
        );
    }
}
