//! Single-send orchestration
//!
//! A send validates locally, fetches fresh account state, signs and
//! broadcasts exactly once. At most one send per identity is in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::address::normalize_recipient;
use crate::account::identity::Identity;
use crate::config::WalletConfig;
use crate::error::{Error, Result};

use super::amount::parse_display_amount;
use super::client::ChainClient;
use super::sign_doc::SignDocBuilder;
use super::signer::Signer;
use super::types::{Coin, SendState, TransactionFinalStatus, TransactionResult, TransferMessage};

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub state: SendState,
    pub result: TransactionResult,
    /// Hash of the broadcast envelope
    pub tx_hash: String,
}

/// Removes its address from the in-flight set when dropped
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    address: String,
}

impl InFlightGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, address: &str) -> Result<Self> {
        let mut active = in_flight
            .lock()
            .map_err(|_| Error::Storage("in-flight set lock poisoned".to_string()))?;

        if !active.insert(address.to_string()) {
            return Err(Error::SendInProgress(address.to_string()));
        }

        Ok(Self {
            in_flight: Arc::clone(in_flight),
            address: address.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.in_flight.lock() {
            active.remove(&self.address);
        }
    }
}

/// Builds, signs and broadcasts transfers
pub struct SendFlow {
    client: ChainClient,
    config: WalletConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SendFlow {
    pub fn new(client: ChainClient, config: WalletConfig) -> Self {
        Self {
            client,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Send `display_amount` of the display denomination from `identity` to `to`.
    ///
    /// `to` may be in either address format. Recipient and amount are
    /// validated before any network call. A rejection by the node is a
    /// receipt in state `Broadcast(Rejected)`, not an error. A broadcast
    /// request that fails in transit gives `Broadcast(Unknown)` with the
    /// local hash, which can still be confirmed.
    pub async fn send(
        &self,
        identity: &Identity,
        to: &str,
        display_amount: &str,
        memo: &str,
    ) -> Result<SendReceipt> {
        let recipient = normalize_recipient(to, &self.config.hrp)?;
        let amount = parse_display_amount(display_amount, self.config.decimals)?;

        let _guard = InFlightGuard::acquire(&self.in_flight, identity.chain_address())?;
        let mut state = SendState::Building;

        let account = self
            .client
            .fetch_account_or_default(identity.chain_address())
            .await?;

        let message = TransferMessage {
            from: identity.chain_address().to_string(),
            to: recipient,
            amount: Coin::new(&self.config.denom, amount),
        };

        let sign_doc = SignDocBuilder::new(self.config.scheme, self.config.sign_mode).build(
            identity,
            &account,
            &message,
            &self.config.fee(),
            &self.config.chain_id,
            memo,
        )?;
        let signed = Signer::sign_transaction(&sign_doc, identity.key_pair())?;
        state = advance(state, SendState::Signed);

        let tx_hash = signed.tx_hash();
        let result = self.client.broadcast(&signed).await?;

        let outcome = result.outcome();
        state = advance(state, SendState::Broadcast(outcome));

        info!(
            from = %message.from,
            to = %message.to,
            amount = %message.amount,
            %tx_hash,
            ?outcome,
            "Send finished"
        );

        Ok(SendReceipt {
            state,
            tx_hash: result.tx_hash.clone().unwrap_or(tx_hash),
            result,
        })
    }

    /// Poll once for the final status of an accepted or unanswered send.
    ///
    /// Advances the receipt to `Confirmed` or `Failed`; returns
    /// `Error::StillPending` while the transaction is not yet included.
    pub async fn confirm(&self, receipt: &mut SendReceipt) -> Result<TransactionFinalStatus> {
        if !receipt.state.is_pollable() {
            return Err(Error::InvalidInput(format!(
                "cannot confirm a send in state {:?}",
                receipt.state
            )));
        }

        let status = self.client.poll_status(&receipt.tx_hash).await?;
        receipt.state = match &status {
            TransactionFinalStatus::Confirmed { .. } => SendState::Confirmed,
            TransactionFinalStatus::Failed { code, log, .. } => {
                warn!(tx_hash = %receipt.tx_hash, code, log = %log, "Transaction failed on chain");
                SendState::Failed
            }
        };

        Ok(status)
    }
}

fn advance(from: SendState, to: SendState) -> SendState {
    tracing::debug!(?from, ?to, "Send state");
    to
}
