//! Balance reader

use std::sync::Arc;

use ethers_core::types::U256;
use serde_json::Value;
use tracing::debug;

use crate::config::WalletConfig;
use crate::error::{Error, Result};

use super::amount::format_display_amount;
use super::client::ensure_success;
use super::provider::Transport;

const BALANCES_PATH: &str = "/cosmos/bank/v1beta1/balances";

/// Decimal places shown for display balances
pub const DISPLAY_PLACES: u32 = 2;

/// Reads one denomination's balance from the bank module
#[derive(Clone)]
pub struct BalanceReader {
    transport: Arc<dyn Transport>,
    denom: String,
    decimals: u32,
}

impl BalanceReader {
    pub fn new(transport: Arc<dyn Transport>, denom: impl Into<String>, decimals: u32) -> Self {
        Self {
            transport,
            denom: denom.into(),
            decimals,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &WalletConfig) -> Self {
        Self::new(transport, config.denom.clone(), config.decimals)
    }

    /// Balance in display units with two truncated decimals; `"0"` when the denom is absent
    pub async fn get_balance(&self, address: &str) -> Result<String> {
        Ok(match self.find_balance(address).await? {
            Some(units) => format_display_amount(units, self.decimals, DISPLAY_PLACES),
            None => "0".to_string(),
        })
    }

    /// Balance in minimal units; zero when the denom is absent
    pub async fn get_raw_balance(&self, address: &str) -> Result<U256> {
        Ok(self.find_balance(address).await?.unwrap_or_default())
    }

    async fn find_balance(&self, address: &str) -> Result<Option<U256>> {
        let response = self
            .transport
            .get(&format!("{}/{}", BALANCES_PATH, address))
            .await?;
        ensure_success(&response, "balance query")?;

        let entry = response
            .body
            .get("balances")
            .and_then(Value::as_array)
            .and_then(|balances| {
                balances
                    .iter()
                    .find(|coin| coin.get("denom").and_then(Value::as_str) == Some(self.denom.as_str()))
            });

        let Some(entry) = entry else {
            debug!(%address, denom = %self.denom, "No balance entry");
            return Ok(None);
        };

        let amount = entry
            .get("amount")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Serialization("balance entry has no amount".to_string()))?;
        let units = U256::from_dec_str(amount)
            .map_err(|e| Error::Serialization(format!("Invalid balance amount: {}", e)))?;

        debug!(%address, denom = %self.denom, %units, "Fetched balance");
        Ok(Some(units))
    }
}
