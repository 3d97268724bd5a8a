//! Chain and provider configuration
//!
//! Defaults describe the UCC network; every field can be overridden from the
//! environment with `WalletConfig::from_env`.

use std::str::FromStr;

use ethers_core::types::U256;

use crate::error::{Error, Result};
use crate::transaction::{Coin, Fee, SignMode, SigningScheme};

pub const DEFAULT_CHAIN_ID: &str = "ucc_9000-1";
pub const DEFAULT_HRP: &str = "ucc";
pub const DEFAULT_DENOM: &str = "atucc";
pub const DEFAULT_DISPLAY_DENOM: &str = "UCC";
pub const DEFAULT_DECIMALS: u32 = 18;
pub const DEFAULT_LCD_URL: &str = "http://145.223.80.193:1317";
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
/// 200k gas at 20 gwei-equivalent atucc per gas
pub const DEFAULT_FEE_AMOUNT: u64 = 4_000_000_000_000_000;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the node's REST (LCD) endpoint
    pub url: String,
    /// API key (if required), sent as `x-api-key`
    pub api_key: Option<String>,
    /// Timeout in seconds; `None` leaves deadlines to the caller
    pub timeout: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LCD_URL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

/// Everything the core needs to know about the target chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub chain_id: String,
    /// Human-readable prefix of chain addresses
    pub hrp: String,
    /// Minimal-unit denomination
    pub denom: String,
    pub display_denom: String,
    /// Decimal places between `display_denom` and `denom`
    pub decimals: u32,
    /// Fixed fee, in `denom` minimal units
    pub fee_amount: U256,
    pub gas_limit: u64,
    pub sign_mode: SignMode,
    pub scheme: SigningScheme,
    pub provider: ProviderConfig,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            hrp: DEFAULT_HRP.to_string(),
            denom: DEFAULT_DENOM.to_string(),
            display_denom: DEFAULT_DISPLAY_DENOM.to_string(),
            decimals: DEFAULT_DECIMALS,
            fee_amount: U256::from(DEFAULT_FEE_AMOUNT),
            gas_limit: DEFAULT_GAS_LIMIT,
            sign_mode: SignMode::default(),
            scheme: SigningScheme::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl WalletConfig {
    /// Load configuration from `UCC_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fee_amount = match lookup("UCC_FEE_AMOUNT") {
            Some(raw) => U256::from_dec_str(raw.trim())
                .map_err(|e| Error::Config(format!("UCC_FEE_AMOUNT: {}", e)))?,
            None => defaults.fee_amount,
        };

        let config = Self {
            chain_id: lookup("UCC_CHAIN_ID").unwrap_or(defaults.chain_id),
            hrp: lookup("UCC_HRP").unwrap_or(defaults.hrp).to_lowercase(),
            denom: lookup("UCC_DENOM").unwrap_or(defaults.denom),
            display_denom: lookup("UCC_DISPLAY_DENOM").unwrap_or(defaults.display_denom),
            decimals: parse_var(&lookup, "UCC_DECIMALS")?.unwrap_or(defaults.decimals),
            fee_amount,
            gas_limit: parse_var(&lookup, "UCC_GAS_LIMIT")?.unwrap_or(defaults.gas_limit),
            sign_mode: parse_var(&lookup, "UCC_SIGN_MODE")?.unwrap_or(defaults.sign_mode),
            scheme: parse_var(&lookup, "UCC_KEY_SCHEME")?.unwrap_or(defaults.scheme),
            provider: ProviderConfig {
                url: lookup("UCC_LCD_URL").unwrap_or(defaults.provider.url),
                api_key: lookup("UCC_API_KEY"),
                timeout: parse_var(&lookup, "UCC_HTTP_TIMEOUT")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the core cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chain_id.is_empty() {
            return Err(Error::Config("chain id must not be empty".to_string()));
        }
        if self.hrp.is_empty() || self.denom.is_empty() {
            return Err(Error::Config("address prefix and denom must not be empty".to_string()));
        }
        // 10^77 is the largest power of ten a U256 holds
        if self.decimals > 77 {
            return Err(Error::Config(format!("unsupported decimals: {}", self.decimals)));
        }
        if self.gas_limit == 0 {
            return Err(Error::Config("gas limit must be positive".to_string()));
        }
        Ok(())
    }

    /// The fixed fee attached to every transaction
    pub fn fee(&self) -> Fee {
        Fee {
            amount: Coin::new(&self.denom, self.fee_amount),
            gas_limit: self.gas_limit,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("{}: {}", name, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WalletConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, WalletConfig::default());
        assert_eq!(config.denom, "atucc");
        assert_eq!(config.decimals, 18);

        let fee = config.fee();
        assert_eq!(fee.gas_limit, 200_000);
        assert_eq!(fee.amount.amount, U256::from(4_000_000_000_000_000u64));
    }

    #[test]
    fn test_overrides() {
        let config = WalletConfig::from_lookup(lookup_from(&[
            ("UCC_CHAIN_ID", "ucc_1-1"),
            ("UCC_LCD_URL", "http://localhost:1317"),
            ("UCC_SIGN_MODE", "direct"),
            ("UCC_KEY_SCHEME", "secp256k1"),
            ("UCC_GAS_LIMIT", "300000"),
            ("UCC_HTTP_TIMEOUT", "15"),
            ("UCC_FEE_AMOUNT", "6000000000000000"),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, "ucc_1-1");
        assert_eq!(config.provider.url, "http://localhost:1317");
        assert_eq!(config.provider.timeout, Some(15));
        assert_eq!(config.sign_mode, SignMode::Direct);
        assert_eq!(config.scheme, SigningScheme::Secp256k1);
        assert_eq!(config.gas_limit, 300_000);
        assert_eq!(config.fee_amount, U256::from(6_000_000_000_000_000u64));
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = WalletConfig::from_lookup(lookup_from(&[("UCC_GAS_LIMIT", "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("UCC_GAS_LIMIT")));

        let err = WalletConfig::from_lookup(lookup_from(&[("UCC_SIGN_MODE", "textual")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = WalletConfig::from_lookup(lookup_from(&[("UCC_GAS_LIMIT", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
