//! Sign-doc construction
//!
//! A [`SignDoc`] is the pure value a signature commits to. It renders to one
//! of two canonical byte forms depending on [`SignMode`], and to the
//! protobuf `TxBody` / `AuthInfo` pair carried by the broadcast envelope.

use std::fmt;
use std::str::FromStr;

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::account::address::from_alt_format_with_hrp;
use crate::account::identity::Identity;
use crate::error::{Error, Result};

use super::proto;
use super::signer::SigningScheme;
use super::types::{AccountInfo, Coin, Fee, TransferMessage};

/// Amino type name of a bank send
pub const AMINO_MSG_SEND: &str = "cosmos-sdk/MsgSend";

/// Longest memo the chain accepts by default
pub const MAX_MEMO_CHARS: usize = 256;

/// Canonical serialization signed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignMode {
    /// Sorted-key compact `StdSignDoc` JSON
    #[default]
    LegacyAminoJson,
    /// Protobuf `SignDoc`
    Direct,
}

impl SignMode {
    /// Value of the `SignMode` enum in `AuthInfo`
    pub fn proto_value(&self) -> i32 {
        match self {
            Self::LegacyAminoJson => proto::SIGN_MODE_LEGACY_AMINO_JSON,
            Self::Direct => proto::SIGN_MODE_DIRECT,
        }
    }
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegacyAminoJson => write!(f, "amino-json"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for SignMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "amino-json" | "amino" | "legacy-amino-json" => Ok(Self::LegacyAminoJson),
            "direct" => Ok(Self::Direct),
            other => Err(Error::InvalidInput(format!("Unknown sign mode: {}", other))),
        }
    }
}

/// Everything a transfer signature commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignDoc {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub fee: Fee,
    pub messages: Vec<TransferMessage>,
    pub memo: String,
    /// Signer's compressed public key
    pub public_key: [u8; 33],
    pub scheme: SigningScheme,
    pub mode: SignMode,
}

impl SignDoc {
    /// The bytes a signature is computed over
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        match self.mode {
            SignMode::LegacyAminoJson => Ok(self.amino_json()?.into_bytes()),
            SignMode::Direct => Ok(proto::SignDoc {
                body_bytes: self.body_bytes(),
                auth_info_bytes: self.auth_info_bytes(),
                chain_id: self.chain_id.clone(),
                account_number: self.account_number,
            }
            .encode_to_vec()),
        }
    }

    /// Canonical `StdSignDoc` JSON.
    ///
    /// Keys are sorted at every level, integers are decimal strings, and
    /// `<`, `>` and `&` are escaped the way Go's encoder does.
    pub fn amino_json(&self) -> Result<String> {
        let msgs: Vec<serde_json::Value> = self
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "type": AMINO_MSG_SEND,
                    "value": {
                        "amount": [amino_coin(&msg.amount)],
                        "from_address": msg.from,
                        "to_address": msg.to,
                    }
                })
            })
            .collect();

        let doc = json!({
            "account_number": self.account_number.to_string(),
            "chain_id": self.chain_id,
            "fee": {
                "amount": [amino_coin(&self.fee.amount)],
                "gas": self.fee.gas_limit.to_string(),
            },
            "memo": self.memo,
            "msgs": msgs,
            "sequence": self.sequence.to_string(),
        });

        let compact = serde_json::to_string(&sort_keys(doc))?;
        Ok(escape_html(&compact))
    }

    /// Protobuf `TxBody` bytes
    pub fn body_bytes(&self) -> Vec<u8> {
        let messages = self
            .messages
            .iter()
            .map(|msg| {
                proto::Any::pack(
                    proto::MSG_SEND_TYPE_URL,
                    &proto::MsgSend {
                        from_address: msg.from.clone(),
                        to_address: msg.to.clone(),
                        amount: vec![proto_coin(&msg.amount)],
                    },
                )
            })
            .collect();

        proto::TxBody {
            messages,
            memo: self.memo.clone(),
            timeout_height: 0,
        }
        .encode_to_vec()
    }

    /// Protobuf `AuthInfo` bytes: signer key, sequence, sign mode and fee
    pub fn auth_info_bytes(&self) -> Vec<u8> {
        let signer_info = proto::SignerInfo {
            public_key: Some(self.public_key_any()),
            mode_info: Some(proto::ModeInfo {
                single: Some(proto::ModeInfoSingle {
                    mode: self.mode.proto_value(),
                }),
            }),
            sequence: self.sequence,
        };

        proto::AuthInfo {
            signer_infos: vec![signer_info],
            fee: Some(proto::Fee {
                amount: vec![proto_coin(&self.fee.amount)],
                gas_limit: self.fee.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        }
        .encode_to_vec()
    }

    /// The signer's public key packed under the scheme's type URL
    pub fn public_key_any(&self) -> proto::Any {
        proto::Any::pack(
            self.scheme.public_key_type_url(),
            &proto::PubKey {
                key: self.public_key.to_vec(),
            },
        )
    }
}

/// Builds sign docs for one scheme and mode
#[derive(Debug, Clone, Copy, Default)]
pub struct SignDocBuilder {
    scheme: SigningScheme,
    mode: SignMode,
}

impl SignDocBuilder {
    pub fn new(scheme: SigningScheme, mode: SignMode) -> Self {
        Self { scheme, mode }
    }

    /// Build the sign doc for a single transfer
    pub fn build(
        &self,
        identity: &Identity,
        account: &AccountInfo,
        message: &TransferMessage,
        fee: &Fee,
        chain_id: &str,
        memo: &str,
    ) -> Result<SignDoc> {
        if message.from != identity.chain_address() {
            return Err(Error::InvalidInput(
                "transfer sender is not the signing identity".to_string(),
            ));
        }
        if message.amount.amount.is_zero() {
            return Err(Error::InvalidAmount("amount must be greater than zero".to_string()));
        }
        if chain_id.is_empty() {
            return Err(Error::InvalidInput("chain id must not be empty".to_string()));
        }
        if memo.chars().count() > MAX_MEMO_CHARS {
            return Err(Error::InvalidInput(format!(
                "memo longer than {} characters",
                MAX_MEMO_CHARS
            )));
        }

        let hrp = identity
            .chain_address()
            .rsplit_once('1')
            .map(|(hrp, _)| hrp)
            .unwrap_or_default();
        from_alt_format_with_hrp(&message.to, hrp)?;

        let sign_doc = SignDoc {
            chain_id: chain_id.to_string(),
            account_number: account.account_number,
            sequence: account.sequence,
            fee: fee.clone(),
            messages: vec![message.clone()],
            memo: memo.to_string(),
            public_key: identity.compressed_public_key(),
            scheme: self.scheme,
            mode: self.mode,
        };

        debug!(
            chain_id = %sign_doc.chain_id,
            account_number = sign_doc.account_number,
            sequence = sign_doc.sequence,
            mode = %sign_doc.mode,
            "Built sign doc"
        );

        Ok(sign_doc)
    }
}

fn amino_coin(coin: &Coin) -> serde_json::Value {
    json!({
        "amount": coin.amount.to_string(),
        "denom": coin.denom,
    })
}

fn proto_coin(coin: &Coin) -> proto::Coin {
    proto::Coin {
        denom: coin.denom.clone(),
        amount: coin.amount.to_string(),
    }
}

/// Rebuild every object with lexicographically ordered keys
fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(String, serde_json::Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

/// `<`, `>` and `&` only occur inside string literals of compact JSON
fn escape_html(json: &str) -> String {
    json.replace('&', "\\u0026")
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::U256;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const RECIPIENT: &str = "ucc1qqqsyqcyq5rqwzqfpg9scrgwpugpzysng5wwka";

    fn fixture(memo: &str, mode: SignMode) -> SignDoc {
        let identity = Identity::from_seed_phrase(ABANDON).unwrap();
        let message = TransferMessage {
            from: identity.chain_address().to_string(),
            to: RECIPIENT.to_string(),
            amount: Coin::new("atucc", U256::from(1_500_000_000_000_000_000u128)),
        };
        let fee = Fee {
            amount: Coin::new("atucc", U256::from(4_000_000_000_000_000u64)),
            gas_limit: 200_000,
        };

        SignDocBuilder::new(SigningScheme::EthSecp256k1, mode)
            .build(&identity, &AccountInfo::new(5, 2), &message, &fee, "ucc_9000-1", memo)
            .unwrap()
    }

    #[test]
    fn test_amino_json_layout() {
        let json = fixture("", SignMode::LegacyAminoJson).amino_json().unwrap();
        let expected = concat!(
            r#"{"account_number":"5","chain_id":"ucc_9000-1","#,
            r#""fee":{"amount":[{"amount":"4000000000000000","denom":"atucc"}],"gas":"200000"},"#,
            r#""memo":"","msgs":[{"type":"cosmos-sdk/MsgSend","value":{"#,
            r#""amount":[{"amount":"1500000000000000000","denom":"atucc"}],"#,
            r#""from_address":"ucc1npvwllfr9dqr8erajqqr6s0vxnk2ak55zjdlc7","#,
            r#""to_address":"ucc1qqqsyqcyq5rqwzqfpg9scrgwpugpzysng5wwka"}}],"sequence":"2"}"#
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn test_amino_json_escapes_html() {
        let json = fixture("<a & b>", SignMode::LegacyAminoJson).amino_json().unwrap();
        assert!(json.contains(r#""memo":"\u003ca \u0026 b\u003e""#));
        assert!(!json.contains('<'));
    }

    #[test]
    fn test_builds_are_deterministic() {
        for mode in [SignMode::LegacyAminoJson, SignMode::Direct] {
            let first = fixture("memo", mode);
            let second = fixture("memo", mode);
            assert_eq!(first.sign_bytes().unwrap(), second.sign_bytes().unwrap());
            assert_eq!(first.body_bytes(), second.body_bytes());
        }
    }

    #[test]
    fn test_direct_sign_doc_embeds_envelope_parts() {
        let doc = fixture("", SignMode::Direct);
        let decoded = proto::SignDoc::decode(doc.sign_bytes().unwrap().as_slice()).unwrap();

        assert_eq!(decoded.body_bytes, doc.body_bytes());
        assert_eq!(decoded.auth_info_bytes, doc.auth_info_bytes());
        assert_eq!(decoded.chain_id, "ucc_9000-1");
        assert_eq!(decoded.account_number, 5);
    }

    #[test]
    fn test_auth_info_carries_key_sequence_and_mode() {
        let doc = fixture("", SignMode::LegacyAminoJson);
        let auth_info = proto::AuthInfo::decode(doc.auth_info_bytes().as_slice()).unwrap();
        let signer = &auth_info.signer_infos[0];

        assert_eq!(signer.sequence, 2);
        assert_eq!(
            signer.mode_info.as_ref().unwrap().single.as_ref().unwrap().mode,
            proto::SIGN_MODE_LEGACY_AMINO_JSON
        );

        let key = signer.public_key.as_ref().unwrap();
        assert_eq!(key.type_url, "/ethermint.crypto.v1.ethsecp256k1.PubKey");
        let pub_key = proto::PubKey::decode(key.value.as_slice()).unwrap();
        assert_eq!(
            hex::encode(pub_key.key),
            "0237b0bb7a8288d38ed49a524b5dc98cff3eb5ca824c9f9dc0dfdb3d9cd600f299"
        );

        let fee = auth_info.fee.unwrap();
        assert_eq!(fee.gas_limit, 200_000);
        assert_eq!(fee.amount[0].amount, "4000000000000000");
    }

    #[test]
    fn test_build_rejects_foreign_sender_and_zero_amount() {
        let identity = Identity::from_seed_phrase(ABANDON).unwrap();
        let fee = Fee {
            amount: Coin::new("atucc", U256::from(1u64)),
            gas_limit: 1,
        };
        let builder = SignDocBuilder::default();

        let foreign = TransferMessage {
            from: RECIPIENT.to_string(),
            to: identity.chain_address().to_string(),
            amount: Coin::new("atucc", U256::from(1u64)),
        };
        assert!(matches!(
            builder.build(&identity, &AccountInfo::default(), &foreign, &fee, "ucc_9000-1", ""),
            Err(Error::InvalidInput(_))
        ));

        let zero = TransferMessage {
            from: identity.chain_address().to_string(),
            to: RECIPIENT.to_string(),
            amount: Coin::new("atucc", U256::zero()),
        };
        assert!(matches!(
            builder.build(&identity, &AccountInfo::default(), &zero, &fee, "ucc_9000-1", ""),
            Err(Error::InvalidAmount(_))
        ));

        let bad_recipient = TransferMessage {
            from: identity.chain_address().to_string(),
            to: "ucc1notanaddress".to_string(),
            amount: Coin::new("atucc", U256::from(1u64)),
        };
        assert!(matches!(
            builder.build(&identity, &AccountInfo::default(), &bad_recipient, &fee, "ucc_9000-1", ""),
            Err(Error::AddressDecode(_))
        ));
    }

    #[test]
    fn test_sign_mode_parsing() {
        assert_eq!("amino-json".parse::<SignMode>().unwrap(), SignMode::LegacyAminoJson);
        assert_eq!("DIRECT".parse::<SignMode>().unwrap(), SignMode::Direct);
        assert!("textual".parse::<SignMode>().is_err());
        assert_eq!(SignMode::default().proto_value(), 127);
    }
}
