//! Transaction signing

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use prost::Message as _;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature as EcdsaSignature};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::crypto::keys::{ethereum::keccak256, KeyPair, PublicKey};
use crate::error::{Error, Result};

use super::proto;
use super::sign_doc::SignDoc;

/// Public key type URL of Ethermint keys
pub const ETH_SECP256K1_PUBKEY_TYPE: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";
/// Public key type URL of plain Cosmos keys
pub const SECP256K1_PUBKEY_TYPE: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Digest and signature encoding, together with the key type the chain expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningScheme {
    /// Keccak-256 digest, 65-byte recoverable `r || s || v`
    #[default]
    EthSecp256k1,
    /// SHA-256 digest, 64-byte `r || s`
    Secp256k1,
}

impl SigningScheme {
    pub fn public_key_type_url(&self) -> &'static str {
        match self {
            Self::EthSecp256k1 => ETH_SECP256K1_PUBKEY_TYPE,
            Self::Secp256k1 => SECP256K1_PUBKEY_TYPE,
        }
    }

    /// Hash sign bytes into the 32-byte message that is signed
    pub fn digest(&self, sign_bytes: &[u8]) -> [u8; 32] {
        match self {
            Self::EthSecp256k1 => keccak256(sign_bytes),
            Self::Secp256k1 => Sha256::digest(sign_bytes).into(),
        }
    }

    pub fn signature_len(&self) -> usize {
        match self {
            Self::EthSecp256k1 => 65,
            Self::Secp256k1 => 64,
        }
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EthSecp256k1 => write!(f, "ethsecp256k1"),
            Self::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

impl FromStr for SigningScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ethsecp256k1" | "eth_secp256k1" => Ok(Self::EthSecp256k1),
            "secp256k1" => Ok(Self::Secp256k1),
            other => Err(Error::InvalidInput(format!("Unknown signing scheme: {}", other))),
        }
    }
}

/// A signature over sign bytes
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
    scheme: SigningScheme,
}

impl Signature {
    /// Wrap raw signature bytes, e.g. taken from a decoded `TxRaw`
    pub fn from_bytes(bytes: Vec<u8>, scheme: SigningScheme) -> Result<Self> {
        if bytes.len() != scheme.signature_len() {
            return Err(Error::Signing(format!(
                "expected {} signature bytes, got {}",
                scheme.signature_len(),
                bytes.len()
            )));
        }
        Ok(Self { bytes, scheme })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check this signature over `sign_bytes` against `public_key`.
    ///
    /// Recoverable signatures must also recover to the same key.
    pub fn verify(&self, sign_bytes: &[u8], public_key: &PublicKey) -> bool {
        if self.bytes.len() != self.scheme.signature_len() {
            return false;
        }

        let secp = Secp256k1::verification_only();
        let Ok(message) = Message::from_digest_slice(&self.scheme.digest(sign_bytes)) else {
            return false;
        };

        let verified = EcdsaSignature::from_compact(&self.bytes[..64])
            .map(|signature| secp.verify_ecdsa(&message, &signature, public_key.inner()).is_ok())
            .unwrap_or(false);

        match self.scheme {
            SigningScheme::Secp256k1 => verified,
            SigningScheme::EthSecp256k1 => {
                verified
                    && RecoveryId::from_i32(i32::from(self.bytes[64]))
                        .and_then(|id| RecoverableSignature::from_compact(&self.bytes[..64], id))
                        .and_then(|signature| secp.recover_ecdsa(&message, &signature))
                        .map(|recovered| &recovered == public_key.inner())
                        .unwrap_or(false)
            }
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("scheme", &self.scheme)
            .field("bytes", &hex::encode(&self.bytes))
            .finish()
    }
}

/// Signs sign docs with a key pair. Holds no state.
pub struct Signer;

impl Signer {
    /// Sign the canonical bytes of `sign_doc`
    pub fn sign(sign_doc: &SignDoc, key_pair: &KeyPair) -> Result<Signature> {
        if key_pair.public_key().compressed() != sign_doc.public_key {
            return Err(Error::Signing(
                "key pair does not match the sign doc's public key".to_string(),
            ));
        }

        Self::sign_bytes(&sign_doc.sign_bytes()?, sign_doc.scheme, key_pair)
    }

    /// Sign arbitrary bytes under `scheme`
    pub fn sign_bytes(sign_bytes: &[u8], scheme: SigningScheme, key_pair: &KeyPair) -> Result<Signature> {
        let secp = Secp256k1::signing_only();
        let secret_key = key_pair.private_key().secret_key()?;
        let message = Message::from_digest_slice(&scheme.digest(sign_bytes))
            .map_err(|e| Error::Signing(format!("Invalid digest: {}", e)))?;

        // libsecp256k1 only produces low-S signatures
        let bytes = match scheme {
            SigningScheme::EthSecp256k1 => {
                let (recovery_id, compact) = secp
                    .sign_ecdsa_recoverable(&message, &secret_key)
                    .serialize_compact();
                let mut bytes = compact.to_vec();
                bytes.push(recovery_id.to_i32() as u8);
                bytes
            }
            SigningScheme::Secp256k1 => secp.sign_ecdsa(&message, &secret_key).serialize_compact().to_vec(),
        };

        Ok(Signature { bytes, scheme })
    }

    /// Sign `sign_doc` and assemble the broadcast envelope
    pub fn sign_transaction(sign_doc: &SignDoc, key_pair: &KeyPair) -> Result<SignedTransaction> {
        let signature = Self::sign(sign_doc, key_pair)?;
        let signed = SignedTransaction {
            body_bytes: sign_doc.body_bytes(),
            auth_info_bytes: sign_doc.auth_info_bytes(),
            sign_doc: sign_doc.clone(),
            signature,
        };

        debug!(tx_hash = %signed.tx_hash(), sequence = sign_doc.sequence, "Signed transaction");
        Ok(signed)
    }
}

/// A sign doc together with its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    sign_doc: SignDoc,
    signature: Signature,
    body_bytes: Vec<u8>,
    auth_info_bytes: Vec<u8>,
}

impl SignedTransaction {
    pub fn sign_doc(&self) -> &SignDoc {
        &self.sign_doc
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Protobuf `TxRaw` bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        proto::TxRaw {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            signatures: vec![self.signature.bytes.clone()],
        }
        .encode_to_vec()
    }

    /// Standard base64 of the `TxRaw` bytes, as posted to the node
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
    }

    /// Upper-case hex SHA-256 of the `TxRaw` bytes
    pub fn tx_hash(&self) -> String {
        hex::encode_upper(Sha256::digest(self.to_bytes()))
    }

    /// Verify the signature against the sign doc's own public key
    pub fn verify(&self) -> Result<bool> {
        let public_key = PublicKey::from_slice(&self.sign_doc.public_key)?;
        Ok(self.signature.verify(&self.sign_doc.sign_bytes()?, &public_key))
    }
}
