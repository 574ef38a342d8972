//! Delegation proofs: pre-signed authorization for a second keypair.
//!
//! An owner wallet signs the canonical proof bytes once, authorizing a
//! delegated keypair to issue action codes on its behalf until `expires_at`.
//! The proof is immutable; its signature is never regenerated by the core.

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::crypto;
use crate::error::ProtocolError;

/// Maximum allowed lifetime of a delegation proof: one year.
pub const MAX_PROOF_LIFETIME_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// An owner's signed authorization for a delegated keypair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationProof {
    /// The owner wallet that signed the proof.
    pub wallet_pubkey: String,

    /// The keypair authorized to issue codes.
    pub delegated_pubkey: String,

    /// Chain identifier the proof is valid on.
    pub chain: String,

    /// Expiration of the authorization (Unix ms).
    pub expires_at: i64,

    /// Owner signature over the canonical proof bytes (base58).
    pub signature: String,
}

impl DelegationProof {
    /// The canonical pre-signature bytes of this proof.
    ///
    /// These are the bytes the owner wallet signed; the `signature` field is
    /// excluded.
    pub fn message_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        canonical::delegation_proof_message(
            &self.wallet_pubkey,
            &self.delegated_pubkey,
            self.expires_at,
            &self.chain,
        )
    }

    /// Structural and temporal validation of the proof at time `now`.
    ///
    /// Checks presence, chain-specific pubkey syntax, expiry, and the
    /// one-year lifetime cap. Signature verification is a separate,
    /// chain-adapter concern.
    pub fn validate(&self, now: i64) -> Result<(), ProtocolError> {
        // 1. Presence
        if self.wallet_pubkey.is_empty() {
            return Err(ProtocolError::MissingRequiredField {
                field: "walletPubkey",
            });
        }
        if self.delegated_pubkey.is_empty() {
            return Err(ProtocolError::MissingRequiredField {
                field: "delegatedPubkey",
            });
        }
        if self.chain.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "chain" });
        }
        if self.signature.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "signature" });
        }

        // 2. Pubkey syntax. Ed25519 chains carry base58 32-byte keys.
        if self.chain == "solana" {
            crypto::decode_pubkey("walletPubkey", &self.wallet_pubkey)?;
            crypto::decode_pubkey("delegatedPubkey", &self.delegated_pubkey)?;
        }

        // 3. Temporal bounds
        if self.expires_at <= now {
            return Err(ProtocolError::ExpiredCode {
                detail: format!(
                    "delegation proof expired at {} (now {})",
                    self.expires_at, now
                ),
            });
        }
        if self.expires_at > now + MAX_PROOF_LIFETIME_MS {
            return Err(ProtocolError::InvalidInput {
                field: "expiresAt",
                detail: "delegation proof expires more than 365 days in the future".into(),
            });
        }

        Ok(())
    }
}
