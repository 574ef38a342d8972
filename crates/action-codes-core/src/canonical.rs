//! Canonical message construction.
//!
//! The messages signed by wallets are compact JSON objects with a pinned key
//! order. Determinism is load-bearing: the same inputs must produce the same
//! bytes on every platform, because the signature over those bytes is the
//! entropy source for code derivation and the anchor for later verification.
//!
//! Key order is pinned by struct field declaration order. String fields are
//! restricted to a character set for which JSON escaping is the identity, so
//! the serialized bytes are fully determined by the field values. Timestamps
//! are `i64` milliseconds and serialize as plain base-10 integers, never in
//! exponent notation.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Discriminator of the generation message.
pub const GENERATION_MESSAGE_ID: &str = "actioncodes";

/// Discriminator of the revoke message.
pub const REVOKE_MESSAGE_ID: &str = "actioncodes-revoke";

/// Version of the canonical message layout.
pub const CANONICAL_MESSAGE_VERSION: u32 = 1;

/// Maximum length of any string field in a canonical message.
pub const MAX_FIELD_CHARS: usize = 100;

#[derive(Serialize)]
struct GenerationMessage<'a> {
    id: &'static str,
    ver: u32,
    pubkey: &'a str,
    #[serde(rename = "windowStart")]
    window_start: i64,
}

#[derive(Serialize)]
struct RevokeMessage<'a> {
    id: &'static str,
    ver: u32,
    pubkey: &'a str,
    #[serde(rename = "codeHash")]
    code_hash: &'a str,
    #[serde(rename = "windowStart")]
    window_start: i64,
}

#[derive(Serialize)]
struct DelegationProofMessage<'a> {
    #[serde(rename = "walletPubkey")]
    wallet_pubkey: &'a str,
    #[serde(rename = "delegatedPubkey")]
    delegated_pubkey: &'a str,
    #[serde(rename = "expiresAt")]
    expires_at: i64,
    chain: &'a str,
}

/// The fields the protocol core reads back out of a generation message.
///
/// Anything else in the message is tolerated and ignored: the message is an
/// opaque envelope beyond these two fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationEnvelope {
    pub pubkey: String,
    #[serde(rename = "windowStart")]
    pub window_start: i64,
}

/// Reject a string field that would break canonical byte determinism.
///
/// Fields must be non-empty, at most 100 characters, and free of `"`, `\`,
/// and C0/C1 control characters, so JSON escaping never rewrites them.
fn check_field(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::InvalidInput {
            field,
            detail: "must not be empty".into(),
        });
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ProtocolError::InvalidInput {
            field,
            detail: format!("exceeds {MAX_FIELD_CHARS} characters"),
        });
    }
    for ch in value.chars() {
        let cp = ch as u32;
        if ch == '"' || ch == '\\' || cp < 0x20 || (0x7f..=0x9f).contains(&cp) {
            return Err(ProtocolError::InvalidInput {
                field,
                detail: format!("contains forbidden character U+{cp:04X}"),
            });
        }
    }
    Ok(())
}

fn to_canonical_bytes<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(|e| ProtocolError::CryptoError {
        detail: format!("canonical serialization failed: {e}"),
    })
}

/// Canonical generation message bytes for `(pubkey, window_start)`.
///
/// Layout: `{"id":"actioncodes","ver":1,"pubkey":<P>,"windowStart":<T>}`.
pub fn generation_message(pubkey: &str, window_start: i64) -> Result<Vec<u8>, ProtocolError> {
    check_field("pubkey", pubkey)?;
    to_canonical_bytes(&GenerationMessage {
        id: GENERATION_MESSAGE_ID,
        ver: CANONICAL_MESSAGE_VERSION,
        pubkey,
        window_start,
    })
}

/// Canonical revoke message bytes for `(pubkey, code_hash, window_start)`.
///
/// Layout: `{"id":"actioncodes-revoke","ver":1,"pubkey":<P>,"codeHash":<H>,"windowStart":<T>}`.
pub fn revoke_message(
    pubkey: &str,
    code_hash: &str,
    window_start: i64,
) -> Result<Vec<u8>, ProtocolError> {
    check_field("pubkey", pubkey)?;
    check_field("codeHash", code_hash)?;
    to_canonical_bytes(&RevokeMessage {
        id: REVOKE_MESSAGE_ID,
        ver: CANONICAL_MESSAGE_VERSION,
        pubkey,
        code_hash,
        window_start,
    })
}

/// Canonical pre-signature bytes of a delegation proof.
///
/// The proof's own signature field is excluded: these are the bytes the
/// owner wallet signs.
/// Layout: `{"walletPubkey":<W>,"delegatedPubkey":<D>,"expiresAt":<E>,"chain":<C>}`.
pub fn delegation_proof_message(
    wallet_pubkey: &str,
    delegated_pubkey: &str,
    expires_at: i64,
    chain: &str,
) -> Result<Vec<u8>, ProtocolError> {
    check_field("walletPubkey", wallet_pubkey)?;
    check_field("delegatedPubkey", delegated_pubkey)?;
    check_field("chain", chain)?;
    to_canonical_bytes(&DelegationProofMessage {
        wallet_pubkey,
        delegated_pubkey,
        expires_at,
        chain,
    })
}

/// Extract `pubkey` and `windowStart` from generation message bytes.
pub fn parse_generation_message(bytes: &[u8]) -> Result<GenerationEnvelope, ProtocolError> {
    let envelope: GenerationEnvelope =
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidInput {
            field: "canonicalMessage",
            detail: format!("not a generation message: {e}"),
        })?;
    check_field("pubkey", &envelope.pubkey)?;
    Ok(envelope)
}
