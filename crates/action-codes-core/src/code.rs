//! Action code records.
//!
//! Records are immutable values: a strategy constructs them once and nothing
//! mutates them afterwards. Expiration is a property of the clock, not of
//! the record.

use serde::{Deserialize, Serialize};

use crate::delegation::DelegationProof;

/// A short-lived numeric code bound to a public key and a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCode {
    /// The N-digit decimal code.
    pub code: String,

    /// The public key the code is bound to (chain-specific encoding).
    pub pubkey: String,

    /// Start of the time window (Unix ms); anchors the canonical message.
    pub timestamp: i64,

    /// `timestamp + ttl_ms`.
    pub expires_at: i64,

    /// Chain identifier, e.g. `"solana"`.
    pub chain: String,

    /// The wallet signature the code was derived from (base58 for Ed25519).
    pub signature: String,
}

impl ActionCode {
    /// Whether the code is expired at `now`, with `clock_skew_ms` tolerance.
    pub fn is_expired(&self, now: i64, clock_skew_ms: i64) -> bool {
        now > self.expires_at + clock_skew_ms
    }

    /// Milliseconds of validity remaining at `now` (zero if expired).
    pub fn remaining_ms(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}

/// An action code issued under a delegation proof.
///
/// The code's `pubkey` is the proof's delegated key, and the code must not
/// outlive the proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatedActionCode {
    #[serde(flatten)]
    pub action_code: ActionCode,

    /// The pre-signed authorization this code was issued under.
    pub delegation_proof: DelegationProof,
}

/// A code issued by either strategy.
///
/// This is the dispatch tag the protocol façade routes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuedCode {
    Delegated(DelegatedActionCode),
    Wallet(ActionCode),
}

impl IssuedCode {
    /// The underlying action code record.
    pub fn action_code(&self) -> &ActionCode {
        match self {
            IssuedCode::Wallet(code) => code,
            IssuedCode::Delegated(code) => &code.action_code,
        }
    }

    /// The decimal code string.
    pub fn code(&self) -> &str {
        &self.action_code().code
    }

    /// The chain this code belongs to.
    pub fn chain(&self) -> &str {
        &self.action_code().chain
    }

    /// The delegation proof, if this code was issued in delegated mode.
    pub fn delegation_proof(&self) -> Option<&DelegationProof> {
        match self {
            IssuedCode::Wallet(_) => None,
            IssuedCode::Delegated(code) => Some(&code.delegation_proof),
        }
    }
}

/// Receipt of a revocation.
///
/// The core stores nothing: holding a record whose `revoke_signature`
/// verifies against the canonical revoke message is the proof that the code
/// was revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRecord {
    /// The revoked code.
    pub code: IssuedCode,

    /// Signature over the canonical revoke message (base58).
    pub revoke_signature: String,
}
