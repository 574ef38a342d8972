//! Protocol meta fields.

use serde::{Deserialize, Serialize};

use action_codes_core::code::ActionCode;
use action_codes_core::crypto::code_hash;

/// The only supported meta payload version.
pub const PROTOCOL_META_VERSION: u8 = 2;

/// The fields carried by a protocol meta payload.
///
/// Constructed once, attached to exactly one transaction, never mutated.
/// An `issuer` equal to `intent` is redundant and collapses to `None` in
/// serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMetaFields {
    /// Meta layout version; must be [`PROTOCOL_META_VERSION`].
    pub version: u8,

    /// The code hash this transaction is bound to.
    pub id: String,

    /// The pubkey expected to sign the transaction.
    pub intent: String,

    /// Optional distinct pubkey that also signs the transaction.
    pub issuer: Option<String>,

    /// Free-form structured payload.
    pub params: Option<serde_json::Value>,
}

impl ProtocolMetaFields {
    /// Meta fields binding to `id` with intent owner `intent`.
    pub fn new(id: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_META_VERSION,
            id: id.into(),
            intent: intent.into(),
            issuer: None,
            params: None,
        }
    }

    /// Meta fields binding a transaction to `code`: the id is the code hash
    /// and the intent owner is the code's pubkey.
    pub fn for_code(code: &ActionCode) -> Self {
        Self::new(code_hash(&code.code), code.pubkey.clone())
    }

    /// Attach an issuer pubkey.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Attach a structured params payload.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }

    /// The issuer to check signatures for: the explicit issuer if distinct,
    /// otherwise the intent owner.
    pub fn issuer_or_intent(&self) -> &str {
        match &self.issuer {
            Some(issuer) if issuer != &self.intent => issuer,
            _ => &self.intent,
        }
    }
}
