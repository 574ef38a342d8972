//! Chain adapter contract.
//!
//! A chain adapter owns the signature-verification rules of one chain. The
//! façade keeps a registry of adapters keyed by chain identifier; strategies
//! stay chain-agnostic and hand completed records to the adapter.
//!
//! # Design Notes
//!
//! - **Infallible predicates**: every failure (decoding, length, curve,
//!   verification) folds into `false`. Callers that need a reason use the
//!   chain-specific transaction operations instead.
//! - **Fixed verification count**: each predicate performs the same number
//!   of signature verifications whether or not an earlier step already
//!   failed (one for the wallet paths, two for the delegation paths), so
//!   an observer cannot learn which check failed from timing.
//! - **No state**: adapters hold nothing beyond compiled constants and are
//!   shared freely across threads.

use crate::code::{ActionCode, DelegatedActionCode};

/// Signature-verification predicates for one chain.
pub trait ChainAdapter: Send + Sync {
    /// Verify the wallet signature of a directly issued code against the
    /// reconstructed canonical generation message.
    fn verify_with_wallet(&self, code: &ActionCode) -> bool;

    /// Verify a delegated code: the owner's signature over the delegation
    /// proof and the delegated key's signature over the canonical generation
    /// message. Both verifications always run.
    fn verify_with_delegation(&self, code: &DelegatedActionCode) -> bool;

    /// Verify a revoke signature for a directly issued code against the
    /// reconstructed canonical revoke message.
    fn verify_revoke_with_wallet(&self, code: &ActionCode, revoke_signature: &str) -> bool;

    /// Verify a revoke signature for a delegated code. As with
    /// [`verify_with_delegation`](Self::verify_with_delegation), both the
    /// proof signature and the revoke signature are always checked.
    fn verify_revoke_with_delegation(
        &self,
        code: &DelegatedActionCode,
        revoke_signature: &str,
    ) -> bool;
}
