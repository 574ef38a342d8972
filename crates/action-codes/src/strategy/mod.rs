//! Generation and validation strategies.
//!
//! Two strategies issue codes: [`WalletStrategy`] derives directly from a
//! wallet signature; [`DelegationStrategy`] issues under a pre-signed
//! [`DelegationProof`](action_codes_core::DelegationProof). Both share the
//! structural validation path in `action_codes_core::validation` and differ
//! only in their signature rules.

mod delegation;
mod wallet;

pub use delegation::DelegationStrategy;
pub use wallet::WalletStrategy;
