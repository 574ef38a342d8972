//! # Action Codes Core
//!
//! Pure primitives for the action-code protocol: crypto, canonical message
//! bytes, the data model, and the chain-adapter contract.
//!
//! This crate contains no I/O, no clock scheduling, no networking. It is
//! pure computation over cryptographic data structures; the only ambient
//! input is the caller-supplied (or system) clock used for expiry checks.
//!
//! ## Key Types
//!
//! - [`ActionCode`] / [`DelegatedActionCode`] - immutable issued-code records
//! - [`DelegationProof`] - an owner's pre-signed authorization
//! - [`CodeGenerationConfig`] - code length, ttl, clock skew
//! - [`ChainAdapter`] - the per-chain signature-verification contract
//!
//! ## Canonicalization
//!
//! All signed artifacts are deterministic JSON byte sequences. See
//! [`canonical`].

pub mod adapter;
pub mod canonical;
pub mod code;
pub mod config;
pub mod crypto;
pub mod delegation;
pub mod error;
pub mod validation;

pub use adapter::ChainAdapter;
pub use canonical::{
    delegation_proof_message, generation_message, parse_generation_message, revoke_message,
    GenerationEnvelope,
};
pub use code::{ActionCode, DelegatedActionCode, IssuedCode, RevokeRecord};
pub use config::CodeGenerationConfig;
pub use crypto::{code_hash, digits_from_digest, hkdf_sha256, hmac_sha256, sha256};
pub use delegation::DelegationProof;
pub use error::{ErrorKind, ProtocolError};
pub use validation::{now_ms, validate_action_code};
