//! # Action Codes
//!
//! The protocol façade for cryptographic one-time action codes: short
//! numeric codes deterministically derived from a wallet signature over a
//! canonical message, verifiable later without network I/O or stored state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use action_codes::{GenerateRequest, Protocol, Signer};
//! use action_codes_core::CodeGenerationConfig;
//!
//! let protocol = Protocol::for_solana(CodeGenerationConfig::default());
//! let code = protocol
//!     .generate(GenerateRequest::Wallet { pubkey: &wallet_pubkey }, "solana", &signer)
//!     .await?;
//! protocol.validate(&code)?;
//! ```
//!
//! The host owns every private key: signing happens through the async
//! [`Signer`] capability and the core only ever sees signatures.

pub mod protocol;
pub mod signer;
pub mod strategy;

pub use protocol::{GenerateRequest, Protocol};
pub use signer::Signer;
pub use strategy::{DelegationStrategy, WalletStrategy};

pub use action_codes_core::code::{ActionCode, DelegatedActionCode, IssuedCode, RevokeRecord};
pub use action_codes_core::config::CodeGenerationConfig;
pub use action_codes_core::delegation::DelegationProof;
pub use action_codes_core::error::{ErrorKind, ProtocolError};
pub use action_codes_meta::{build_meta, parse_meta, ProtocolMetaFields};
