//! # Action Codes Solana
//!
//! The Ed25519 (Solana) chain adapter: signature verification for wallet and
//! delegated codes, plus the transaction-side meta operations: extraction,
//! binding checks, signer checks, and memo attachment.
//!
//! The transaction model in [`transaction`] is deliberately minimal: both
//! message layouts (legacy and v0), their compact-u16 wire codec, and
//! nothing else. Address lookup tables are resolved through the injected
//! [`AddressLookupResolver`] capability; this crate performs no RPC.

pub mod adapter;
pub mod memo;
pub mod transaction;

pub use adapter::SolanaAdapter;
pub use memo::{
    attach_protocol_meta, find_and_parse_meta, find_protocol_meta, memo_program_key,
    AddressLookupResolver, StaticLookupResolver, MEMO_PROGRAM_ID,
};
pub use transaction::{
    CompiledInstruction, LegacyMessage, MessageAddressTableLookup, MessageHeader, Pubkey,
    SignatureBytes, V0Message, VersionedMessage, VersionedTransaction,
};
