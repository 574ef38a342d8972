//! # Action Codes Meta
//!
//! The protocol meta payload: a small url-style string bound into a chain
//! transaction (via a memo instruction) to tie that transaction to an
//! action code.
//!
//! Wire shape: `actioncodes:ver=2&id=<code-hash>&int=<owner>[&iss=<issuer>][&p=<json>]`,
//! at most 512 bytes. See [`codec`] for the exact rules.

pub mod codec;
pub mod fields;

pub use codec::{build_meta, parse_meta, MAX_META_BYTES, MAX_PARAMS_BYTES, META_PREFIX};
pub use fields::{ProtocolMetaFields, PROTOCOL_META_VERSION};
