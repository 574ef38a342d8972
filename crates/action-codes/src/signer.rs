//! The host signing capability.

use async_trait::async_trait;

use action_codes_core::error::ProtocolError;

/// Capability for signing canonical message bytes.
///
/// The protocol core never holds a private key: generation and revocation
/// suspend on this trait and resume with the signature string the host
/// produced (base58 for Ed25519 chains). If the host cancels or fails, the
/// error surfaces unchanged and no partial record is published.
///
/// An empty or malformed returned signature fails the operation with
/// `INVALID_SIGNATURE`.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `message` for use on `chain`.
    async fn sign(&self, message: &[u8], chain: &str) -> Result<String, ProtocolError>;
}
