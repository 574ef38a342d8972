//! Delegation strategy.
//!
//! Issues codes under a pre-signed [`DelegationProof`]: the delegated key
//! signs the canonical generation message, and the resulting record embeds
//! the proof. The strategy only consumes proofs; it never produces the
//! owner's signature on one.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use action_codes_core::canonical::{generation_message, parse_generation_message};
use action_codes_core::code::{ActionCode, DelegatedActionCode};
use action_codes_core::config::CodeGenerationConfig;
use action_codes_core::crypto::{
    decode_pubkey, decode_signature, digits_from_digest, hmac_sha256,
};
use action_codes_core::delegation::DelegationProof;
use action_codes_core::error::ProtocolError;
use action_codes_core::validation::{now_ms, validate_action_code};

/// Issues and validates delegated codes.
#[derive(Debug, Clone)]
pub struct DelegationStrategy {
    config: CodeGenerationConfig,
}

impl DelegationStrategy {
    pub fn new(config: CodeGenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        &self.config
    }

    /// Derive a delegated action code, at the system clock.
    pub fn generate_delegated_code(
        &self,
        proof: &DelegationProof,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
    ) -> Result<DelegatedActionCode, ProtocolError> {
        self.generate_delegated_code_at(proof, canonical_message, chain, signature, now_ms())
    }

    /// Derive a delegated action code, evaluating proof freshness at `now`.
    ///
    /// The derivation matches the wallet strategy; the record's `pubkey` is
    /// the proof's delegated key and the proof travels embedded in the
    /// record. A code that would outlive the proof is refused at generation
    /// time rather than left to fail validation.
    pub fn generate_delegated_code_at(
        &self,
        proof: &DelegationProof,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
        now: i64,
    ) -> Result<DelegatedActionCode, ProtocolError> {
        proof.validate(now)?;
        if chain != proof.chain {
            return Err(ProtocolError::InvalidInput {
                field: "chain",
                detail: format!("proof is for chain `{}`, not `{chain}`", proof.chain),
            });
        }
        if signature.is_empty() {
            return Err(ProtocolError::InvalidSignature {
                detail: "signing capability returned an empty signature".into(),
            });
        }

        let envelope = parse_generation_message(canonical_message)?;
        if envelope.pubkey != proof.delegated_pubkey {
            return Err(ProtocolError::InvalidInput {
                field: "delegatedPubkey",
                detail: "canonical message is not bound to the proof's delegated key".into(),
            });
        }

        let expires_at = envelope.window_start + self.config.ttl_ms();
        if expires_at > proof.expires_at {
            return Err(ProtocolError::InvalidInput {
                field: "expiresAt",
                detail: "code would outlive the delegation proof".into(),
            });
        }

        let signature_bytes = decode_signature(signature)?;
        let key_material = hmac_sha256(&signature_bytes, canonical_message);
        let code = digits_from_digest(&key_material, self.config.code_length())?;

        Ok(DelegatedActionCode {
            action_code: ActionCode {
                code,
                pubkey: proof.delegated_pubkey.clone(),
                timestamp: envelope.window_start,
                expires_at,
                chain: chain.to_string(),
                signature: signature.to_string(),
            },
            delegation_proof: proof.clone(),
        })
    }

    /// Validate a delegated code against the system clock.
    pub fn validate_delegated_code(&self, code: &DelegatedActionCode) -> Result<(), ProtocolError> {
        self.validate_delegated_code_at(code, now_ms())
    }

    /// Validate a delegated code at time `now`.
    ///
    /// Re-validates the embedded proof, the pubkey binding, the
    /// must-not-outlive rule, the delegated Ed25519 signature over the
    /// reconstructed generation message, and finally the shared structural
    /// checks.
    pub fn validate_delegated_code_at(
        &self,
        code: &DelegatedActionCode,
        now: i64,
    ) -> Result<(), ProtocolError> {
        let proof = &code.delegation_proof;
        let record = &code.action_code;

        // 1. The embedded proof must still be valid on its own terms.
        proof.validate(now)?;

        // 2. The code is bound to the delegated key.
        if record.pubkey != proof.delegated_pubkey {
            return Err(ProtocolError::InvalidInput {
                field: "delegatedPubkey",
                detail: "code pubkey does not match the proof's delegatedPubkey".into(),
            });
        }

        // 3. Codes must not outlive their authorization.
        if record.expires_at > proof.expires_at {
            return Err(ProtocolError::InvalidInput {
                field: "expiresAt",
                detail: "code expires after the delegation proof".into(),
            });
        }

        // 4. The delegated key signed the canonical generation message.
        let message = generation_message(&proof.delegated_pubkey, record.timestamp)?;
        let key_bytes = decode_pubkey("delegatedPubkey", &proof.delegated_pubkey)?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_bytes).map_err(|_| ProtocolError::InvalidPubkeyFormat {
                field: "delegatedPubkey",
                detail: "not a valid Ed25519 point".into(),
            })?;
        let signature_bytes = decode_signature(&record.signature)?;
        verifying_key
            .verify(&message, &Signature::from_bytes(&signature_bytes))
            .map_err(|_| ProtocolError::InvalidSignature {
                detail: "delegated signature does not verify over the generation message".into(),
            })?;

        // 5. Shared structural and expiry checks.
        validate_action_code(record, &self.config, now)
    }
}
