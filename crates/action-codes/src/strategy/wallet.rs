//! Direct wallet strategy.
//!
//! The wallet signs the canonical generation message; the signature bytes
//! are the sole entropy source for the code. Derivation is a pure function:
//! identical inputs yield byte-identical records, and there is no way to
//! derive a code without a signature.

use action_codes_core::canonical::parse_generation_message;
use action_codes_core::code::ActionCode;
use action_codes_core::config::CodeGenerationConfig;
use action_codes_core::crypto::{decode_signature, digits_from_digest, hmac_sha256};
use action_codes_core::error::ProtocolError;
use action_codes_core::validation::{now_ms, validate_action_code};

/// Issues and validates directly signed codes.
#[derive(Debug, Clone)]
pub struct WalletStrategy {
    config: CodeGenerationConfig,
}

impl WalletStrategy {
    pub fn new(config: CodeGenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        &self.config
    }

    /// Derive an action code from a wallet signature over
    /// `canonical_message`.
    ///
    /// The message supplies `pubkey` and `windowStart`; everything else in
    /// it is opaque. The code is
    /// `digits(HMAC-SHA-256(key = signature bytes, msg = message bytes))`.
    pub fn generate_code(
        &self,
        canonical_message: &[u8],
        chain: &str,
        signature: &str,
    ) -> Result<ActionCode, ProtocolError> {
        if chain.is_empty() {
            return Err(ProtocolError::MissingRequiredField { field: "chain" });
        }
        if signature.is_empty() {
            return Err(ProtocolError::InvalidSignature {
                detail: "signing capability returned an empty signature".into(),
            });
        }
        let envelope = parse_generation_message(canonical_message)?;
        let signature_bytes = decode_signature(signature)?;

        let key_material = hmac_sha256(&signature_bytes, canonical_message);
        let code = digits_from_digest(&key_material, self.config.code_length())?;

        Ok(ActionCode {
            code,
            pubkey: envelope.pubkey,
            timestamp: envelope.window_start,
            expires_at: envelope.window_start + self.config.ttl_ms(),
            chain: chain.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Validate structure and expiry against the system clock.
    pub fn validate_code(&self, code: &ActionCode) -> Result<(), ProtocolError> {
        self.validate_code_at(code, now_ms())
    }

    /// Validate structure and expiry at time `now`.
    pub fn validate_code_at(&self, code: &ActionCode, now: i64) -> Result<(), ProtocolError> {
        validate_action_code(code, &self.config, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_codes_core::canonical::generation_message;
    use action_codes_core::error::ErrorKind;

    const WINDOW: i64 = 1_759_737_720_000;

    fn strategy() -> WalletStrategy {
        WalletStrategy::new(CodeGenerationConfig::new(8, 120_000).unwrap())
    }

    fn signature() -> String {
        bs58::encode([0x5au8; 64]).into_string()
    }

    fn message() -> Vec<u8> {
        generation_message("2wyVnSw6j9omfqRixz37S2sU72rFTheQeUjDfXhAQJvf", WINDOW).unwrap()
    }

    #[test]
    fn test_generate_code_shape() {
        let code = strategy()
            .generate_code(&message(), "solana", &signature())
            .unwrap();
        assert_eq!(code.code.len(), 8);
        assert!(code.code.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(code.pubkey, "2wyVnSw6j9omfqRixz37S2sU72rFTheQeUjDfXhAQJvf");
        assert_eq!(code.timestamp, WINDOW);
        assert_eq!(code.expires_at, 1_759_737_840_000);
        assert_eq!(code.chain, "solana");
    }

    #[test]
    fn test_generate_code_is_deterministic() {
        let a = strategy()
            .generate_code(&message(), "solana", &signature())
            .unwrap();
        let b = strategy()
            .generate_code(&message(), "solana", &signature())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_signatures_give_different_codes() {
        let a = strategy()
            .generate_code(&message(), "solana", &signature())
            .unwrap();
        let other = bs58::encode([0x5bu8; 64]).into_string();
        let b = strategy()
            .generate_code(&message(), "solana", &other)
            .unwrap();
        assert_ne!(a.code, b.code);
    }

    #[test]
    fn test_code_length_follows_config() {
        for len in [6usize, 10, 24] {
            let strategy = WalletStrategy::new(CodeGenerationConfig::new(len, 120_000).unwrap());
            let code = strategy
                .generate_code(&message(), "solana", &signature())
                .unwrap();
            assert_eq!(code.code.len(), len);
        }
    }

    #[test]
    fn test_generate_without_signature_is_impossible() {
        let err = strategy()
            .generate_code(&message(), "solana", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_generate_rejects_malformed_signature() {
        let short = bs58::encode([0u8; 10]).into_string();
        let err = strategy()
            .generate_code(&message(), "solana", &short)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn test_generate_rejects_bad_message() {
        let err = strategy()
            .generate_code(b"not json", "solana", &signature())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_generate_rejects_empty_chain() {
        let err = strategy()
            .generate_code(&message(), "", &signature())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_validate_fresh_and_expired() {
        let strategy = strategy();
        let code = strategy
            .generate_code(&message(), "solana", &signature())
            .unwrap();

        // One second into the window.
        assert!(strategy.validate_code_at(&code, 1_759_737_721_000).is_ok());

        // Past ttl with no skew.
        let err = strategy
            .validate_code_at(&code, 1_759_737_961_000)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpiredCode);
    }

    #[test]
    fn test_validate_freshly_generated_never_rejects() {
        // Idempotence: a just-generated code always validates before expiry.
        let strategy = strategy();
        let code = strategy
            .generate_code(&message(), "solana", &signature())
            .unwrap();
        assert!(strategy.validate_code_at(&code, WINDOW).is_ok());
        assert!(strategy.validate_code_at(&code, code.expires_at).is_ok());
    }
}
