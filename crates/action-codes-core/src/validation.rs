//! Shared structural validation for action codes.
//!
//! Both strategies run this path before any signature work: expiry, digit
//! format, field presence, and internal consistency. Signature checks are
//! strategy- and chain-specific and live elsewhere.

use crate::code::ActionCode;
use crate::config::CodeGenerationConfig;
use crate::error::ProtocolError;

/// Current time in Unix milliseconds.
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

/// Validate the structure and expiry of an action code at time `now`.
pub fn validate_action_code(
    code: &ActionCode,
    config: &CodeGenerationConfig,
    now: i64,
) -> Result<(), ProtocolError> {
    // 1. Expiry (with skew tolerance)
    if code.is_expired(now, config.clock_skew_ms()) {
        return Err(ProtocolError::ExpiredCode {
            detail: format!("expired at {} (now {})", code.expires_at, now),
        });
    }

    // 2. Digit format: ^[0-9]{N}$ for the configured N
    let expected = config.code_length();
    if code.code.len() != expected || !code.code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::InvalidCodeFormat {
            detail: format!("expected {expected} decimal digits"),
        });
    }

    // 3. Presence of structural fields
    if code.pubkey.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "pubkey" });
    }
    if code.chain.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "chain" });
    }
    if code.signature.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "signature" });
    }

    // 4. Internal consistency: the window must have positive extent
    if code.expires_at <= code.timestamp {
        return Err(ProtocolError::InvalidCode {
            detail: "expiresAt is not after timestamp".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const NOW: i64 = 1_759_737_721_000;

    fn config() -> CodeGenerationConfig {
        CodeGenerationConfig::new(8, 120_000).unwrap()
    }

    fn code() -> ActionCode {
        ActionCode {
            code: "04825194".into(),
            pubkey: "SomePubkey".into(),
            timestamp: 1_759_737_720_000,
            expires_at: 1_759_737_840_000,
            chain: "solana".into(),
            signature: "sig".into(),
        }
    }

    #[test]
    fn test_fresh_code_validates() {
        assert!(validate_action_code(&code(), &config(), NOW).is_ok());
    }

    #[test]
    fn test_expired_code_rejected() {
        // 1759737961000 is beyond timestamp + ttl with no skew.
        let err = validate_action_code(&code(), &config(), 1_759_737_961_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpiredCode);
    }

    #[test]
    fn test_skew_extends_validity() {
        let config = CodeGenerationConfig::new(8, 120_000)
            .unwrap()
            .with_clock_skew(200_000)
            .unwrap();
        assert!(validate_action_code(&code(), &config, 1_759_737_961_000).is_ok());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let mut c = code();
        c.code = "0482519".into();
        let err = validate_action_code(&c, &config(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodeFormat);
    }

    #[test]
    fn test_non_digit_rejected() {
        let mut c = code();
        c.code = "0482519a".into();
        let err = validate_action_code(&c, &config(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCodeFormat);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut c = code();
        c.pubkey.clear();
        assert_eq!(
            validate_action_code(&c, &config(), NOW).unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );

        let mut c = code();
        c.chain.clear();
        assert_eq!(
            validate_action_code(&c, &config(), NOW).unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );

        let mut c = code();
        c.signature.clear();
        assert_eq!(
            validate_action_code(&c, &config(), NOW).unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut c = code();
        c.expires_at = c.timestamp;
        // Push `now` before the (broken) expiry so the expiry check passes.
        let err = validate_action_code(&c, &config(), c.timestamp - 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCode);
    }

    #[test]
    fn test_now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
        // Sanity: we are past 2020 and before year 3000.
        assert!(a > 1_577_836_800_000);
        assert!(a < 32_503_680_000_000);
    }
}
