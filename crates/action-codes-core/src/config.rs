//! Code generation configuration.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Minimum number of digits in a code.
pub const MIN_CODE_LENGTH: usize = 6;

/// Maximum number of digits in a code.
pub const MAX_CODE_LENGTH: usize = 24;

/// Default number of digits in a code.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Default code lifetime: two minutes.
pub const DEFAULT_TTL_MS: i64 = 120_000;

/// Configuration shared by both generation strategies.
///
/// `code_length` is clamped to [6, 24] rather than rejected: callers asking
/// for extremes get the nearest supported length. `ttl_ms` must be positive
/// and `clock_skew_ms` non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGenerationConfig {
    code_length: usize,
    ttl_ms: i64,
    clock_skew_ms: i64,
}

impl CodeGenerationConfig {
    /// Create a config with the given code length (clamped) and ttl.
    pub fn new(code_length: usize, ttl_ms: i64) -> Result<Self, ProtocolError> {
        if ttl_ms <= 0 {
            return Err(ProtocolError::InvalidInput {
                field: "ttlMs",
                detail: format!("must be positive, got {ttl_ms}"),
            });
        }
        Ok(Self {
            code_length: code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
            ttl_ms,
            clock_skew_ms: 0,
        })
    }

    /// Set the clock skew tolerance applied during validation.
    pub fn with_clock_skew(mut self, clock_skew_ms: i64) -> Result<Self, ProtocolError> {
        if clock_skew_ms < 0 {
            return Err(ProtocolError::InvalidInput {
                field: "clockSkewMs",
                detail: format!("must be non-negative, got {clock_skew_ms}"),
            });
        }
        self.clock_skew_ms = clock_skew_ms;
        Ok(self)
    }

    /// Number of digits in generated codes.
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Lifetime of a code in milliseconds.
    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Skew tolerance added to `expires_at` during validation.
    pub fn clock_skew_ms(&self) -> i64 {
        self.clock_skew_ms
    }
}

impl Default for CodeGenerationConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl_ms: DEFAULT_TTL_MS,
            clock_skew_ms: 0,
        }
    }
}
