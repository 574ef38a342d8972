//! Error types for the action-code protocol core.
//!
//! The kind set is closed: every failure anywhere in the protocol maps to one
//! of the [`ErrorKind`] variants, and each kind carries a stable string code
//! that is safe to ship across process boundaries. Error messages name the
//! offending field and a human-readable detail; they never contain signature
//! material or other secret intermediates.

use thiserror::Error;

/// The closed set of protocol error kinds.
///
/// `code()` returns the stable wire identifier for each kind. New kinds are a
/// protocol change, not a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ExpiredCode,
    InvalidCode,
    InvalidCodeFormat,
    InvalidSignature,
    MissingMeta,
    InvalidMetaFormat,
    MetaMismatch,
    MetaTooLarge,
    InvalidTransactionFormat,
    TransactionNotSignedByIntendedOwner,
    TransactionNotSignedByIssuer,
    InvalidPubkeyFormat,
    InvalidInput,
    MissingRequiredField,
    CryptoError,
    InvalidDigest,
    InvalidAdapter,
}

impl ErrorKind {
    /// Stable string code for this kind.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::ExpiredCode => "EXPIRED_CODE",
            ErrorKind::InvalidCode => "INVALID_CODE",
            ErrorKind::InvalidCodeFormat => "INVALID_CODE_FORMAT",
            ErrorKind::InvalidSignature => "INVALID_SIGNATURE",
            ErrorKind::MissingMeta => "MISSING_META",
            ErrorKind::InvalidMetaFormat => "INVALID_META_FORMAT",
            ErrorKind::MetaMismatch => "META_MISMATCH",
            ErrorKind::MetaTooLarge => "META_TOO_LARGE",
            ErrorKind::InvalidTransactionFormat => "INVALID_TRANSACTION_FORMAT",
            ErrorKind::TransactionNotSignedByIntendedOwner => {
                "TRANSACTION_NOT_SIGNED_BY_INTENDED_OWNER"
            }
            ErrorKind::TransactionNotSignedByIssuer => "TRANSACTION_NOT_SIGNED_BY_ISSUER",
            ErrorKind::InvalidPubkeyFormat => "INVALID_PUBKEY_FORMAT",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::CryptoError => "CRYPTO_ERROR",
            ErrorKind::InvalidDigest => "INVALID_DIGEST",
            ErrorKind::InvalidAdapter => "INVALID_ADAPTER",
        }
    }
}

/// Typed protocol error.
///
/// Variants carry the offending field name where one exists. Validation
/// fails fast with the first violated check; adapter predicates never return
/// these (they fold failures into `false`), but transaction-binding
/// operations do, because their callers expect a reason.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("action code expired: {detail}")]
    ExpiredCode { detail: String },

    #[error("invalid action code: {detail}")]
    InvalidCode { detail: String },

    #[error("invalid code format: {detail}")]
    InvalidCodeFormat { detail: String },

    #[error("invalid signature: {detail}")]
    InvalidSignature { detail: String },

    #[error("transaction carries no protocol meta")]
    MissingMeta,

    #[error("invalid protocol meta: {detail}")]
    InvalidMetaFormat { detail: String },

    #[error("protocol meta mismatch on `{field}`: {detail}")]
    MetaMismatch { field: &'static str, detail: String },

    #[error("protocol meta exceeds {limit} bytes (got {size})")]
    MetaTooLarge { limit: usize, size: usize },

    #[error("invalid transaction format: {detail}")]
    InvalidTransactionFormat { detail: String },

    #[error("transaction is not signed by intent owner `{intent}`")]
    TransactionNotSignedByIntendedOwner { intent: String },

    #[error("transaction is not signed by issuer `{issuer}`")]
    TransactionNotSignedByIssuer { issuer: String },

    #[error("invalid public key in `{field}`: {detail}")]
    InvalidPubkeyFormat { field: &'static str, detail: String },

    #[error("invalid input in `{field}`: {detail}")]
    InvalidInput { field: &'static str, detail: String },

    #[error("missing required field `{field}`")]
    MissingRequiredField { field: &'static str },

    #[error("crypto error: {detail}")]
    CryptoError { detail: String },

    #[error("invalid digest: {detail}")]
    InvalidDigest { detail: String },

    #[error("no adapter registered for chain `{chain}`")]
    InvalidAdapter { chain: String },
}

impl ProtocolError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::ExpiredCode { .. } => ErrorKind::ExpiredCode,
            ProtocolError::InvalidCode { .. } => ErrorKind::InvalidCode,
            ProtocolError::InvalidCodeFormat { .. } => ErrorKind::InvalidCodeFormat,
            ProtocolError::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            ProtocolError::MissingMeta => ErrorKind::MissingMeta,
            ProtocolError::InvalidMetaFormat { .. } => ErrorKind::InvalidMetaFormat,
            ProtocolError::MetaMismatch { .. } => ErrorKind::MetaMismatch,
            ProtocolError::MetaTooLarge { .. } => ErrorKind::MetaTooLarge,
            ProtocolError::InvalidTransactionFormat { .. } => ErrorKind::InvalidTransactionFormat,
            ProtocolError::TransactionNotSignedByIntendedOwner { .. } => {
                ErrorKind::TransactionNotSignedByIntendedOwner
            }
            ProtocolError::TransactionNotSignedByIssuer { .. } => {
                ErrorKind::TransactionNotSignedByIssuer
            }
            ProtocolError::InvalidPubkeyFormat { .. } => ErrorKind::InvalidPubkeyFormat,
            ProtocolError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ProtocolError::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            ProtocolError::CryptoError { .. } => ErrorKind::CryptoError,
            ProtocolError::InvalidDigest { .. } => ErrorKind::InvalidDigest,
            ProtocolError::InvalidAdapter { .. } => ErrorKind::InvalidAdapter,
        }
    }

    /// Stable string code for this error's kind.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ProtocolError>;
