//! The Ed25519 (Solana) chain adapter.
//!
//! Pubkeys are base58-encoded 32-byte Ed25519 keys; signatures are base58
//! 64-byte values. The four predicate functions keep a fixed verification
//! count: one Ed25519 verification on the wallet paths, two on the
//! delegation paths, whether or not an earlier step already failed. When a
//! key or signature fails to decode, the adapter burns a verification
//! against a fixed key so the work done stays independent of the input.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use subtle::ConstantTimeEq;

use action_codes_core::adapter::ChainAdapter;
use action_codes_core::canonical::{generation_message, revoke_message};
use action_codes_core::code::{ActionCode, DelegatedActionCode};
use action_codes_core::crypto::{code_hash, decode_pubkey, decode_signature};
use action_codes_core::error::ProtocolError;
use action_codes_core::validation::now_ms;
use action_codes_meta::ProtocolMetaFields;

use crate::memo::{self, AddressLookupResolver};
use crate::transaction::VersionedTransaction;

/// The Ed25519 base point, compressed. Used as the verification target when
/// inputs fail to decode: verifying against it always fails, but performs
/// the full verification equation.
const BURN_VERIFY_KEY: [u8; 32] = [
    0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66,
];

/// The chain adapter for Solana.
///
/// Stateless: every method reconstructs what it needs from its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaAdapter;

impl SolanaAdapter {
    /// The chain identifier this adapter registers under.
    pub const CHAIN: &'static str = "solana";

    pub fn new() -> Self {
        Self
    }

    /// The raw protocol meta string carried by `tx`, if any.
    pub fn get_protocol_meta(&self, tx: &VersionedTransaction) -> Option<String> {
        memo::find_protocol_meta(tx)
    }

    /// The parsed protocol meta carried by `tx`, if any.
    pub fn parse_meta(&self, tx: &VersionedTransaction) -> Option<ProtocolMetaFields> {
        memo::find_and_parse_meta(tx)
    }

    /// Check that `tx` is bound to `code` via its meta, at the system clock.
    pub fn verify_transaction_matches_code(
        &self,
        code: &ActionCode,
        tx: &VersionedTransaction,
    ) -> Result<(), ProtocolError> {
        self.verify_transaction_matches_code_at(code, tx, now_ms())
    }

    /// Check that `tx` is bound to `code` via its meta, at time `now`.
    ///
    /// Requires `meta.ver == 2`, `meta.id == code_hash(code)`,
    /// `meta.int == code.pubkey`, and `now <= code.expires_at`.
    pub fn verify_transaction_matches_code_at(
        &self,
        code: &ActionCode,
        tx: &VersionedTransaction,
        now: i64,
    ) -> Result<(), ProtocolError> {
        let meta = self.parse_meta(tx).ok_or(ProtocolError::MissingMeta)?;

        if meta.version != action_codes_meta::PROTOCOL_META_VERSION {
            return Err(ProtocolError::MetaMismatch {
                field: "ver",
                detail: format!("version {} is not supported", meta.version),
            });
        }
        let expected_id = code_hash(&code.code);
        if !ct_str_eq(&meta.id, &expected_id) {
            return Err(ProtocolError::MetaMismatch {
                field: "id",
                detail: "meta id does not match the code hash".into(),
            });
        }
        if !pubkeys_equal(&meta.intent, &code.pubkey) {
            return Err(ProtocolError::MetaMismatch {
                field: "int",
                detail: "meta intent does not match the code owner".into(),
            });
        }
        if now > code.expires_at {
            return Err(ProtocolError::ExpiredCode {
                detail: format!("expired at {} (now {now})", code.expires_at),
            });
        }
        Ok(())
    }

    /// Check that the meta's intent owner (and distinct issuer, if present)
    /// actually signed `tx`.
    ///
    /// A required-signer slot counts as signed only when its signature is
    /// non-zero and verifies over the serialized message bytes.
    pub fn verify_transaction_signed_by_intent_owner(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<(), ProtocolError> {
        let meta = self.parse_meta(tx).ok_or(ProtocolError::MissingMeta)?;
        let intent = decode_pubkey("int", &meta.intent)?;

        let message_data = tx.message_data();
        let required = tx.message.num_required_signatures();
        let static_keys = tx.message.static_account_keys();

        let mut signed_keys: Vec<[u8; 32]> = Vec::with_capacity(required);
        for (slot, key) in static_keys.iter().take(required).enumerate() {
            let Some(signature) = tx.signatures.get(slot) else {
                continue;
            };
            if signature.is_placeholder() {
                continue;
            }
            let Ok(verifying_key) = VerifyingKey::from_bytes(&key.0) else {
                continue;
            };
            let sig = Signature::from_bytes(&signature.0);
            if verifying_key.verify(&message_data, &sig).is_ok() {
                signed_keys.push(key.0);
            }
        }

        if !signed_keys.iter().any(|k| bool::from(k.ct_eq(&intent))) {
            return Err(ProtocolError::TransactionNotSignedByIntendedOwner {
                intent: meta.intent.clone(),
            });
        }

        if let Some(issuer) = &meta.issuer {
            if !pubkeys_equal(issuer, &meta.intent) {
                let issuer_key = decode_pubkey("iss", issuer)?;
                if !signed_keys.iter().any(|k| bool::from(k.ct_eq(&issuer_key))) {
                    return Err(ProtocolError::TransactionNotSignedByIssuer {
                        issuer: issuer.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Attach a protocol meta string to `tx`. See [`memo::attach_protocol_meta`].
    pub fn attach_protocol_meta(
        &self,
        tx: &VersionedTransaction,
        meta: &str,
        resolver: Option<&dyn AddressLookupResolver>,
    ) -> Result<VersionedTransaction, ProtocolError> {
        memo::attach_protocol_meta(tx, meta, resolver)
    }
}

impl ChainAdapter for SolanaAdapter {
    fn verify_with_wallet(&self, code: &ActionCode) -> bool {
        match generation_message(&code.pubkey, code.timestamp) {
            Ok(message) => verify_or_burn(&code.pubkey, &message, &code.signature),
            Err(_) => burn_verification(&[]),
        }
    }

    fn verify_with_delegation(&self, code: &DelegatedActionCode) -> bool {
        let proof = &code.delegation_proof;

        // Owner signature over the reserialized proof bytes.
        let owner_ok = match proof.message_bytes() {
            Ok(message) => verify_or_burn(&proof.wallet_pubkey, &message, &proof.signature),
            Err(_) => burn_verification(&[]),
        };

        // Delegated signature over the canonical generation message. Both
        // verifications always run.
        let delegated_ok =
            match generation_message(&proof.delegated_pubkey, code.action_code.timestamp) {
                Ok(message) => verify_or_burn(
                    &proof.delegated_pubkey,
                    &message,
                    &code.action_code.signature,
                ),
                Err(_) => burn_verification(&[]),
            };

        owner_ok & delegated_ok
    }

    fn verify_revoke_with_wallet(&self, code: &ActionCode, revoke_signature: &str) -> bool {
        match revoke_message(&code.pubkey, &code_hash(&code.code), code.timestamp) {
            Ok(message) => verify_or_burn(&code.pubkey, &message, revoke_signature),
            Err(_) => burn_verification(&[]),
        }
    }

    fn verify_revoke_with_delegation(
        &self,
        code: &DelegatedActionCode,
        revoke_signature: &str,
    ) -> bool {
        let proof = &code.delegation_proof;

        let owner_ok = match proof.message_bytes() {
            Ok(message) => verify_or_burn(&proof.wallet_pubkey, &message, &proof.signature),
            Err(_) => burn_verification(&[]),
        };

        let code_record = &code.action_code;
        let revoke_ok = match revoke_message(
            &code_record.pubkey,
            &code_hash(&code_record.code),
            code_record.timestamp,
        ) {
            Ok(message) => verify_or_burn(&proof.delegated_pubkey, &message, revoke_signature),
            Err(_) => burn_verification(&[]),
        };

        owner_ok & revoke_ok
    }
}

/// Verify `signature_b58` by `pubkey_b58` over `message`, burning a
/// verification when either input fails to decode.
///
/// Performs exactly one Ed25519 verification on every path.
fn verify_or_burn(pubkey_b58: &str, message: &[u8], signature_b58: &str) -> bool {
    let key = decode_pubkey("pubkey", pubkey_b58)
        .ok()
        .and_then(|bytes| VerifyingKey::from_bytes(&bytes).ok());
    let sig = decode_signature(signature_b58).ok();

    match (key, sig) {
        (Some(verifying_key), Some(sig_bytes)) => verifying_key
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .is_ok(),
        _ => burn_verification(message),
    }
}

/// Run one full (always-failing) Ed25519 verification and return `false`.
///
/// The signature's `R` is the base point and `s` is zero: both components
/// are canonical, so the whole verification equation is evaluated.
fn burn_verification(message: &[u8]) -> bool {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&BURN_VERIFY_KEY);
    if let Ok(verifying_key) = VerifyingKey::from_bytes(&BURN_VERIFY_KEY) {
        let _ = verifying_key.verify(message, &Signature::from_bytes(&sig_bytes));
    }
    false
}

fn ct_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Constant-time pubkey equality, comparing decoded key bytes when both
/// strings decode and falling back to a constant-time string compare.
fn pubkeys_equal(a: &str, b: &str) -> bool {
    match (decode_pubkey("pubkey", a), decode_pubkey("pubkey", b)) {
        (Ok(x), Ok(y)) => x.ct_eq(&y).into(),
        _ => ct_str_eq(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::memo_program_key;
    use crate::transaction::{
        CompiledInstruction, LegacyMessage, MessageHeader, Pubkey, SignatureBytes,
        VersionedMessage,
    };
    use action_codes_core::delegation::DelegationProof;
    use action_codes_core::error::ErrorKind;
    use action_codes_meta::build_meta;
    use ed25519_dalek::{Signer as _, SigningKey};

    const WINDOW: i64 = 1_759_737_720_000;
    const TTL: i64 = 120_000;

    struct Wallet {
        key: SigningKey,
        pubkey: String,
    }

    fn wallet(seed: u8) -> Wallet {
        let key = SigningKey::from_bytes(&[seed; 32]);
        let pubkey = bs58::encode(key.verifying_key().to_bytes()).into_string();
        Wallet { key, pubkey }
    }

    fn sign_b58(wallet: &Wallet, message: &[u8]) -> String {
        bs58::encode(wallet.key.sign(message).to_bytes()).into_string()
    }

    fn wallet_code(w: &Wallet) -> ActionCode {
        let message = generation_message(&w.pubkey, WINDOW).unwrap();
        ActionCode {
            code: "04825194".into(),
            pubkey: w.pubkey.clone(),
            timestamp: WINDOW,
            expires_at: WINDOW + TTL,
            chain: "solana".into(),
            signature: sign_b58(w, &message),
        }
    }

    fn delegated_code(owner: &Wallet, delegate: &Wallet) -> DelegatedActionCode {
        let expires_at = WINDOW + 86_400_000;
        let proof_message = action_codes_core::canonical::delegation_proof_message(
            &owner.pubkey,
            &delegate.pubkey,
            expires_at,
            "solana",
        )
        .unwrap();
        let proof = DelegationProof {
            wallet_pubkey: owner.pubkey.clone(),
            delegated_pubkey: delegate.pubkey.clone(),
            chain: "solana".into(),
            expires_at,
            signature: bs58::encode(owner.key.sign(&proof_message).to_bytes()).into_string(),
        };

        let gen_message = generation_message(&delegate.pubkey, WINDOW).unwrap();
        DelegatedActionCode {
            action_code: ActionCode {
                code: "73920154".into(),
                pubkey: delegate.pubkey.clone(),
                timestamp: WINDOW,
                expires_at: WINDOW + TTL,
                chain: "solana".into(),
                signature: bs58::encode(delegate.key.sign(&gen_message).to_bytes()).into_string(),
            },
            delegation_proof: proof,
        }
    }

    #[test]
    fn test_verify_with_wallet_accepts_genuine_code() {
        let w = wallet(0x42);
        assert!(SolanaAdapter::new().verify_with_wallet(&wallet_code(&w)));
    }

    #[test]
    fn test_verify_with_wallet_rejects_tampered_timestamp() {
        let w = wallet(0x42);
        let mut code = wallet_code(&w);
        code.timestamp += 1;
        assert!(!SolanaAdapter::new().verify_with_wallet(&code));
    }

    #[test]
    fn test_verify_with_wallet_rejects_foreign_signature() {
        let w = wallet(0x42);
        let other = wallet(0x43);
        let mut code = wallet_code(&w);
        code.signature = wallet_code(&other).signature;
        assert!(!SolanaAdapter::new().verify_with_wallet(&code));
    }

    #[test]
    fn test_verify_with_wallet_handles_garbage_without_panicking() {
        let adapter = SolanaAdapter::new();
        let mut code = wallet_code(&wallet(0x42));
        code.pubkey = "0OIl-not-base58".into();
        assert!(!adapter.verify_with_wallet(&code));

        let mut code = wallet_code(&wallet(0x42));
        code.signature = "short".into();
        assert!(!adapter.verify_with_wallet(&code));
    }

    #[test]
    fn test_verify_with_delegation_accepts_genuine_code() {
        let owner = wallet(0x01);
        let delegate = wallet(0x02);
        assert!(SolanaAdapter::new().verify_with_delegation(&delegated_code(&owner, &delegate)));
    }

    #[test]
    fn test_verify_with_delegation_rejects_tampered_proof_expiry() {
        // Changing expiresAt alone invalidates the owner signature over the
        // reserialized proof.
        let owner = wallet(0x01);
        let delegate = wallet(0x02);
        let mut code = delegated_code(&owner, &delegate);
        code.delegation_proof.expires_at += 1;
        assert!(!SolanaAdapter::new().verify_with_delegation(&code));
    }

    #[test]
    fn test_verify_with_delegation_rejects_wrong_owner() {
        let owner = wallet(0x01);
        let delegate = wallet(0x02);
        let mallory = wallet(0x03);
        let mut code = delegated_code(&owner, &delegate);
        code.delegation_proof.wallet_pubkey = mallory.pubkey;
        assert!(!SolanaAdapter::new().verify_with_delegation(&code));
    }

    #[test]
    fn test_verify_revoke_with_wallet() {
        let w = wallet(0x42);
        let code = wallet_code(&w);
        let adapter = SolanaAdapter::new();

        let message =
            revoke_message(&code.pubkey, &code_hash(&code.code), code.timestamp).unwrap();
        let revoke_sig = sign_b58(&w, &message);
        assert!(adapter.verify_revoke_with_wallet(&code, &revoke_sig));

        // A generation signature is not a revoke signature.
        assert!(!adapter.verify_revoke_with_wallet(&code, &code.signature));
    }

    #[test]
    fn test_verify_revoke_with_delegation() {
        let owner = wallet(0x01);
        let delegate = wallet(0x02);
        let code = delegated_code(&owner, &delegate);
        let adapter = SolanaAdapter::new();

        let record = &code.action_code;
        let message =
            revoke_message(&record.pubkey, &code_hash(&record.code), record.timestamp).unwrap();
        let revoke_sig = bs58::encode(delegate.key.sign(&message).to_bytes()).into_string();
        assert!(adapter.verify_revoke_with_delegation(&code, &revoke_sig));

        // The owner's key cannot revoke on the delegated key's behalf.
        let owner_sig = bs58::encode(owner.key.sign(&message).to_bytes()).into_string();
        assert!(!adapter.verify_revoke_with_delegation(&code, &owner_sig));
    }

    #[test]
    fn test_burn_key_is_a_valid_verification_target() {
        assert!(VerifyingKey::from_bytes(&BURN_VERIFY_KEY).is_ok());
        assert!(!burn_verification(b"anything"));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transaction binding
    // ─────────────────────────────────────────────────────────────────────

    fn signed_tx_with_meta(signer: &Wallet, meta: &ProtocolMetaFields) -> VersionedTransaction {
        let signer_key = Pubkey(signer.key.verifying_key().to_bytes());
        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![signer_key, memo_program_key()],
            recent_blockhash: [7; 32],
            instructions: vec![CompiledInstruction {
                program_id_index: 1,
                account_key_indexes: vec![],
                data: build_meta(meta).unwrap().into_bytes(),
            }],
        });
        let mut tx = VersionedTransaction::new_unsigned(message);
        let sig = signer.key.sign(&tx.message_data());
        tx.signatures[0] = SignatureBytes(sig.to_bytes());
        tx
    }

    #[test]
    fn test_matches_code_accepts_bound_transaction() {
        let w = wallet(0x42);
        let code = wallet_code(&w);
        let meta = ProtocolMetaFields::for_code(&code);
        let tx = signed_tx_with_meta(&w, &meta);

        SolanaAdapter::new()
            .verify_transaction_matches_code_at(&code, &tx, WINDOW + 1_000)
            .unwrap();
    }

    #[test]
    fn test_matches_code_rejects_wrong_hash() {
        let w = wallet(0x42);
        let code = wallet_code(&w);
        let meta = ProtocolMetaFields::new("wrong-hash", code.pubkey.clone());
        let tx = signed_tx_with_meta(&w, &meta);

        let err = SolanaAdapter::new()
            .verify_transaction_matches_code_at(&code, &tx, WINDOW + 1_000)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetaMismatch);
        assert!(err.to_string().contains("`id`"));
    }

    #[test]
    fn test_matches_code_rejects_wrong_owner() {
        let w = wallet(0x42);
        let other = wallet(0x43);
        let code = wallet_code(&w);
        let meta = ProtocolMetaFields::new(code_hash(&code.code), other.pubkey.clone());
        let tx = signed_tx_with_meta(&w, &meta);

        let err = SolanaAdapter::new()
            .verify_transaction_matches_code_at(&code, &tx, WINDOW + 1_000)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetaMismatch);
        assert!(err.to_string().contains("`int`"));
    }

    #[test]
    fn test_matches_code_rejects_expired() {
        let w = wallet(0x42);
        let code = wallet_code(&w);
        let meta = ProtocolMetaFields::for_code(&code);
        let tx = signed_tx_with_meta(&w, &meta);

        let err = SolanaAdapter::new()
            .verify_transaction_matches_code_at(&code, &tx, code.expires_at + 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpiredCode);
    }

    #[test]
    fn test_matches_code_requires_meta() {
        let w = wallet(0x42);
        let code = wallet_code(&w);
        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::Legacy(LegacyMessage {
                header: MessageHeader::default(),
                account_keys: vec![],
                recent_blockhash: [0; 32],
                instructions: vec![],
            }),
        };

        let err = SolanaAdapter::new()
            .verify_transaction_matches_code_at(&code, &tx, WINDOW)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMeta);
    }

    #[test]
    fn test_signed_by_intent_owner_accepts() {
        let w = wallet(0x42);
        let meta = ProtocolMetaFields::new("someid", w.pubkey.clone());
        let tx = signed_tx_with_meta(&w, &meta);
        SolanaAdapter::new()
            .verify_transaction_signed_by_intent_owner(&tx)
            .unwrap();
    }

    #[test]
    fn test_signed_by_intent_owner_rejects_unsigned() {
        let w = wallet(0x42);
        let meta = ProtocolMetaFields::new("someid", w.pubkey.clone());
        let mut tx = signed_tx_with_meta(&w, &meta);
        tx.signatures[0] = SignatureBytes::PLACEHOLDER;

        let err = SolanaAdapter::new()
            .verify_transaction_signed_by_intent_owner(&tx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionNotSignedByIntendedOwner);
    }

    #[test]
    fn test_signed_by_intent_owner_rejects_other_signer() {
        let w = wallet(0x42);
        let other = wallet(0x43);
        // Meta names `other` as intent, but only `w` signs.
        let meta = ProtocolMetaFields::new("someid", other.pubkey.clone());
        let tx = signed_tx_with_meta(&w, &meta);

        let err = SolanaAdapter::new()
            .verify_transaction_signed_by_intent_owner(&tx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionNotSignedByIntendedOwner);
    }

    #[test]
    fn test_signed_by_issuer_required_when_distinct() {
        let w = wallet(0x42);
        let issuer = wallet(0x43);
        let meta = ProtocolMetaFields::new("someid", w.pubkey.clone())
            .with_issuer(issuer.pubkey.clone());
        let tx = signed_tx_with_meta(&w, &meta);

        let err = SolanaAdapter::new()
            .verify_transaction_signed_by_intent_owner(&tx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionNotSignedByIssuer);
    }

    #[test]
    fn test_signed_by_issuer_accepts_dual_signature() {
        let w = wallet(0x42);
        let issuer = wallet(0x43);
        let w_key = Pubkey(w.key.verifying_key().to_bytes());
        let issuer_key = Pubkey(issuer.key.verifying_key().to_bytes());
        let meta = ProtocolMetaFields::new("someid", w.pubkey.clone())
            .with_issuer(issuer.pubkey.clone());

        let message = VersionedMessage::Legacy(LegacyMessage {
            header: MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![w_key, issuer_key, memo_program_key()],
            recent_blockhash: [7; 32],
            instructions: vec![CompiledInstruction {
                program_id_index: 2,
                account_key_indexes: vec![],
                data: build_meta(&meta).unwrap().into_bytes(),
            }],
        });
        let mut tx = VersionedTransaction::new_unsigned(message);
        let data = tx.message_data();
        tx.signatures[0] = SignatureBytes(w.key.sign(&data).to_bytes());
        tx.signatures[1] = SignatureBytes(issuer.key.sign(&data).to_bytes());

        SolanaAdapter::new()
            .verify_transaction_signed_by_intent_owner(&tx)
            .unwrap();
    }

    #[test]
    fn test_pubkeys_equal_constant_time_paths() {
        let w = wallet(0x42);
        assert!(pubkeys_equal(&w.pubkey, &w.pubkey));
        assert!(!pubkeys_equal(&w.pubkey, &wallet(0x43).pubkey));
        // Non-decodable strings fall back to string comparison.
        assert!(pubkeys_equal("wallet:solana", "wallet:solana"));
        assert!(!pubkeys_equal("wallet:solana", "wallet:near"));
    }
}
