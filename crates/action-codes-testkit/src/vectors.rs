//! Golden vectors for cross-implementation verification.
//!
//! Every implementation of the protocol must produce identical canonical
//! message bytes, derived codes, and code hashes for these inputs. Vectors
//! are generated from fixed seeds so the signature chain is fully
//! reproducible.

use serde::{Deserialize, Serialize};

use action_codes::WalletStrategy;
use action_codes_core::canonical::{generation_message, revoke_message};
use action_codes_core::code::ActionCode;
use action_codes_core::config::CodeGenerationConfig;
use action_codes_core::crypto::code_hash;

use crate::fixtures::Keypair;

/// A single golden test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub seed: String,        // 32 bytes hex
    pub pubkey: String,      // base58 (derived)
    pub window_start: i64,
    pub code_length: usize,
    pub ttl_ms: i64,

    // Derived outputs
    pub canonical_message: String,
    pub signature: String,   // base58
    pub code: String,
    pub code_hash: String,
    pub expires_at: i64,
    pub revoke_message: String,
}

/// Generate one golden vector from fixed inputs.
pub fn generate_vector(
    name: &str,
    description: &str,
    seed: [u8; 32],
    window_start: i64,
    code_length: usize,
    ttl_ms: i64,
) -> GoldenVector {
    let keypair = Keypair::from_seed(&seed);
    let pubkey = keypair.pubkey();

    let message = generation_message(&pubkey, window_start)
        .expect("base58 pubkeys are canonical-safe");
    let signature = keypair.sign_b58(&message);

    let config = CodeGenerationConfig::new(code_length, ttl_ms).expect("positive ttl");
    let record = WalletStrategy::new(config)
        .generate_code(&message, "solana", &signature)
        .expect("derivation from a well-formed message succeeds");

    let hash = code_hash(&record.code);
    let revoke = revoke_message(&pubkey, &hash, window_start)
        .expect("code hashes are canonical-safe");

    GoldenVector {
        name: name.to_string(),
        description: description.to_string(),
        seed: hex::encode(seed),
        pubkey,
        window_start,
        code_length,
        ttl_ms,
        canonical_message: String::from_utf8(message).expect("canonical bytes are UTF-8"),
        signature,
        code: record.code,
        code_hash: hash,
        expires_at: record.expires_at,
        revoke_message: String::from_utf8(revoke).expect("canonical bytes are UTF-8"),
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        generate_vector(
            "default_config",
            "8-digit code, two-minute ttl",
            [0x01; 32],
            1_759_737_720_000,
            8,
            120_000,
        ),
        generate_vector(
            "minimum_length",
            "Shortest supported code (6 digits)",
            [0x02; 32],
            1_759_737_720_000,
            6,
            120_000,
        ),
        generate_vector(
            "maximum_length",
            "Longest supported code (24 digits)",
            [0x03; 32],
            1_759_737_720_000,
            24,
            120_000,
        ),
        generate_vector(
            "short_ttl",
            "One-second ttl",
            [0x04; 32],
            1_700_000_000_000,
            8,
            1_000,
        ),
        generate_vector(
            "long_ttl",
            "One-hour ttl",
            [0x05; 32],
            1_700_000_000_000,
            8,
            3_600_000,
        ),
        generate_vector(
            "epoch_window",
            "Window start pinned at a small timestamp",
            [0x06; 32],
            1_000,
            8,
            120_000,
        ),
    ]
}

/// Re-derive every vector and check self-consistency.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let seed: [u8; 32] = hex::decode(&vector.seed)
            .map_err(|e| format!("{}: bad seed hex: {e}", vector.name))?
            .try_into()
            .map_err(|_| format!("{}: seed is not 32 bytes", vector.name))?;

        let again = generate_vector(
            &vector.name,
            &vector.description,
            seed,
            vector.window_start,
            vector.code_length,
            vector.ttl_ms,
        );
        if again.canonical_message != vector.canonical_message
            || again.signature != vector.signature
            || again.code != vector.code
            || again.code_hash != vector.code_hash
        {
            return Err(format!("{}: vector is not reproducible", vector.name));
        }
    }
    Ok(())
}

/// Rebuild the ActionCode record a vector describes.
pub fn action_code_from_vector(vector: &GoldenVector) -> ActionCode {
    ActionCode {
        code: vector.code.clone(),
        pubkey: vector.pubkey.clone(),
        timestamp: vector.window_start,
        expires_at: vector.expires_at,
        chain: "solana".into(),
        signature: vector.signature.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_codes_core::adapter::ChainAdapter;
    use action_codes_solana::SolanaAdapter;

    #[test]
    fn test_vectors_deterministic() {
        let a = all_vectors();
        let b = all_vectors();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.canonical_message, y.canonical_message, "{}", x.name);
            assert_eq!(x.signature, y.signature, "{}", x.name);
            assert_eq!(x.code, y.code, "{}", x.name);
            assert_eq!(x.code_hash, y.code_hash, "{}", x.name);
        }
    }

    #[test]
    fn test_vectors_self_consistent() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_vectors_verify_through_adapter() {
        let adapter = SolanaAdapter::new();
        for vector in all_vectors() {
            let code = action_code_from_vector(&vector);
            assert!(
                adapter.verify_with_wallet(&code),
                "adapter rejected vector {}",
                vector.name
            );
        }
    }

    #[test]
    fn test_vector_invariants() {
        for vector in all_vectors() {
            assert_eq!(vector.code.len(), vector.code_length, "{}", vector.name);
            assert!(vector.code.bytes().all(|b| b.is_ascii_digit()));
            assert_eq!(
                vector.expires_at - vector.window_start,
                vector.ttl_ms,
                "{}",
                vector.name
            );
            assert_eq!(vector.code_hash.len(), 16, "{}", vector.name);
            assert!(vector
                .canonical_message
                .starts_with("{\"id\":\"actioncodes\",\"ver\":1,"));
            assert!(vector
                .revoke_message
                .starts_with("{\"id\":\"actioncodes-revoke\",\"ver\":1,"));
        }
    }

    #[test]
    fn test_canonical_message_pins_window_start_digits() {
        let vector = &all_vectors()[0];
        assert!(vector
            .canonical_message
            .ends_with("\"windowStart\":1759737720000}"));
    }

    #[test]
    fn test_vectors_serialize_to_json() {
        let json = serde_json::to_string_pretty(&all_vectors()).unwrap();
        assert!(json.contains("\"default_config\""));
        let back: Vec<GoldenVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), all_vectors().len());
    }
}
