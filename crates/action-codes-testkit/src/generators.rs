//! Proptest generators for property-based testing.

use proptest::prelude::*;

use action_codes::WalletStrategy;
use action_codes_core::canonical::generation_message;
use action_codes_core::config::CodeGenerationConfig;
use action_codes_meta::ProtocolMetaFields;

use crate::fixtures::Keypair;

/// Generate a deterministic keypair from an arbitrary seed.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a base58 pubkey string backed by a real Ed25519 key.
pub fn pubkey_b58() -> impl Strategy<Value = String> {
    keypair().prop_map(|kp| kp.pubkey())
}

/// Generate a plausible window-start timestamp.
pub fn window_start() -> impl Strategy<Value = i64> {
    1_500_000_000_000i64..=2_500_000_000_000i64
}

/// Generate a supported code length.
pub fn code_length() -> impl Strategy<Value = usize> {
    6usize..=24usize
}

/// Generate a positive ttl.
pub fn ttl_ms() -> impl Strategy<Value = i64> {
    1_000i64..=3_600_000i64
}

/// Generate a full code-generation config.
pub fn config() -> impl Strategy<Value = CodeGenerationConfig> {
    (code_length(), ttl_ms()).prop_map(|(len, ttl)| {
        CodeGenerationConfig::new(len, ttl).expect("generated ttl is positive")
    })
}

/// Generate a meta value string safe for the url codec.
pub fn meta_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:/_.-]{1,40}".prop_map(String::from)
}

/// Generate meta fields, sometimes with issuer and params.
pub fn meta_fields() -> impl Strategy<Value = ProtocolMetaFields> {
    (
        meta_value(),
        meta_value(),
        prop::option::of(meta_value()),
        prop::option::of(meta_value()),
    )
        .prop_map(|(id, intent, issuer, param)| {
            let mut meta = ProtocolMetaFields::new(id, intent);
            if let Some(issuer) = issuer {
                meta = meta.with_issuer(issuer);
            }
            if let Some(param) = param {
                meta = meta.with_params(serde_json::json!({ "action": param }));
            }
            meta
        })
}

/// Parameters for deriving a wallet code.
#[derive(Debug, Clone)]
pub struct DerivationParams {
    pub keypair: Keypair,
    pub window_start: i64,
    pub config: CodeGenerationConfig,
}

impl Arbitrary for DerivationParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<[u8; 32]>(), window_start(), config())
            .prop_map(|(seed, window_start, config)| DerivationParams {
                keypair: Keypair::from_seed(&seed),
                window_start,
                config,
            })
            .boxed()
    }
}

/// Derive a wallet code from parameters, signing with the real key.
pub fn derive_code(params: &DerivationParams) -> action_codes_core::code::ActionCode {
    let message = generation_message(&params.keypair.pubkey(), params.window_start)
        .expect("base58 pubkeys are canonical-safe");
    let signature = params.keypair.sign_b58(&message);
    WalletStrategy::new(params.config.clone())
        .generate_code(&message, "solana", &signature)
        .expect("derivation from a well-formed message succeeds")
}
