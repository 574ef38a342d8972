//! The protocol façade.
//!
//! Brings the two strategies and the chain-adapter registry together behind
//! one API: generate, validate, revoke. The façade owns no keys and stores
//! no codes; the only mutable state is the adapter registry, written at
//! construction or through explicit registration and read-mostly afterwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use action_codes_core::adapter::ChainAdapter;
use action_codes_core::canonical::{generation_message, revoke_message};
use action_codes_core::code::{IssuedCode, RevokeRecord};
use action_codes_core::config::CodeGenerationConfig;
use action_codes_core::crypto::code_hash;
use action_codes_core::delegation::DelegationProof;
use action_codes_core::error::ProtocolError;
use action_codes_core::validation::now_ms;
use action_codes_solana::SolanaAdapter;

use crate::signer::Signer;
use crate::strategy::{DelegationStrategy, WalletStrategy};

/// What to issue a code for: a wallet key directly, or a delegation proof.
#[derive(Debug, Clone, Copy)]
pub enum GenerateRequest<'a> {
    Wallet { pubkey: &'a str },
    Delegation { proof: &'a DelegationProof },
}

/// The protocol entry point.
pub struct Protocol {
    config: CodeGenerationConfig,
    adapters: RwLock<HashMap<String, Arc<dyn ChainAdapter>>>,
    wallet: WalletStrategy,
    delegation: DelegationStrategy,
}

impl Protocol {
    /// A protocol instance with an empty adapter registry.
    pub fn new(config: CodeGenerationConfig) -> Self {
        Self {
            wallet: WalletStrategy::new(config.clone()),
            delegation: DelegationStrategy::new(config.clone()),
            adapters: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// A protocol instance with the Solana adapter pre-registered.
    pub fn for_solana(config: CodeGenerationConfig) -> Self {
        let protocol = Self::new(config);
        protocol.register_adapter(SolanaAdapter::CHAIN, Arc::new(SolanaAdapter::new()));
        protocol
    }

    pub fn config(&self) -> &CodeGenerationConfig {
        &self.config
    }

    /// Register (or replace) the adapter for `chain`.
    pub fn register_adapter(&self, chain: impl Into<String>, adapter: Arc<dyn ChainAdapter>) {
        let chain = chain.into();
        tracing::debug!(%chain, "registering chain adapter");
        self.adapters
            .write()
            .expect("adapter registry lock poisoned")
            .insert(chain, adapter);
    }

    /// The adapter registered for `chain`, if any.
    pub fn adapter(&self, chain: &str) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters
            .read()
            .expect("adapter registry lock poisoned")
            .get(chain)
            .cloned()
    }

    /// The chains this instance can serve.
    pub fn supported_chains(&self) -> Vec<String> {
        let mut chains: Vec<String> = self
            .adapters
            .read()
            .expect("adapter registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        chains.sort();
        chains
    }

    fn require_adapter(&self, chain: &str) -> Result<Arc<dyn ChainAdapter>, ProtocolError> {
        self.adapter(chain).ok_or_else(|| ProtocolError::InvalidAdapter {
            chain: chain.to_string(),
        })
    }

    /// Issue a code for the current time window.
    ///
    /// Builds the canonical generation message, suspends on the host signing
    /// capability, and hands the signature to the selected strategy. A
    /// signer failure surfaces unchanged; nothing partial is published.
    pub async fn generate(
        &self,
        request: GenerateRequest<'_>,
        chain: &str,
        signer: &dyn Signer,
    ) -> Result<IssuedCode, ProtocolError> {
        self.require_adapter(chain)?;
        let window_start = now_ms();

        match request {
            GenerateRequest::Wallet { pubkey } => {
                let message = generation_message(pubkey, window_start)?;
                let signature = signer.sign(&message, chain).await?;
                let code = self.wallet.generate_code(&message, chain, &signature)?;
                tracing::debug!(%chain, window_start, "issued wallet action code");
                Ok(IssuedCode::Wallet(code))
            }
            GenerateRequest::Delegation { proof } => {
                let message = generation_message(&proof.delegated_pubkey, window_start)?;
                let signature = signer.sign(&message, chain).await?;
                let code = self.delegation.generate_delegated_code_at(
                    proof,
                    &message,
                    chain,
                    &signature,
                    window_start,
                )?;
                tracing::debug!(%chain, window_start, "issued delegated action code");
                Ok(IssuedCode::Delegated(code))
            }
        }
    }

    /// Validate a code against the system clock.
    pub fn validate(&self, code: &IssuedCode) -> Result<(), ProtocolError> {
        self.validate_at(code, now_ms())
    }

    /// Validate a code at time `now`: strategy checks first, then the chain
    /// adapter's signature predicate. An adapter `false` is reported as
    /// `INVALID_SIGNATURE`.
    pub fn validate_at(&self, code: &IssuedCode, now: i64) -> Result<(), ProtocolError> {
        let adapter = self.require_adapter(code.chain())?;

        let verified = match code {
            IssuedCode::Wallet(record) => {
                self.wallet.validate_code_at(record, now)?;
                adapter.verify_with_wallet(record)
            }
            IssuedCode::Delegated(record) => {
                self.delegation.validate_delegated_code_at(record, now)?;
                adapter.verify_with_delegation(record)
            }
        };

        if !verified {
            tracing::debug!(chain = code.chain(), "adapter rejected code signature");
            return Err(ProtocolError::InvalidSignature {
                detail: "chain adapter rejected the code's signatures".into(),
            });
        }
        Ok(())
    }

    /// Revoke a code: sign the canonical revoke message and verify the
    /// result through the chain adapter.
    ///
    /// The returned [`RevokeRecord`] is the receipt; the core stores
    /// nothing.
    pub async fn revoke(
        &self,
        code: &IssuedCode,
        signer: &dyn Signer,
    ) -> Result<RevokeRecord, ProtocolError> {
        let adapter = self.require_adapter(code.chain())?;
        let record = code.action_code();

        let message = revoke_message(&record.pubkey, &code_hash(&record.code), record.timestamp)?;
        let revoke_signature = signer.sign(&message, code.chain()).await?;
        if revoke_signature.is_empty() {
            return Err(ProtocolError::InvalidSignature {
                detail: "signing capability returned an empty signature".into(),
            });
        }

        let verified = match code {
            IssuedCode::Wallet(record) => {
                adapter.verify_revoke_with_wallet(record, &revoke_signature)
            }
            IssuedCode::Delegated(record) => {
                adapter.verify_revoke_with_delegation(record, &revoke_signature)
            }
        };
        if !verified {
            return Err(ProtocolError::InvalidSignature {
                detail: "chain adapter rejected the revoke signature".into(),
            });
        }

        tracing::debug!(chain = code.chain(), "revoked action code");
        Ok(RevokeRecord {
            code: code.clone(),
            revoke_signature,
        })
    }
}
