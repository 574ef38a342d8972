//! Test fixtures: deterministic keypairs and a local signing capability.

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};

use action_codes::{Protocol, Signer};
use action_codes_core::canonical::delegation_proof_message;
use action_codes_core::config::CodeGenerationConfig;
use action_codes_core::delegation::DelegationProof;
use action_codes_core::error::ProtocolError;

/// A test Ed25519 keypair producing base58 strings, the way wallets do.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Base58 public key.
    pub fn pubkey(&self) -> String {
        bs58::encode(self.signing_key.verifying_key().to_bytes()).into_string()
    }

    /// Sign `message`, returning the base58 signature string.
    pub fn sign_b58(&self, message: &[u8]) -> String {
        bs58::encode(self.signing_key.sign(message).to_bytes()).into_string()
    }

    /// Raw public key bytes.
    pub fn pubkey_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Raw signature bytes over `message`.
    pub fn sign_bytes(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keypair({})", self.pubkey())
    }
}

/// An in-process [`Signer`] backed by a [`Keypair`].
///
/// Stands in for the host wallet in tests; real deployments never hand the
/// core a private key.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    keypair: Keypair,
}

impl LocalSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

#[async_trait]
impl Signer for LocalSigner {
    async fn sign(&self, message: &[u8], _chain: &str) -> Result<String, ProtocolError> {
        Ok(self.keypair.sign_b58(message))
    }
}

/// A [`Signer`] that always fails, for cancellation-path tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSigner;

#[async_trait]
impl Signer for FailingSigner {
    async fn sign(&self, _message: &[u8], _chain: &str) -> Result<String, ProtocolError> {
        Err(ProtocolError::CryptoError {
            detail: "host signing capability cancelled".into(),
        })
    }
}

/// A ready-to-use protocol instance plus wallet keypairs.
pub struct TestFixture {
    pub protocol: Protocol,
    pub wallet: Keypair,
    pub delegate: Keypair,
}

impl TestFixture {
    /// A fixture with the Solana adapter registered and deterministic keys.
    pub fn new() -> Self {
        Self::with_config(CodeGenerationConfig::default())
    }

    pub fn with_config(config: CodeGenerationConfig) -> Self {
        Self {
            protocol: Protocol::for_solana(config),
            wallet: Keypair::from_seed(&[0x42; 32]),
            delegate: Keypair::from_seed(&[0x43; 32]),
        }
    }

    /// A signer for the owner wallet.
    pub fn wallet_signer(&self) -> LocalSigner {
        LocalSigner::new(self.wallet.clone())
    }

    /// A signer for the delegated keypair.
    pub fn delegate_signer(&self) -> LocalSigner {
        LocalSigner::new(self.delegate.clone())
    }

    /// A delegation proof from the fixture wallet to the fixture delegate,
    /// signed by the owner, expiring at `expires_at`.
    pub fn delegation_proof(&self, expires_at: i64) -> DelegationProof {
        let message = delegation_proof_message(
            &self.wallet.pubkey(),
            &self.delegate.pubkey(),
            expires_at,
            "solana",
        )
        .expect("fixture pubkeys are canonical-safe");
        DelegationProof {
            wallet_pubkey: self.wallet.pubkey(),
            delegated_pubkey: self.delegate.pubkey(),
            chain: "solana".into(),
            expires_at,
            signature: self.wallet.sign_b58(&message),
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let a = Keypair::from_seed(&[7; 32]);
        let b = Keypair::from_seed(&[7; 32]);
        assert_eq!(a.pubkey(), b.pubkey());
        assert_eq!(a.sign_b58(b"m"), b.sign_b58(b"m"));
    }

    #[test]
    fn test_signatures_verify() {
        let kp = Keypair::from_seed(&[9; 32]);
        let message = b"fixture message";
        let sig_bytes = kp.sign_bytes(message);
        let vk = VerifyingKey::from_bytes(&kp.pubkey_bytes()).unwrap();
        vk.verify(message, &Signature::from_bytes(&sig_bytes)).unwrap();
    }

    #[tokio::test]
    async fn test_local_signer_signs() {
        let kp = Keypair::from_seed(&[1; 32]);
        let signer = LocalSigner::new(kp.clone());
        let sig = signer.sign(b"hello", "solana").await.unwrap();
        assert_eq!(sig, kp.sign_b58(b"hello"));
    }

    #[tokio::test]
    async fn test_failing_signer_fails() {
        assert!(FailingSigner.sign(b"hello", "solana").await.is_err());
    }

    #[test]
    fn test_fixture_proof_is_owner_signed() {
        let fixture = TestFixture::new();
        let proof = fixture.delegation_proof(2_000_000_000_000);
        let message = proof.message_bytes().unwrap();
        let vk = VerifyingKey::from_bytes(&fixture.wallet.pubkey_bytes()).unwrap();
        let sig_bytes: [u8; 64] = bs58::decode(&proof.signature)
            .into_vec()
            .unwrap()
            .try_into()
            .unwrap();
        vk.verify(&message, &Signature::from_bytes(&sig_bytes)).unwrap();
    }
}
