//! # Action Codes Testkit
//!
//! Testing utilities for the action-code protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: deterministic Ed25519 keypairs, an in-process signing
//!   capability, and a ready-made protocol instance
//! - **Generators**: proptest strategies for property-based testing
//! - **Golden vectors**: fixed-seed test cases whose derived codes and
//!   canonical bytes must match across implementations
//!
//! ## Fixtures
//!
//! ```rust
//! use action_codes_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let signer = fixture.wallet_signer();
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use action_codes_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! verify_all_vectors().unwrap();
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.code);
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{FailingSigner, Keypair, LocalSigner, TestFixture};
pub use generators::{derive_code, DerivationParams};
pub use vectors::{action_code_from_vector, all_vectors, verify_all_vectors, GoldenVector};
