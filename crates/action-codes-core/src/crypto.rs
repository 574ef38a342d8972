//! Cryptographic primitives for code derivation and hashing.
//!
//! Everything here is deterministic and allocation-light: SHA-256 digests,
//! HMAC/HKDF key derivation, digit truncation for the numeric codes, and the
//! Crockford base32 code hash. Base58 decoding of keys and signatures lives
//! here too so length checks happen in one place, before any cryptographic
//! call.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::ProtocolError;

/// Byte length of an Ed25519 public key.
pub const PUBKEY_LENGTH: usize = 32;

/// Byte length of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Number of leading digest bits hashed into a code hash.
pub const CODE_HASH_BITS: usize = 80;

/// Crockford base32 alphabet (no padding, no check symbols).
pub const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// HMAC-SHA-256 of `message` under `key`.
///
/// HMAC accepts keys of any length, so this cannot fail.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .expect("HMAC-SHA-256 accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// HKDF-SHA-256: extract `ikm` with `salt`, then expand `len` bytes of output
/// keyed by `info`.
pub fn hkdf_sha256(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    len: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm).map_err(|_| ProtocolError::CryptoError {
        detail: format!("HKDF output length {len} exceeds the expand limit"),
    })?;
    Ok(okm)
}

/// Read the first `ceil(nbits / 8)` bytes of `bytes` big-endian and mask the
/// result to `nbits` bits.
pub fn truncate_bits(bytes: &[u8], nbits: u32) -> Result<u64, ProtocolError> {
    if nbits == 0 || nbits > 64 {
        return Err(ProtocolError::InvalidDigest {
            detail: format!("bit count {nbits} outside 1..=64"),
        });
    }
    let nbytes = nbits.div_ceil(8) as usize;
    if bytes.len() < nbytes {
        return Err(ProtocolError::InvalidDigest {
            detail: format!("digest too short: need {nbytes} bytes, got {}", bytes.len()),
        });
    }

    let mut value: u64 = 0;
    for &b in &bytes[..nbytes] {
        value = (value << 8) | u64::from(b);
    }
    let mask = if nbits == 64 { u64::MAX } else { (1u64 << nbits) - 1 };
    Ok(value & mask)
}

/// Reduce `digest`, read as an unsigned big-endian integer, modulo `10^n`,
/// and render it as a zero-padded decimal string of exactly `n` digits.
///
/// The reduction folds every digest byte into a `u128` accumulator without
/// branching on digit values, so the work done is independent of the output.
pub fn digits_from_digest(digest: &[u8], n: usize) -> Result<String, ProtocolError> {
    if n == 0 || n > 24 {
        return Err(ProtocolError::InvalidDigest {
            detail: format!("digit count {n} outside 1..=24"),
        });
    }
    if digest.is_empty() {
        return Err(ProtocolError::InvalidDigest {
            detail: "empty digest".into(),
        });
    }

    // 10^24 < 2^80, so acc stays far below u128::MAX even after the shift.
    let modulus = 10u128.pow(n as u32);
    let mut acc: u128 = 0;
    for &b in digest {
        acc = ((acc << 8) | u128::from(b)) % modulus;
    }
    Ok(format!("{acc:0width$}", width = n))
}

/// Crockford base32 encoding, 5 bits per symbol, no padding.
///
/// A trailing partial group is filled with zero bits, matching the usual
/// no-padding convention.
pub fn base32_encode_crockford(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = ((buffer >> bits) & 0x1f) as usize;
            out.push(CROCKFORD_ALPHABET[index] as char);
        }
    }
    if bits > 0 {
        let index = ((buffer << (5 - bits)) & 0x1f) as usize;
        out.push(CROCKFORD_ALPHABET[index] as char);
    }
    out
}

/// Hash of a code string: Crockford base32 of the first 80 bits of
/// SHA-256(code).
///
/// 80 bits is exactly ten bytes, so the output is always 16 symbols.
pub fn code_hash(code: &str) -> String {
    let digest = sha256(code.as_bytes());
    base32_encode_crockford(&digest[..CODE_HASH_BITS / 8])
}

/// Decode a base58 public key string into its 32 raw bytes.
pub fn decode_pubkey(field: &'static str, s: &str) -> Result<[u8; PUBKEY_LENGTH], ProtocolError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| ProtocolError::InvalidPubkeyFormat {
            field,
            detail: format!("not base58: {e}"),
        })?;
    bytes
        .try_into()
        .map_err(|_| ProtocolError::InvalidPubkeyFormat {
            field,
            detail: "decoded length is not 32 bytes".into(),
        })
}

/// Decode a base58 signature string into its 64 raw bytes.
pub fn decode_signature(s: &str) -> Result<[u8; SIGNATURE_LENGTH], ProtocolError> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| ProtocolError::InvalidSignature {
            detail: format!("not base58: {e}"),
        })?;
    bytes.try_into().map_err(|_| ProtocolError::InvalidSignature {
        detail: "decoded length is not 64 bytes".into(),
    })
}
