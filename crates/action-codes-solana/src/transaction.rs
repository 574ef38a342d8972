//! Minimal Solana transaction model and wire codec.
//!
//! The adapter only needs to read instructions and signer sets out of a
//! transaction and to insert one memo instruction, so the model here covers
//! exactly the two message layouts (legacy and v0) with their compact-u16
//! ("shortvec") array encoding. Round-trips are byte-exact: decoding and
//! re-encoding an unmodified transaction reproduces the input.

use std::fmt;

use action_codes_core::error::ProtocolError;

/// Top bit of the first message byte marks a versioned message.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

fn malformed(detail: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidTransactionFormat {
        detail: detail.into(),
    }
}

/// A 32-byte Solana account key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a base58 string.
    pub fn from_base58(s: &str) -> Result<Self, ProtocolError> {
        action_codes_core::crypto::decode_pubkey("pubkey", s).map(Self)
    }

    /// Base58 rendering.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_base58())
    }
}

/// A 64-byte Ed25519 transaction signature slot.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; 64]);

impl SignatureBytes {
    /// The all-zero placeholder written into unsigned slots.
    pub const PLACEHOLDER: Self = Self([0u8; 64]);

    /// Whether this slot still holds the placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Base58 rendering.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// The three signer-accounting counts at the head of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// One instruction, with indices into the message's account key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_key_indexes: Vec<u8>,
    pub data: Vec<u8>,
}

/// A v0 message's reference into an on-chain address lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

/// The legacy (pre-versioning) message layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMessage {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

/// The v0 message layout with address-table lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V0Message {
    pub header: MessageHeader,
    pub static_account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

/// Either message layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedMessage {
    Legacy(LegacyMessage),
    V0(V0Message),
}

impl VersionedMessage {
    /// The signer-accounting header.
    pub fn header(&self) -> &MessageHeader {
        match self {
            VersionedMessage::Legacy(m) => &m.header,
            VersionedMessage::V0(m) => &m.header,
        }
    }

    /// The statically listed account keys.
    ///
    /// Program ids and required signers always live here; only extra
    /// instruction accounts can come from lookup tables.
    pub fn static_account_keys(&self) -> &[Pubkey] {
        match self {
            VersionedMessage::Legacy(m) => &m.account_keys,
            VersionedMessage::V0(m) => &m.static_account_keys,
        }
    }

    /// The compiled instructions.
    pub fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            VersionedMessage::Legacy(m) => &m.instructions,
            VersionedMessage::V0(m) => &m.instructions,
        }
    }

    /// Number of signatures the message requires.
    pub fn num_required_signatures(&self) -> usize {
        self.header().num_required_signatures as usize
    }

    /// Serialize to wire bytes (the bytes signers sign).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            VersionedMessage::Legacy(m) => encode_legacy_message(&mut buf, m),
            VersionedMessage::V0(m) => encode_v0_message(&mut buf, m),
        }
        buf
    }
}

/// A complete transaction: signature slots plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedTransaction {
    pub signatures: Vec<SignatureBytes>,
    pub message: VersionedMessage,
}

impl VersionedTransaction {
    /// Wrap a message with a fresh placeholder signature set sized to the
    /// header's required-signature count.
    pub fn new_unsigned(message: VersionedMessage) -> Self {
        let slots = message.num_required_signatures();
        Self {
            signatures: vec![SignatureBytes::PLACEHOLDER; slots],
            message,
        }
    }

    /// The bytes signers sign.
    pub fn message_data(&self) -> Vec<u8> {
        self.message.serialize()
    }

    /// Serialize the whole transaction to wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        shortvec::encode_len(&mut buf, self.signatures.len());
        for sig in &self.signatures {
            buf.extend_from_slice(&sig.0);
        }
        buf.extend_from_slice(&self.message.serialize());
        buf
    }

    /// Decode wire bytes, attempting the versioned layout first and falling
    /// back to legacy.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        decode_versioned(bytes).or_else(|_| decode_legacy(bytes))
    }

    /// Decode a base64-encoded transaction, the form relayer APIs pass
    /// around.
    pub fn decode_base64(encoded: &str) -> Result<Self, ProtocolError> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| malformed(format!("invalid base64 transaction: {e}")))?;
        Self::decode(&bytes)
    }

    /// Serialize to a base64 string.
    pub fn encode_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.serialize())
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Wire codec
// ─────────────────────────────────────────────────────────────────────────

/// Compact-u16 length encoding: 7 bits per byte, low bits first, high bit
/// marks continuation. At most 3 bytes.
mod shortvec {
    use super::{malformed, Reader};
    use action_codes_core::error::ProtocolError;

    pub fn encode_len(buf: &mut Vec<u8>, len: usize) {
        debug_assert!(len <= u16::MAX as usize);
        let mut rem = len as u16;
        loop {
            let mut byte = (rem & 0x7f) as u8;
            rem >>= 7;
            if rem != 0 {
                byte |= 0x80;
            }
            buf.push(byte);
            if rem == 0 {
                break;
            }
        }
    }

    pub fn decode_len(reader: &mut Reader<'_>) -> Result<usize, ProtocolError> {
        let mut len: usize = 0;
        for i in 0..3 {
            let byte = reader.read_u8()?;
            len |= usize::from(byte & 0x7f) << (i * 7);
            if byte & 0x80 == 0 {
                if len > u16::MAX as usize {
                    return Err(malformed("compact-u16 length out of range"));
                }
                return Ok(len);
            }
        }
        Err(malformed("compact-u16 length runs past 3 bytes"))
    }
}

/// Bounds-checked byte reader.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| malformed("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_slice(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| malformed("unexpected end of input"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let slice = self.read_slice(N)?;
        Ok(slice.try_into().expect("slice length checked"))
    }

    fn read_pubkey(&mut self) -> Result<Pubkey, ProtocolError> {
        Ok(Pubkey(self.read_array::<32>()?))
    }

    fn read_byte_vec(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let len = shortvec::decode_len(self)?;
        Ok(self.read_slice(len)?.to_vec())
    }

    fn finished(&self) -> bool {
        self.pos == self.buf.len()
    }
}

fn encode_header(buf: &mut Vec<u8>, header: &MessageHeader) {
    buf.push(header.num_required_signatures);
    buf.push(header.num_readonly_signed_accounts);
    buf.push(header.num_readonly_unsigned_accounts);
}

fn encode_instructions(buf: &mut Vec<u8>, instructions: &[CompiledInstruction]) {
    shortvec::encode_len(buf, instructions.len());
    for ix in instructions {
        buf.push(ix.program_id_index);
        shortvec::encode_len(buf, ix.account_key_indexes.len());
        buf.extend_from_slice(&ix.account_key_indexes);
        shortvec::encode_len(buf, ix.data.len());
        buf.extend_from_slice(&ix.data);
    }
}

fn encode_keys(buf: &mut Vec<u8>, keys: &[Pubkey]) {
    shortvec::encode_len(buf, keys.len());
    for key in keys {
        buf.extend_from_slice(&key.0);
    }
}

fn encode_legacy_message(buf: &mut Vec<u8>, m: &LegacyMessage) {
    encode_header(buf, &m.header);
    encode_keys(buf, &m.account_keys);
    buf.extend_from_slice(&m.recent_blockhash);
    encode_instructions(buf, &m.instructions);
}

fn encode_v0_message(buf: &mut Vec<u8>, m: &V0Message) {
    buf.push(MESSAGE_VERSION_PREFIX);
    encode_header(buf, &m.header);
    encode_keys(buf, &m.static_account_keys);
    buf.extend_from_slice(&m.recent_blockhash);
    encode_instructions(buf, &m.instructions);
    shortvec::encode_len(buf, m.address_table_lookups.len());
    for lookup in &m.address_table_lookups {
        buf.extend_from_slice(&lookup.account_key.0);
        shortvec::encode_len(buf, lookup.writable_indexes.len());
        buf.extend_from_slice(&lookup.writable_indexes);
        shortvec::encode_len(buf, lookup.readonly_indexes.len());
        buf.extend_from_slice(&lookup.readonly_indexes);
    }
}

fn decode_signatures(reader: &mut Reader<'_>) -> Result<Vec<SignatureBytes>, ProtocolError> {
    let count = shortvec::decode_len(reader)?;
    let mut signatures = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        signatures.push(SignatureBytes(reader.read_array::<64>()?));
    }
    Ok(signatures)
}

fn decode_header(reader: &mut Reader<'_>) -> Result<MessageHeader, ProtocolError> {
    Ok(MessageHeader {
        num_required_signatures: reader.read_u8()?,
        num_readonly_signed_accounts: reader.read_u8()?,
        num_readonly_unsigned_accounts: reader.read_u8()?,
    })
}

fn decode_keys(reader: &mut Reader<'_>) -> Result<Vec<Pubkey>, ProtocolError> {
    let count = shortvec::decode_len(reader)?;
    let mut keys = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        keys.push(reader.read_pubkey()?);
    }
    Ok(keys)
}

fn decode_instructions(reader: &mut Reader<'_>) -> Result<Vec<CompiledInstruction>, ProtocolError> {
    let count = shortvec::decode_len(reader)?;
    let mut instructions = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        instructions.push(CompiledInstruction {
            program_id_index: reader.read_u8()?,
            account_key_indexes: reader.read_byte_vec()?,
            data: reader.read_byte_vec()?,
        });
    }
    Ok(instructions)
}

fn decode_versioned(bytes: &[u8]) -> Result<VersionedTransaction, ProtocolError> {
    let mut reader = Reader::new(bytes);
    let signatures = decode_signatures(&mut reader)?;

    let prefix = reader.read_u8()?;
    if prefix & MESSAGE_VERSION_PREFIX == 0 {
        return Err(malformed("not a versioned message"));
    }
    let version = prefix & !MESSAGE_VERSION_PREFIX;
    if version != 0 {
        return Err(malformed(format!("unsupported message version {version}")));
    }

    let header = decode_header(&mut reader)?;
    let static_account_keys = decode_keys(&mut reader)?;
    let recent_blockhash = reader.read_array::<32>()?;
    let instructions = decode_instructions(&mut reader)?;

    let lookup_count = shortvec::decode_len(&mut reader)?;
    let mut address_table_lookups = Vec::with_capacity(lookup_count.min(16));
    for _ in 0..lookup_count {
        address_table_lookups.push(MessageAddressTableLookup {
            account_key: reader.read_pubkey()?,
            writable_indexes: reader.read_byte_vec()?,
            readonly_indexes: reader.read_byte_vec()?,
        });
    }

    if !reader.finished() {
        return Err(malformed("trailing bytes after versioned message"));
    }

    Ok(VersionedTransaction {
        signatures,
        message: VersionedMessage::V0(V0Message {
            header,
            static_account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        }),
    })
}

fn decode_legacy(bytes: &[u8]) -> Result<VersionedTransaction, ProtocolError> {
    let mut reader = Reader::new(bytes);
    let signatures = decode_signatures(&mut reader)?;

    let header = decode_header(&mut reader)?;
    if header.num_required_signatures & MESSAGE_VERSION_PREFIX != 0 {
        return Err(malformed("not a legacy message"));
    }
    let account_keys = decode_keys(&mut reader)?;
    let recent_blockhash = reader.read_array::<32>()?;
    let instructions = decode_instructions(&mut reader)?;

    if !reader.finished() {
        return Err(malformed("trailing bytes after legacy message"));
    }

    Ok(VersionedTransaction {
        signatures,
        message: VersionedMessage::Legacy(LegacyMessage {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey([byte; 32])
    }

    fn legacy_message() -> LegacyMessage {
        LegacyMessage {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![key(1), key(2), key(3)],
            recent_blockhash: [9u8; 32],
            instructions: vec![CompiledInstruction {
                program_id_index: 2,
                account_key_indexes: vec![0, 1],
                data: vec![0xde, 0xad],
            }],
        }
    }

    fn v0_message() -> V0Message {
        V0Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            static_account_keys: vec![key(1), key(2)],
            recent_blockhash: [9u8; 32],
            instructions: vec![CompiledInstruction {
                program_id_index: 1,
                account_key_indexes: vec![0, 2, 3],
                data: vec![1, 2, 3],
            }],
            address_table_lookups: vec![MessageAddressTableLookup {
                account_key: key(7),
                writable_indexes: vec![4],
                readonly_indexes: vec![5],
            }],
        }
    }

    #[test]
    fn test_shortvec_known_encodings() {
        for (len, expected) in [
            (0usize, vec![0x00u8]),
            (5, vec![0x05]),
            (0x7f, vec![0x7f]),
            (0x80, vec![0x80, 0x01]),
            (0xff, vec![0xff, 0x01]),
            (0x4000, vec![0x80, 0x80, 0x01]),
        ] {
            let mut buf = Vec::new();
            shortvec::encode_len(&mut buf, len);
            assert_eq!(buf, expected, "encoding of {len}");

            let mut reader = Reader::new(&buf);
            assert_eq!(shortvec::decode_len(&mut reader).unwrap(), len);
        }
    }

    #[test]
    fn test_shortvec_rejects_overlong() {
        let mut reader = Reader::new(&[0x80, 0x80, 0x80, 0x01]);
        assert!(shortvec::decode_len(&mut reader).is_err());
    }

    #[test]
    fn test_legacy_roundtrip() {
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x11; 64])],
            message: VersionedMessage::Legacy(legacy_message()),
        };
        let bytes = tx.serialize();
        let decoded = VersionedTransaction::decode(&bytes).unwrap();
        assert_eq!(decoded, tx);
        // Re-encoding is byte-exact.
        assert_eq!(decoded.serialize(), bytes);
    }

    #[test]
    fn test_v0_roundtrip() {
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x22; 64])],
            message: VersionedMessage::V0(v0_message()),
        };
        let bytes = tx.serialize();
        let decoded = VersionedTransaction::decode(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.serialize(), bytes);
    }

    #[test]
    fn test_decode_distinguishes_layouts() {
        let legacy = VersionedTransaction {
            signatures: vec![SignatureBytes::PLACEHOLDER],
            message: VersionedMessage::Legacy(legacy_message()),
        };
        let decoded = VersionedTransaction::decode(&legacy.serialize()).unwrap();
        assert!(matches!(decoded.message, VersionedMessage::Legacy(_)));

        let v0 = VersionedTransaction {
            signatures: vec![SignatureBytes::PLACEHOLDER],
            message: VersionedMessage::V0(v0_message()),
        };
        let decoded = VersionedTransaction::decode(&v0.serialize()).unwrap();
        assert!(matches!(decoded.message, VersionedMessage::V0(_)));
    }

    #[test]
    fn test_decode_rejects_unsupported_version() {
        let mut bytes = Vec::new();
        shortvec::encode_len(&mut bytes, 0);
        bytes.push(MESSAGE_VERSION_PREFIX | 1); // version 1
        let err = VersionedTransaction::decode(&bytes).unwrap_err();
        assert_eq!(
            err.kind(),
            action_codes_core::error::ErrorKind::InvalidTransactionFormat
        );
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::Legacy(legacy_message()),
        };
        let mut bytes = tx.serialize();
        bytes.push(0xaa);
        assert!(VersionedTransaction::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x33; 64])],
            message: VersionedMessage::V0(v0_message()),
        };
        let bytes = tx.serialize();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                VersionedTransaction::decode(&bytes[..cut]).is_err(),
                "accepted truncation at {cut}"
            );
        }
    }

    #[test]
    fn test_new_unsigned_sizes_signature_set() {
        let mut message = legacy_message();
        message.header.num_required_signatures = 3;
        let tx = VersionedTransaction::new_unsigned(VersionedMessage::Legacy(message));
        assert_eq!(tx.signatures.len(), 3);
        assert!(tx.signatures.iter().all(SignatureBytes::is_placeholder));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(SignatureBytes::PLACEHOLDER.is_placeholder());
        assert!(!SignatureBytes([1u8; 64]).is_placeholder());
    }

    #[test]
    fn test_message_data_excludes_signatures() {
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x44; 64])],
            message: VersionedMessage::Legacy(legacy_message()),
        };
        let message_data = tx.message_data();
        let full = tx.serialize();
        assert_eq!(&full[full.len() - message_data.len()..], &message_data[..]);
        assert!(message_data.len() < full.len());
    }

    #[test]
    fn test_pubkey_base58_roundtrip() {
        let pk = key(0x42);
        let b58 = pk.to_base58();
        assert_eq!(Pubkey::from_base58(&b58).unwrap(), pk);
    }

    #[test]
    fn test_base64_roundtrip() {
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x55; 64])],
            message: VersionedMessage::V0(v0_message()),
        };
        let encoded = tx.encode_base64();
        let decoded = VersionedTransaction::decode_base64(&encoded).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(VersionedTransaction::decode_base64("!!!not-base64!!!").is_err());
    }

    #[test]
    fn test_multisig_roundtrip() {
        let mut message = legacy_message();
        message.header.num_required_signatures = 2;
        message.header.num_readonly_signed_accounts = 1;
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes([0x01; 64]), SignatureBytes([0x02; 64])],
            message: VersionedMessage::Legacy(message),
        };
        let decoded = VersionedTransaction::decode(&tx.serialize()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.message.num_required_signatures(), 2);
    }

    #[test]
    fn test_v0_multiple_lookup_tables_roundtrip() {
        let mut message = v0_message();
        message.address_table_lookups.push(MessageAddressTableLookup {
            account_key: key(0x71),
            writable_indexes: vec![0, 1, 2],
            readonly_indexes: vec![],
        });
        let tx = VersionedTransaction {
            signatures: vec![SignatureBytes::PLACEHOLDER],
            message: VersionedMessage::V0(message),
        };
        let decoded = VersionedTransaction::decode(&tx.serialize()).unwrap();
        assert_eq!(decoded, tx);
    }
}
