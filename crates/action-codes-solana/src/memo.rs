//! Memo handling: meta extraction and attachment.
//!
//! The protocol meta string travels in a Memo-program instruction. This
//! module finds such instructions, and inserts one into a pre-existing
//! transaction without renumbering anything the transaction already
//! references.

use std::collections::HashMap;

use action_codes_core::error::ProtocolError;
use action_codes_meta::{parse_meta, ProtocolMetaFields, META_PREFIX};

use crate::transaction::{
    CompiledInstruction, Pubkey, V0Message, VersionedMessage, VersionedTransaction,
};

/// The SPL Memo program (v2).
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// Decoded memo program key.
pub fn memo_program_key() -> Pubkey {
    Pubkey::from_base58(MEMO_PROGRAM_ID).expect("memo program id is a valid base58 key")
}

/// Resolution capability for v0 address lookup tables.
///
/// The core performs no RPC; a host that wants to attach meta to a
/// lookup-bearing transaction fetches the tables itself and exposes them
/// through this trait.
pub trait AddressLookupResolver {
    /// The full address list of the table at `table_key`, or `None` if the
    /// table is unknown.
    fn resolve(&self, table_key: &Pubkey) -> Option<Vec<Pubkey>>;
}

/// In-memory resolver backed by a map of pre-fetched tables.
#[derive(Debug, Default, Clone)]
pub struct StaticLookupResolver {
    tables: HashMap<[u8; 32], Vec<Pubkey>>,
}

impl StaticLookupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the contents of one lookup table.
    pub fn insert(&mut self, table_key: Pubkey, addresses: Vec<Pubkey>) {
        self.tables.insert(table_key.0, addresses);
    }
}

impl AddressLookupResolver for StaticLookupResolver {
    fn resolve(&self, table_key: &Pubkey) -> Option<Vec<Pubkey>> {
        self.tables.get(&table_key.0).cloned()
    }
}

/// The first memo instruction whose payload is a protocol meta string.
///
/// Returns the raw meta string, or `None` when the transaction carries no
/// parseable meta. Program ids always live in the static key list, so no
/// lookup resolution is needed to read meta back out.
pub fn find_protocol_meta(tx: &VersionedTransaction) -> Option<String> {
    let memo_key = memo_program_key();
    let static_keys = tx.message.static_account_keys();

    for ix in tx.message.instructions() {
        let program = static_keys.get(ix.program_id_index as usize);
        if program != Some(&memo_key) {
            continue;
        }
        let Ok(payload) = std::str::from_utf8(&ix.data) else {
            continue;
        };
        if payload.starts_with(META_PREFIX) && parse_meta(payload).is_ok() {
            return Some(payload.to_string());
        }
    }
    None
}

/// Parse the protocol meta carried by a transaction, if any.
pub fn find_and_parse_meta(tx: &VersionedTransaction) -> Option<ProtocolMetaFields> {
    find_protocol_meta(tx).and_then(|raw| parse_meta(&raw).ok())
}

/// Attach a protocol meta string to a transaction as a memo instruction.
///
/// Refuses when meta is already present. Every pre-existing instruction's
/// `program_id_index` and `account_key_indexes` stay numerically unchanged
/// and keep denoting the same accounts:
///
/// - legacy: the memo key is appended to the account list (if absent), which
///   shifts nothing;
/// - v0 with lookups: the resolved lookup addresses are first inlined into
///   the static list in combined order (static, loaded writable, loaded
///   readonly), which leaves the combined key sequence unchanged, then the
///   memo key is appended. Without a resolver this fails.
///
/// The message bytes change, so the result carries a fresh placeholder
/// signature set sized to the header's required-signature count; the caller
/// re-collects signatures.
pub fn attach_protocol_meta(
    tx: &VersionedTransaction,
    meta: &str,
    resolver: Option<&dyn AddressLookupResolver>,
) -> Result<VersionedTransaction, ProtocolError> {
    if !meta.starts_with(META_PREFIX) {
        return Err(ProtocolError::InvalidMetaFormat {
            detail: format!("missing `{META_PREFIX}` prefix"),
        });
    }
    if find_protocol_meta(tx).is_some() {
        return Err(ProtocolError::InvalidTransactionFormat {
            detail: "transaction already carries protocol meta".into(),
        });
    }

    let message = match &tx.message {
        VersionedMessage::Legacy(m) => {
            let mut m = m.clone();
            let (memo_index, appended) = index_of_or_append(&mut m.account_keys, memo_program_key());
            // A freshly appended memo key lands at the tail, among the
            // readonly unsigned accounts.
            if appended {
                m.header.num_readonly_unsigned_accounts =
                    m.header.num_readonly_unsigned_accounts.saturating_add(1);
            }
            m.instructions.push(memo_instruction(memo_index, meta)?);
            VersionedMessage::Legacy(m)
        }
        VersionedMessage::V0(m) => {
            let mut m = if m.address_table_lookups.is_empty() {
                m.clone()
            } else {
                let resolver = resolver.ok_or_else(|| ProtocolError::InvalidTransactionFormat {
                    detail: "attaching meta to a lookup-bearing transaction requires an \
                             address lookup resolver"
                        .into(),
                })?;
                inline_lookups(m, resolver)?
            };
            let (memo_index, appended) =
                index_of_or_append(&mut m.static_account_keys, memo_program_key());
            if appended {
                m.header.num_readonly_unsigned_accounts =
                    m.header.num_readonly_unsigned_accounts.saturating_add(1);
            }
            m.instructions.push(memo_instruction(memo_index, meta)?);
            VersionedMessage::V0(m)
        }
    };

    Ok(VersionedTransaction::new_unsigned(message))
}

fn memo_instruction(program_index: usize, meta: &str) -> Result<CompiledInstruction, ProtocolError> {
    let program_id_index =
        u8::try_from(program_index).map_err(|_| ProtocolError::InvalidTransactionFormat {
            detail: "account list too long to index the memo program".into(),
        })?;
    Ok(CompiledInstruction {
        program_id_index,
        account_key_indexes: vec![],
        data: meta.as_bytes().to_vec(),
    })
}

fn index_of_or_append(keys: &mut Vec<Pubkey>, key: Pubkey) -> (usize, bool) {
    match keys.iter().position(|k| *k == key) {
        Some(index) => (index, false),
        None => {
            keys.push(key);
            (keys.len() - 1, true)
        }
    }
}

/// Rewrite a lookup-bearing v0 message into an equivalent one with every
/// loaded address inlined into the static list.
///
/// Loaded addresses are appended in combined-index order (all writable
/// lookups in table order, then all readonly), so indices that previously
/// pointed past the static list keep pointing at the same account.
fn inline_lookups(
    m: &V0Message,
    resolver: &dyn AddressLookupResolver,
) -> Result<V0Message, ProtocolError> {
    let mut loaded_writable = Vec::new();
    let mut loaded_readonly = Vec::new();

    for lookup in &m.address_table_lookups {
        let table = resolver.resolve(&lookup.account_key).ok_or_else(|| {
            ProtocolError::InvalidTransactionFormat {
                detail: format!("unknown address lookup table {}", lookup.account_key),
            }
        })?;
        for &index in &lookup.writable_indexes {
            let address = table.get(index as usize).ok_or_else(|| {
                ProtocolError::InvalidTransactionFormat {
                    detail: format!(
                        "lookup index {index} out of range for table {}",
                        lookup.account_key
                    ),
                }
            })?;
            loaded_writable.push(*address);
        }
        for &index in &lookup.readonly_indexes {
            let address = table.get(index as usize).ok_or_else(|| {
                ProtocolError::InvalidTransactionFormat {
                    detail: format!(
                        "lookup index {index} out of range for table {}",
                        lookup.account_key
                    ),
                }
            })?;
            loaded_readonly.push(*address);
        }
    }

    let mut static_account_keys = m.static_account_keys.clone();
    static_account_keys.extend(loaded_writable);
    static_account_keys.extend(loaded_readonly);

    Ok(V0Message {
        header: m.header,
        static_account_keys,
        recent_blockhash: m.recent_blockhash,
        instructions: m.instructions.clone(),
        address_table_lookups: vec![],
    })
}
