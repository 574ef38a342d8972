//! Protocol meta codec.
//!
//! Serialized form: `actioncodes:` followed by `&`-joined `key=value` pairs
//! with percent-encoded values, keys always written in the order
//! `ver, id, int, iss?, p?`. The string is embedded verbatim in chain memo
//! instructions, so the 512-byte cap is a hard wire limit, not advice.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use action_codes_core::error::ProtocolError;

use crate::fields::{ProtocolMetaFields, PROTOCOL_META_VERSION};

/// Scheme prefix of every serialized meta string.
pub const META_PREFIX: &str = "actioncodes:";

/// Maximum size of the entire serialized meta string, in bytes.
pub const MAX_META_BYTES: usize = 512;

/// Maximum size of the encoded `p` value, in bytes.
pub const MAX_PARAMS_BYTES: usize = 512;

/// Everything except ASCII alphanumerics and the unreserved marks.
const VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, VALUE_SET).to_string()
}

/// Serialize meta fields to the wire string.
pub fn build_meta(fields: &ProtocolMetaFields) -> Result<String, ProtocolError> {
    if fields.version != PROTOCOL_META_VERSION {
        return Err(ProtocolError::InvalidMetaFormat {
            detail: format!(
                "unsupported meta version {} (expected {PROTOCOL_META_VERSION})",
                fields.version
            ),
        });
    }
    if fields.id.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "id" });
    }
    if fields.intent.is_empty() {
        return Err(ProtocolError::MissingRequiredField { field: "int" });
    }

    let mut out = format!(
        "{META_PREFIX}ver={}&id={}&int={}",
        fields.version,
        encode_value(&fields.id),
        encode_value(&fields.intent),
    );

    // A redundant issuer is omitted on the wire.
    if let Some(issuer) = &fields.issuer {
        if issuer != &fields.intent {
            out.push_str("&iss=");
            out.push_str(&encode_value(issuer));
        }
    }

    if let Some(params) = &fields.params {
        let json = serde_json::to_string(params).map_err(|e| ProtocolError::InvalidMetaFormat {
            detail: format!("params not serializable: {e}"),
        })?;
        let encoded = encode_value(&json);
        if encoded.len() > MAX_PARAMS_BYTES {
            return Err(ProtocolError::MetaTooLarge {
                limit: MAX_PARAMS_BYTES,
                size: encoded.len(),
            });
        }
        out.push_str("&p=");
        out.push_str(&encoded);
    }

    if out.len() > MAX_META_BYTES {
        return Err(ProtocolError::MetaTooLarge {
            limit: MAX_META_BYTES,
            size: out.len(),
        });
    }
    Ok(out)
}

/// Parse a wire string back into meta fields.
///
/// Unknown keys and duplicates are rejected; `ver`, `id` and `int` are
/// required; values are whitespace-trimmed after percent-decoding. An `iss`
/// equal to `int` normalizes to `None`, matching what the serializer emits.
pub fn parse_meta(input: &str) -> Result<ProtocolMetaFields, ProtocolError> {
    if input.len() > MAX_META_BYTES {
        return Err(ProtocolError::MetaTooLarge {
            limit: MAX_META_BYTES,
            size: input.len(),
        });
    }
    let body = input
        .strip_prefix(META_PREFIX)
        .ok_or_else(|| ProtocolError::InvalidMetaFormat {
            detail: format!("missing `{META_PREFIX}` prefix"),
        })?;

    let mut version: Option<String> = None;
    let mut id: Option<String> = None;
    let mut intent: Option<String> = None;
    let mut issuer: Option<String> = None;
    let mut params_raw: Option<String> = None;

    for pair in body.split('&') {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            ProtocolError::InvalidMetaFormat {
                detail: format!("malformed pair `{pair}`"),
            }
        })?;
        let decoded = percent_decode_str(value)
            .decode_utf8()
            .map_err(|_| ProtocolError::InvalidMetaFormat {
                detail: format!("value of `{key}` is not valid UTF-8"),
            })?;
        let decoded = decoded.trim().to_string();

        let slot = match key {
            "ver" => &mut version,
            "id" => &mut id,
            "int" => &mut intent,
            "iss" => &mut issuer,
            "p" => &mut params_raw,
            other => {
                return Err(ProtocolError::InvalidMetaFormat {
                    detail: format!("unknown key `{other}`"),
                })
            }
        };
        if slot.is_some() {
            return Err(ProtocolError::InvalidMetaFormat {
                detail: format!("duplicate key `{key}`"),
            });
        }
        *slot = Some(decoded);
    }

    let version = version.ok_or(ProtocolError::MissingRequiredField { field: "ver" })?;
    let id = id.ok_or(ProtocolError::MissingRequiredField { field: "id" })?;
    let intent = intent.ok_or(ProtocolError::MissingRequiredField { field: "int" })?;

    let version: u8 = version.parse().map_err(|_| ProtocolError::InvalidMetaFormat {
        detail: format!("non-numeric version `{version}`"),
    })?;

    let params = match params_raw {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            ProtocolError::InvalidMetaFormat {
                detail: format!("params is not valid JSON: {e}"),
            }
        })?),
        None => None,
    };

    let issuer = issuer.filter(|iss| iss != &intent);

    Ok(ProtocolMetaFields {
        version,
        id,
        intent,
        issuer,
        params,
    })
}
