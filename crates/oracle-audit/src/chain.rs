//! Hash-chain primitives: canonical encoding, record hashing and chain
//! integrity verification.
//!
//! The record hash is SHA-256 over the UTF-8 bytes of the canonical JSON
//! encoding of every field except `hash`:
//!
//! ```text
//! {"answer": …, "deception_prob": …, "determinacy": …, "kind": …,
//!  "language": …, "prev_hash": …, "question": …, "risk_tags": […],
//!  "timestamp": …}
//! ```
//!
//! Keys are sorted, items are separated by `", "` and keys from values by
//! `": "`, non-ASCII text is written raw, and floats always carry a
//! fractional part (`0.0`, not `0`). Independent clients re-deriving a hash
//! must reproduce this encoding exactly.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use oracle_contracts::{
    error::{OracleError, OracleResult},
    record::AuditRecord,
    verify::ChainAudit,
};

/// Encode `value` canonically: sorted keys, `", "` / `": "` separators.
pub fn canonical_json(value: &Value) -> OracleResult<String> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> OracleResult<()> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
        Value::String(s) => out.push_str(&encode_str(s)?),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly; the map's own order depends on serde_json features.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&encode_str(key)?);
                out.push_str(": ");
                write_canonical(item, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn encode_str(s: &str) -> OracleResult<String> {
    serde_json::to_string(s).map_err(|e| OracleError::Serialization {
        reason: format!("failed to encode string for hashing: {}", e),
    })
}

/// The hashed payload of a record: every field except `hash`.
pub fn hash_payload(record: &AuditRecord) -> Value {
    json!({
        "question": record.question,
        "answer": record.answer,
        "kind": record.kind.as_str(),
        "determinacy": record.determinacy,
        "deception_prob": record.deception_prob,
        "risk_tags": record.risk_tags,
        "language": record.language.as_str(),
        "timestamp": record.timestamp,
        "prev_hash": record.prev_hash,
    })
}

/// Compute the hash of `record` from its fields. The stored `hash` field is
/// ignored.
///
/// Returns a lowercase 64-character hex string.
pub fn record_hash(record: &AuditRecord) -> OracleResult<String> {
    let canonical = canonical_json(&hash_payload(record))?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(hex::encode(digest))
}

/// Walk a chain from genesis, checking linkage and every stored hash.
///
/// A record passes when its `prev_hash` equals the preceding record's
/// `hash` (empty for the first record) and its `hash` matches the value
/// recomputed from its fields. Stops at the first failure. An empty chain
/// is valid.
pub fn verify_chain(records: &[AuditRecord]) -> ChainAudit {
    let mut expected_prev = String::new();

    for (index, record) in records.iter().enumerate() {
        let failure = if record.prev_hash != expected_prev {
            Some(format!(
                "record {} links to '{}' but the preceding hash is '{}'",
                index, record.prev_hash, expected_prev
            ))
        } else {
            match record_hash(record) {
                Ok(recomputed) if recomputed == record.hash => None,
                Ok(recomputed) => Some(format!(
                    "record {} stores hash '{}' but its fields hash to '{}'",
                    index, record.hash, recomputed
                )),
                Err(e) => Some(format!("record {} could not be re-hashed: {}", index, e)),
            }
        };

        if let Some(reason) = failure {
            return ChainAudit {
                valid: false,
                records_checked: index + 1,
                first_bad_hash: Some(record.hash.clone()),
                reason: Some(reason),
            };
        }

        expected_prev = record.hash.clone();
    }

    ChainAudit {
        valid: true,
        records_checked: records.len(),
        first_bad_hash: None,
        reason: None,
    }
}
