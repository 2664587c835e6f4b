//! Client-side chain verification.
//!
//! A client that kept the `{hash, prev_hash}` pairs from earlier responses
//! submits them here. Each claim is checked on its own: the record must
//! exist and the ledger must have recorded the same predecessor. Claims are
//! not checked against each other; `Ledger::audit` walks the full chain.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use oracle_contracts::{
    error::{OracleError, OracleResult},
    verify::{ChainClaim, ChainReport, ClaimResult},
};
use oracle_core::traits::LedgerStore;

/// Reason reported for a claim whose hash is not in the ledger.
pub const REASON_NOT_FOUND: &str = "not found";

/// Reason reported for a claim whose predecessor differs from the ledger's.
pub const REASON_PREV_MISMATCH: &str = "prev_hash mismatch";

/// JSON Schema for the verification request body.
fn claims_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["hash"],
            "properties": {
                "hash": { "type": "string" },
                "prev_hash": { "type": "string" }
            }
        }
    })
}

pub struct ChainVerifier {
    store: Arc<dyn LedgerStore>,
    validator: jsonschema::Validator,
}

impl ChainVerifier {
    /// Returns `ConfigError` if the request schema fails to compile.
    pub fn new(store: Arc<dyn LedgerStore>) -> OracleResult<Self> {
        let validator =
            jsonschema::validator_for(&claims_schema()).map_err(|e| OracleError::ConfigError {
                reason: format!("invalid verification request schema: {e}"),
            })?;
        Ok(Self { store, validator })
    }

    /// Check every claim against the ledger, in submission order.
    pub fn verify(&self, claims: &[ChainClaim]) -> OracleResult<ChainReport> {
        let mut results = Vec::with_capacity(claims.len());

        for claim in claims {
            let result = match self.store.get_by_hash(&claim.hash)? {
                None => ClaimResult {
                    hash: claim.hash.clone(),
                    ok: false,
                    reason: Some(REASON_NOT_FOUND.to_string()),
                    backend_prev_hash: None,
                    supplied_prev_hash: claim.prev_hash.clone(),
                },
                Some(record) => {
                    let ok = record.prev_hash == claim.prev_hash;
                    ClaimResult {
                        hash: claim.hash.clone(),
                        ok,
                        reason: (!ok).then(|| REASON_PREV_MISMATCH.to_string()),
                        backend_prev_hash: Some(record.prev_hash),
                        supplied_prev_hash: claim.prev_hash.clone(),
                    }
                }
            };

            if !result.ok {
                warn!(
                    hash = %result.hash,
                    reason = result.reason.as_deref().unwrap_or(""),
                    "chain claim rejected"
                );
            }
            results.push(result);
        }

        let report = ChainReport::from_results(results);
        debug!(
            claims = claims.len(),
            outcome = ?report.outcome,
            "chain verification complete"
        );
        Ok(report)
    }

    /// Validate a raw request body, then verify its claims.
    ///
    /// Every schema violation is collected into one `SchemaValidation`
    /// error so the caller sees the whole failure set at once.
    pub fn verify_json(&self, body: &Value) -> OracleResult<ChainReport> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(body)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect();
        if !violations.is_empty() {
            return Err(OracleError::SchemaValidation {
                reason: violations.join("; "),
            });
        }

        let claims: Vec<ChainClaim> =
            serde_json::from_value(body.clone()).map_err(|e| OracleError::Serialization {
                reason: format!("failed to decode verification claims: {e}"),
            })?;
        self.verify(&claims)
    }
}
