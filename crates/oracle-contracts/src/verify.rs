//! Chain verification protocol types.
//!
//! A client submits a list of `ChainClaim`s it recorded from earlier
//! responses; the verifier answers with one `ClaimResult` per claim and an
//! aggregate outcome.

use serde::{Deserialize, Serialize};

/// A client's claim about one record: its hash and the predecessor it was
/// told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainClaim {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub prev_hash: String,
}

/// The verdict for a single claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResult {
    pub hash: String,
    pub ok: bool,
    /// Why the claim failed; absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The predecessor the ledger actually recorded, when the record exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_prev_hash: Option<String>,
    pub supplied_prev_hash: String,
}

/// Aggregate outcome of a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Every claim passed (or there were none).
    Verified,
    /// Some claims passed, some failed.
    Partial,
    /// No claim passed.
    Failed,
}

impl VerificationOutcome {
    /// The HTTP-style status code a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            VerificationOutcome::Verified => 200,
            VerificationOutcome::Partial => 207,
            VerificationOutcome::Failed => 409,
        }
    }
}

/// The full answer to a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub all_ok: bool,
    pub outcome: VerificationOutcome,
    pub results: Vec<ClaimResult>,
}

impl ChainReport {
    /// Build a report from per-claim results, deriving the aggregate fields.
    pub fn from_results(results: Vec<ClaimResult>) -> Self {
        let passed = results.iter().filter(|r| r.ok).count();
        let outcome = if passed == results.len() {
            VerificationOutcome::Verified
        } else if passed > 0 {
            VerificationOutcome::Partial
        } else {
            VerificationOutcome::Failed
        };
        Self {
            all_ok: outcome == VerificationOutcome::Verified,
            outcome,
            results,
        }
    }
}

/// Result of walking the whole stored chain from genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAudit {
    pub valid: bool,
    pub records_checked: usize,
    /// Hash of the first record that failed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_bad_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
