//! Identity, lifecycle, and response types for a single question/answer
//! exchange.

use serde::{Deserialize, Serialize};

use crate::{
    belief::Contradiction,
    calibration::CalibrationReport,
    record::AuditRecord,
};

/// Unique identifier for one exchange, carried in logs and the response.
///
/// Not part of the hashed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle stages of an exchange, in the order they are reached.
///
/// `Scored`, `Calibrated` and `Reflected` are skipped when the ethics
/// shortcut matches; `Persisted` is skipped when a best-effort write fails.
/// Every successful exchange ends in `Responded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStage {
    Received,
    ShortcutChecked,
    Scored,
    Calibrated,
    Reflected,
    Hashed,
    Persisted,
    Responded,
}

/// What the pipeline returns for one answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub request_id: RequestId,
    /// The hashed record, identical to what the ledger stored (or attempted
    /// to store).
    pub record: AuditRecord,
    /// False when a best-effort write failed.
    pub persisted: bool,
    pub ethical_weight: f64,
    pub explanation: String,
    pub reason_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consistency_warnings: Vec<Contradiction>,
    pub reflection_mode: String,
    pub stages: Vec<ExchangeStage>,
}
