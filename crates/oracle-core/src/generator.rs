//! Bounded-time wrapper around an `AnswerGenerator`.
//!
//! Each call runs on a short-lived worker thread; the caller waits at most
//! `timeout` for the result. A call that overruns is abandoned: its thread
//! finishes in the background and its result is dropped.

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use oracle_contracts::error::{OracleError, OracleResult};

use crate::traits::AnswerGenerator;

/// Enforces a deadline and rejects empty responses.
pub struct TimeoutGenerator {
    inner: Arc<dyn AnswerGenerator>,
    timeout: Duration,
}

impl TimeoutGenerator {
    pub fn new(inner: Arc<dyn AnswerGenerator>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl AnswerGenerator for TimeoutGenerator {
    fn generate(&self, prompt: &str, temperature: f64) -> OracleResult<String> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_prompt = prompt.to_string();

        thread::Builder::new()
            .name("oracle-generator".to_string())
            .spawn(move || {
                // The receiver may already be gone after a timeout.
                let _ = tx.send(inner.generate(&owned_prompt, temperature));
            })
            .map_err(|e| OracleError::GeneratorFailed {
                reason: format!("could not spawn generator thread: {}", e),
            })?;

        let after_ms = self.timeout.as_millis() as u64;
        let text = match rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(after_ms, temperature, "generator call abandoned after timeout");
                return Err(OracleError::GeneratorTimeout { after_ms });
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(OracleError::GeneratorFailed {
                    reason: "generator thread exited without a response".to_string(),
                });
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(OracleError::GeneratorFailed {
                reason: "generator returned an empty response".to_string(),
            });
        }

        debug!(temperature, chars = text.len(), "generator call completed");
        Ok(text)
    }
}
