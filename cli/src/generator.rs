//! An `AnswerGenerator` backed by an external program.
//!
//! The prompt is written to the program's stdin and the sampling
//! temperature is passed in the `ORACLE_TEMPERATURE` environment variable.
//! Whatever the program prints on stdout is the generated text. A non-zero
//! exit status is a `GeneratorFailed` error.
//!
//! The child is always reaped. If sending the prompt fails, or the program
//! outlives its time limit, it is killed first.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use oracle_contracts::error::{OracleError, OracleResult};
use oracle_core::traits::AnswerGenerator;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    time_limit: Option<Duration>,
}

impl CommandGenerator {
    /// Parse a whitespace-separated command line such as `"llm --model small"`.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            time_limit: None,
        })
    }

    /// Kill the program if it has not exited within `limit`.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    fn failed(&self, what: &str, e: std::io::Error) -> OracleError {
        OracleError::GeneratorFailed {
            reason: format!("{} '{}': {}", what, self.program, e),
        }
    }

    /// Wait for the child, killing it once the time limit passes.
    fn wait(&self, child: &mut Child) -> OracleResult<ExitStatus> {
        let Some(limit) = self.time_limit else {
            return child.wait().map_err(|e| self.failed("failed to wait for", e));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= limit => {
                    reap(child);
                    let after_ms = limit.as_millis() as u64;
                    warn!(program = %self.program, after_ms, "generator killed after time limit");
                    return Err(OracleError::GeneratorTimeout { after_ms });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    reap(child);
                    return Err(self.failed("failed to wait for", e));
                }
            }
        }
    }
}

/// Kill and wait, ignoring errors from a child that already exited.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        bytes
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl AnswerGenerator for CommandGenerator {
    fn generate(&self, prompt: &str, temperature: f64) -> OracleResult<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("ORACLE_TEMPERATURE", format!("{:.2}", temperature))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failed("failed to start", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                reap(&mut child);
                return Err(self.failed("failed to send prompt to", e));
            }
        }

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let status = self.wait(&mut child)?;
        let stdout = collect(stdout);

        if !status.success() {
            let stderr = collect(stderr);
            return Err(OracleError::GeneratorFailed {
                reason: format!(
                    "'{}' exited with {}: {}",
                    self.program,
                    status,
                    String::from_utf8_lossy(&stderr).trim()
                ),
            });
        }

        let text = String::from_utf8_lossy(&stdout).to_string();
        debug!(program = %self.program, temperature, chars = text.len(), "generator responded");
        Ok(text)
    }
}
