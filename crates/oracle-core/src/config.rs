//! Runtime configuration for the oracle pipeline.
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! generator_timeout_ms = 20000
//! durability = "best-effort"
//! belief_cap = 1000
//! calibrate = false
//!
//! [reflection]
//! mode = "default"
//! determinacy_scale = 1.0
//! deception_scale = 1.0
//! ethical_reflection_weight = 0.5
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use oracle_contracts::error::{OracleError, OracleResult};

/// How the ledger treats a storage failure during append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Durability {
    /// Log the failure and return the computed record anyway. The chain head
    /// does not advance past an unpersisted record.
    #[default]
    BestEffort,
    /// Fail the append, and with it the exchange.
    Strict,
}

/// Sensitivity scaling and reflective decoration applied after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Label echoed in every response.
    pub mode: String,
    /// Multiplier applied to determinacy on the scored path.
    pub determinacy_scale: f64,
    /// Multiplier applied to deception probability on the scored path.
    pub deception_scale: f64,
    /// Reflective prefixes and footnotes are added only above 0.6.
    pub ethical_reflection_weight: f64,
    pub keywords: Vec<String>,
    pub prefixes: Vec<String>,
    pub footnotes: Vec<String>,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            mode: "default".to_string(),
            determinacy_scale: 1.0,
            deception_scale: 1.0,
            ethical_reflection_weight: 0.5,
            keywords: strings(&[
                "freedom",
                "truth",
                "justice",
                "meaning",
                "purpose",
                "consciousness",
                "free will",
                "existence",
                "reality",
                "道德",
                "真理",
                "自由",
                "意义",
                "存在",
                "意识",
            ]),
            prefixes: strings(&[
                "From a philosophical perspective, ",
                "In the dimension of existence, ",
                "Upon deep reflection, I believe ",
                "On the moral scale, ",
                "Considering the nature of reality, ",
            ]),
            footnotes: strings(&[
                "\n\nTruth is multifaceted; this is but one perspective.",
                "\n\nWisdom grows in the soil of uncertainty.",
                "\n\nReality reveals itself through questioning.",
                "\n\nIn humility lies the beginning of understanding.",
            ]),
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Upper bound on a single generator call.
    pub generator_timeout_ms: u64,
    pub durability: Durability,
    /// Maximum retained philosophical beliefs; the oldest are dropped first.
    pub belief_cap: usize,
    /// How many recent beliefs a new exchange is checked against.
    pub contradiction_window: usize,
    /// Run the answer calibrator when a generator is configured.
    pub calibrate: bool,
    /// Ethical weight every exchange starts from before resonance.
    pub base_ethical_weight: f64,
    pub reflection: ReflectionConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            generator_timeout_ms: 20_000,
            durability: Durability::BestEffort,
            belief_cap: 1000,
            contradiction_window: 100,
            calibrate: false,
            base_ethical_weight: 0.7,
            reflection: ReflectionConfig::default(),
        }
    }
}

impl OracleConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `OracleError::ConfigError` if the document is malformed or a
    /// value is out of range.
    pub fn from_toml_str(s: &str) -> OracleResult<Self> {
        let config: OracleConfig = toml::from_str(s).map_err(|e| OracleError::ConfigError {
            reason: format!("failed to parse oracle config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> OracleResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| OracleError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_millis(self.generator_timeout_ms)
    }

    fn validate(&self) -> OracleResult<()> {
        if self.generator_timeout_ms == 0 {
            return Err(OracleError::ConfigError {
                reason: "generator_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.belief_cap == 0 {
            return Err(OracleError::ConfigError {
                reason: "belief_cap must be greater than zero".to_string(),
            });
        }
        let r = &self.reflection;
        if r.determinacy_scale < 0.0 || r.deception_scale < 0.0 {
            return Err(OracleError::ConfigError {
                reason: "reflection scales must not be negative".to_string(),
            });
        }
        Ok(())
    }
}
