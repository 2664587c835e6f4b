//! TOML-driven policy engine implementation.
//!
//! `TomlPolicyEngine` loads a `PolicyConfig` from a TOML string or file,
//! compiles every component from it, and implements the `PolicyEngine`
//! trait from oracle-core.

use std::path::Path;

use tracing::debug;

use oracle_contracts::{
    calibration::{CalibrationRules, KnowledgeDoc},
    error::{OracleError, OracleResult},
    scoring::{ComposedAnswer, Resonance, ScoreOutcome, ShortcutVerdict},
};
use oracle_core::traits::PolicyEngine;

use crate::{
    compose::Composer, intent::IntentResonator, rule::PolicyConfig, scorer::HeuristicScorer,
    shortcut::EthicsShortcut,
};

/// The policy shipped with the crate.
pub const DEFAULT_POLICY: &str = include_str!("../policies/default.toml");

/// A `PolicyEngine` implementation that reads its tables from a TOML document.
///
/// ```rust,ignore
/// use oracle_policy::engine::TomlPolicyEngine;
///
/// let engine = TomlPolicyEngine::from_file(Path::new("policies/strict.toml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct TomlPolicyEngine {
    config: PolicyConfig,
    scorer: HeuristicScorer,
    shortcut: EthicsShortcut,
    composer: Composer,
    resonator: IntentResonator,
}

impl TomlPolicyEngine {
    /// Parse `s` as TOML and build a `TomlPolicyEngine`.
    ///
    /// Returns `OracleError::ConfigError` if the TOML is malformed, does not
    /// match `PolicyConfig`, or contains an invalid regex or threshold.
    pub fn from_toml_str(s: &str) -> OracleResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| OracleError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    pub fn from_file(path: &Path) -> OracleResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| OracleError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The engine built from the bundled default policy.
    pub fn with_defaults() -> OracleResult<Self> {
        Self::from_toml_str(DEFAULT_POLICY)
    }

    pub fn from_config(config: PolicyConfig) -> OracleResult<Self> {
        let scorer = HeuristicScorer::new(&config)?;
        let shortcut = EthicsShortcut::new(&config.shortcut)?;
        let composer = Composer::new(&config.composer, &config.factual, &config.humanizing);
        let resonator = IntentResonator::new(&config.intent);

        debug!(
            keywords = config.keywords.len(),
            shortcut_families = config.shortcut.families.len(),
            knowledge_docs = config.knowledge.len(),
            "policy loaded"
        );

        Ok(Self {
            config,
            scorer,
            shortcut,
            composer,
            resonator,
        })
    }

    pub fn scorer(&self) -> &HeuristicScorer {
        &self.scorer
    }

    pub fn ethics_shortcut(&self) -> &EthicsShortcut {
        &self.shortcut
    }

    /// Rule lists for the answer calibrator.
    pub fn calibration_rules(&self) -> &CalibrationRules {
        &self.config.calibration
    }

    /// Knowledge-base documents for evidence retrieval.
    pub fn knowledge(&self) -> &[KnowledgeDoc] {
        &self.config.knowledge
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl PolicyEngine for TomlPolicyEngine {
    fn shortcut(&self, question: &str) -> Option<ShortcutVerdict> {
        self.shortcut.check(question)
    }

    fn score(&self, question: &str) -> ScoreOutcome {
        self.scorer.score(question)
    }

    fn compose(&self, question: &str, score: &ScoreOutcome) -> ComposedAnswer {
        self.composer.compose(question, score)
    }

    fn wants_humanizing(&self, question: &str) -> bool {
        self.composer.wants_humanizing(question)
    }

    fn resonate(&self, question: &str, determinacy: f64, ethical_weight: f64) -> Resonance {
        self.resonator.resonate(question, determinacy, ethical_weight)
    }
}
