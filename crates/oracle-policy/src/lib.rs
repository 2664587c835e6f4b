//! # oracle-policy
//!
//! TOML-driven scoring policy for the oracle pipeline.
//!
//! ## Overview
//!
//! This crate provides [`TomlPolicyEngine`], which implements the
//! [`PolicyEngine`](oracle_core::traits::PolicyEngine) trait by composing:
//!
//! - [`EthicsShortcut`]: ordered refusal patterns checked before scoring
//! - [`HeuristicScorer`]: weighted keywords, phrase and fuzzy boosts,
//!   dampeners, thresholds
//! - [`Composer`]: factual and templated answers, humanizing decision
//! - [`IntentResonator`]: topic/valence inference and ethical resonance
//!
//! Every table lives in the policy TOML; a complete default ships with the
//! crate as [`DEFAULT_POLICY`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use oracle_policy::TomlPolicyEngine;
//!
//! let engine = TomlPolicyEngine::with_defaults()?;
//! let outcome = engine.scorer().score("What is 2+2?");
//! ```

pub mod compose;
pub mod engine;
pub mod intent;
pub mod rule;
pub mod scorer;
pub mod shortcut;
pub mod similarity;

pub use compose::Composer;
pub use engine::{TomlPolicyEngine, DEFAULT_POLICY};
pub use intent::IntentResonator;
pub use rule::{PolicyConfig, Thresholds};
pub use scorer::HeuristicScorer;
pub use shortcut::EthicsShortcut;

// ── Tests ─────────────────────────────────────────────────────────────────────
