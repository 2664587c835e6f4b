//! Oracle command-line front end.
//!
//! Answers questions into a JSON-lines ledger and inspects or verifies the
//! resulting hash chain.
//!
//! Usage:
//!   oracle ask "What is 2+2?"
//!   oracle chain --limit 5
//!   oracle show <hash>
//!   oracle lookup <hash>
//!   oracle verify claims.json
//!   oracle audit

mod generator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oracle_audit::{
    InMemoryBeliefStore, JsonlBeliefStore, JsonlLedgerStore, Ledger, OfflineLedgerStore,
};
use oracle_contracts::error::{OracleError, OracleResult};
use oracle_core::{
    traits::{BeliefStore, LedgerStore},
    Durability, Oracle, OracleConfig,
};
use oracle_policy::TomlPolicyEngine;
use oracle_verify::{Calibrator, ChainVerifier};

use crate::generator::CommandGenerator;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Hash-chained question answering.
///
/// Every answered question is scored, answered, and appended to an
/// append-only SHA-256 chain that clients can verify later.
#[derive(Parser)]
#[command(name = "oracle", about = "Audited question answering over a hash-chained ledger")]
struct Cli {
    /// Runtime configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scoring policy (TOML). The built-in policy applies when omitted.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Ledger file, one JSON record per line.
    #[arg(long, global = true, default_value = "oracle-ledger.jsonl")]
    ledger: PathBuf,

    /// Belief history used to flag contradictions between answers.
    #[arg(long, global = true, default_value = "oracle-beliefs.jsonl")]
    beliefs: PathBuf,

    /// External generator command; receives the prompt on stdin.
    #[arg(long, global = true)]
    generator: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a question and append it to the ledger.
    Ask {
        /// The question; multiple words are joined with spaces.
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// List the most recent records, newest first.
    Chain {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print one full record.
    Show { hash: String },
    /// Print a record's chain metadata without its content.
    Lookup { hash: String },
    /// Check a JSON list of {hash, prev_hash} claims against the ledger.
    Verify { claims: PathBuf },
    /// Re-hash the whole ledger and walk its links from genesis.
    Audit,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("oracle error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run one subcommand. `Ok(false)` means it completed but found a problem
/// worth a non-zero exit (missing record, failed verification).
fn run(cli: &Cli) -> OracleResult<bool> {
    let config = match &cli.config {
        Some(path) => OracleConfig::from_file(path)?,
        None => OracleConfig::default(),
    };
    let open = || -> OracleResult<Arc<dyn LedgerStore>> {
        Ok(Arc::new(JsonlLedgerStore::open(&cli.ledger)?))
    };

    match &cli.command {
        Command::Ask { question } => {
            let store = open_for_append(&cli.ledger, config.durability)?;
            ask(cli, config, store, &question.join(" "))
        }
        Command::Chain { limit } => chain(open()?, config, *limit),
        Command::Show { hash } => show(open()?, config, hash),
        Command::Lookup { hash } => lookup(open()?, config, hash),
        Command::Verify { claims } => verify(open()?, claims),
        Command::Audit => audit(open()?, config),
    }
}

/// Open the ledger for answering. Under `BestEffort` an unreadable ledger
/// does not stop the answer; records come back with `persisted = false`.
fn open_for_append(path: &Path, durability: Durability) -> OracleResult<Arc<dyn LedgerStore>> {
    match JsonlLedgerStore::open(path) {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) if durability == Durability::BestEffort => {
            warn!(ledger = %path.display(), error = %e, "ledger unavailable; answers will not be stored");
            Ok(Arc::new(OfflineLedgerStore::new(e.to_string())))
        }
        Err(e) => Err(e),
    }
}

fn open_beliefs(path: &Path, config: &OracleConfig) -> Box<dyn BeliefStore> {
    match JsonlBeliefStore::open(path, config.belief_cap, config.contradiction_window) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(beliefs = %path.display(), error = %e, "belief history unavailable; starting empty");
            Box::new(InMemoryBeliefStore::new(config.belief_cap, config.contradiction_window))
        }
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn ask(
    cli: &Cli,
    config: OracleConfig,
    store: Arc<dyn LedgerStore>,
    question: &str,
) -> OracleResult<bool> {
    let policy = match &cli.policy {
        Some(path) => TomlPolicyEngine::from_file(path)?,
        None => TomlPolicyEngine::with_defaults()?,
    };
    let calibrator = Calibrator::new(policy.calibration_rules(), policy.knowledge())?;
    let beliefs = open_beliefs(&cli.beliefs, &config);
    let time_limit = config.generator_timeout();
    let ledger = Arc::new(Ledger::new(store, config.durability));

    let mut oracle = Oracle::new(Box::new(policy), ledger, config)
        .with_calibrator(Box::new(calibrator))
        .with_beliefs(beliefs);

    if let Some(command_line) = &cli.generator {
        let generator = CommandGenerator::parse(command_line).ok_or(OracleError::ConfigError {
            reason: "--generator must name a program".to_string(),
        })?;
        oracle = oracle.with_generator(Arc::new(generator.with_time_limit(time_limit)));
    }

    let response = oracle.ask(question)?;
    info!(hash = %response.record.hash, persisted = response.persisted, "question answered");
    print_json(&response)?;
    Ok(true)
}

fn chain(store: Arc<dyn LedgerStore>, config: OracleConfig, limit: usize) -> OracleResult<bool> {
    let ledger = Ledger::new(store, config.durability);
    let records = ledger.list(limit)?;
    if records.is_empty() {
        println!("ledger is empty");
    }
    for record in records {
        println!(
            "{}  prev={}  {:<18}  {}",
            record.hash,
            short(&record.prev_hash),
            record.kind.as_str(),
            record.question
        );
    }
    Ok(true)
}

fn show(store: Arc<dyn LedgerStore>, config: OracleConfig, hash: &str) -> OracleResult<bool> {
    match Ledger::new(store, config.durability).get_by_hash(hash)? {
        Some(record) => {
            print_json(&record)?;
            Ok(true)
        }
        None => {
            eprintln!("no record with hash {}", hash);
            Ok(false)
        }
    }
}

fn lookup(store: Arc<dyn LedgerStore>, config: OracleConfig, hash: &str) -> OracleResult<bool> {
    match Ledger::new(store, config.durability).lookup(hash)? {
        Some(summary) => {
            print_json(&summary)?;
            Ok(true)
        }
        None => {
            eprintln!("no record with hash {}", hash);
            Ok(false)
        }
    }
}

fn verify(store: Arc<dyn LedgerStore>, claims: &Path) -> OracleResult<bool> {
    let text = std::fs::read_to_string(claims).map_err(|e| OracleError::ConfigError {
        reason: format!("failed to read claims '{}': {}", claims.display(), e),
    })?;
    let body: Value = serde_json::from_str(&text).map_err(|e| OracleError::Serialization {
        reason: format!("claims '{}' are not valid JSON: {}", claims.display(), e),
    })?;

    let report = ChainVerifier::new(store)?.verify_json(&body)?;
    println!("status: {}", report.outcome.status_code());
    print_json(&report)?;
    Ok(report.all_ok)
}

fn audit(store: Arc<dyn LedgerStore>, config: OracleConfig) -> OracleResult<bool> {
    let audit = Ledger::new(store, config.durability).audit()?;
    print_json(&audit)?;
    Ok(audit.valid)
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> OracleResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| OracleError::Serialization {
        reason: format!("failed to render output: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

/// First 12 characters of a hash, or `-` for genesis.
fn short(hash: &str) -> &str {
    if hash.is_empty() {
        return "-";
    }
    match hash.char_indices().nth(12) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use oracle_core::Durability;

    use super::{open_for_append, short};

    #[test]
    fn test_short_truncates_on_char_boundaries() {
        assert_eq!(short(""), "-");
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("ééééééééééééé"), "éééééééééééé");
    }

    #[test]
    fn test_unreadable_ledger_falls_back_when_best_effort() {
        let dir = std::env::temp_dir().join(format!("oracle-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("torn.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"{\"question\":\"x\",\"answ").unwrap();

        let store = open_for_append(&path, Durability::BestEffort).unwrap();
        assert!(store.latest_hash().is_err(), "fallback store never reports a head");
        assert!(open_for_append(&path, Durability::Strict).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
