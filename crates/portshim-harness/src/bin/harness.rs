//! CLI entrypoint for the portshim conformance harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use portshim_harness::fixtures::fixture_paths;
use portshim_harness::report::FixtureDigest;
use portshim_harness::runner::parse_modes;
use portshim_harness::structured_log::{LogEmitter, now_utc, validate_log_file};
use portshim_harness::verify::VerificationSummary;
use portshim_harness::{ConformanceReport, FixtureSet, TestRunner};
use portshim_membrane::{SafetyLevel, global_healing_policy};

/// Conformance tooling for portshim.
#[derive(Debug, Parser)]
#[command(name = "portshim-harness")]
#[command(about = "Conformance testing harness for portshim")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the implementation against fixture files.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
        /// Mode to run (`strict`, `hardened`, or `both`).
        #[arg(long, default_value = "both")]
        mode: String,
        /// Output report path (markdown; JSON is written alongside).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// Log file to check.
        #[arg(long)]
        log: PathBuf,
    },
    /// Run the hardened fixture cases and print the healing ledger.
    HealStats {
        /// Directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
    },
}

type Loaded = (Vec<FixtureSet>, Vec<FixtureDigest>);

fn load_fixtures(dir: &Path) -> Result<Loaded, Box<dyn std::error::Error>> {
    let mut sets = Vec::new();
    let mut digests = Vec::new();
    for path in fixture_paths(dir)? {
        sets.push(FixtureSet::from_file(&path)?);
        digests.push(FixtureDigest::of_file(&path)?);
    }
    Ok((sets, digests))
}

fn run_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{secs}-{}", std::process::id())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            mode,
            report,
            log,
        } => {
            let modes = parse_modes(&mode)?;
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let (sets, digests) = load_fixtures(&fixture)?;

            let mut emitter = match &log {
                Some(path) => Some(LogEmitter::to_file(path, "portshim", &run_id())?),
                None => None,
            };

            let mut results = Vec::new();
            for level in &modes {
                let runner = TestRunner::new("fixture-verify", *level);
                for set in &sets {
                    match emitter.as_mut() {
                        Some(emitter) => results.extend(runner.run_logged(set, emitter)?),
                        None => results.extend(runner.run(set)),
                    }
                }
            }
            if let Some(emitter) = emitter.as_mut() {
                emitter.flush()?;
            }

            let report_doc = ConformanceReport {
                title: String::from("portshim Conformance Report"),
                mode: modes
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join("+"),
                timestamp: now_utc(),
                fixtures: digests,
                summary: VerificationSummary::from_results(results),
            };

            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
            );

            if let Some(report_path) = report {
                eprintln!("Writing report to {}", report_path.display());
                std::fs::write(&report_path, report_doc.to_markdown())?;
                std::fs::write(report_path.with_extension("json"), report_doc.to_json())?;
            }

            if !report_doc.summary.all_passed() {
                for r in report_doc.summary.failures() {
                    eprintln!("FAIL [{}] {}: {:?}", r.mode, r.case_name, r.diff);
                }
                return Err("Conformance verification failed".into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!(
                "Validated {}: lines={lines}, errors={}",
                log.display(),
                errors.len()
            );
            if !errors.is_empty() {
                return Err("Structured log validation failed".into());
            }
        }
        Command::HealStats { fixture } => {
            let (sets, _) = load_fixtures(&fixture)?;
            let runner = TestRunner::new("heal-stats", SafetyLevel::Hardened);
            for set in &sets {
                runner.run(set);
            }

            let policy = global_healing_policy();
            let counters: serde_json::Map<String, serde_json::Value> = policy
                .counters()
                .into_iter()
                .map(|(name, n)| (name.to_string(), n.into()))
                .collect();
            let recent: Vec<serde_json::Value> = policy
                .recent_events()
                .into_iter()
                .map(|e| serde_json::json!({"symbol": e.symbol, "action": e.action.name()}))
                .collect();
            let out = serde_json::json!({"counters": counters, "recent": recent});
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}
