//! Test execution engine.

use portshim_membrane::{SafetyLevel, global_healing_policy};

use crate::exec::execute_fixture_case;
use crate::fixtures::FixtureSet;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::verify::VerificationResult;
use crate::{FixtureCase, HarnessError, diff};

/// Runs a fixture set and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Mode being tested.
    pub mode: SafetyLevel,
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub fn new(campaign: impl Into<String>, mode: SafetyLevel) -> Self {
        Self {
            campaign: campaign.into(),
            mode,
        }
    }

    /// Run all cases in a set that apply to this runner's mode.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .filter(|case| mode_matches(self.mode, &case.mode))
            .map(|case| self.run_case(case))
            .collect()
    }

    /// Like [`TestRunner::run`], emitting one log line per case.
    pub fn run_logged(
        &self,
        fixture_set: &FixtureSet,
        log: &mut LogEmitter,
    ) -> std::io::Result<Vec<VerificationResult>> {
        let results = self.run(fixture_set);
        for result in &results {
            log.emit(self.case_log_entry(&fixture_set.family, result))?;
        }
        Ok(results)
    }

    fn case_log_entry(&self, family: &str, result: &VerificationResult) -> LogEntry {
        let (level, outcome) = if result.passed {
            (LogLevel::Info, Outcome::Pass)
        } else {
            (LogLevel::Error, Outcome::Fail)
        };
        LogEntry::new(level, "fixture_case")
            .with_mode(self.mode)
            .with_case(family, result.function.clone(), result.case_name.clone())
            .with_outcome(outcome, result.actual_errno)
            .with_heals(result.heals.clone())
            .with_details(serde_json::json!({
                "campaign": self.campaign,
                "expected": result.expected,
                "actual": result.actual,
                "heal_counters": heal_counters(),
            }))
    }

    fn run_case(&self, case: &FixtureCase) -> VerificationResult {
        let (actual, actual_errno, heals) =
            match execute_fixture_case(&case.function, &case.inputs, self.mode) {
                Ok(run) => (
                    run.output,
                    run.errno,
                    run.heals.into_iter().map(String::from).collect(),
                ),
                Err(err) => (format!("unsupported:{err}"), 0, Vec::new()),
            };

        let output_ok = actual == case.expected_output;
        let errno_ok = actual_errno == case.expected_errno;
        let diff = if !output_ok {
            Some(diff::render_diff(&case.expected_output, &actual))
        } else if !errno_ok {
            Some(format!(
                "errno mismatch: expected={}, actual={actual_errno}",
                case.expected_errno
            ))
        } else {
            None
        };

        VerificationResult {
            case_name: case.name.clone(),
            function: case.function.clone(),
            spec_section: case.spec_section.clone(),
            mode: self.mode.as_str().to_string(),
            passed: output_ok && errno_ok,
            expected: case.expected_output.clone(),
            actual,
            expected_errno: case.expected_errno,
            actual_errno,
            heals,
            diff,
        }
    }
}

fn mode_matches(active: SafetyLevel, case_mode: &str) -> bool {
    let case = case_mode.to_ascii_lowercase();
    case == active.as_str() || case == "both"
}

/// Modes selected by a `--mode` argument.
pub fn parse_modes(mode: &str) -> Result<Vec<SafetyLevel>, HarnessError> {
    match mode.to_ascii_lowercase().as_str() {
        "strict" => Ok(vec![SafetyLevel::Strict]),
        "hardened" => Ok(vec![SafetyLevel::Hardened]),
        "both" => Ok(vec![SafetyLevel::Strict, SafetyLevel::Hardened]),
        _ => Err(HarnessError::UnsupportedMode(mode.to_string())),
    }
}

fn heal_counters() -> serde_json::Value {
    global_healing_policy()
        .counters()
        .into_iter()
        .map(|(name, n)| (name.to_string(), serde_json::Value::from(n)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> FixtureSet {
        FixtureSet::from_json(
            r###"{
                "version":"v1",
                "family":"string",
                "captured_at":"2026-03-01T00:00:00Z",
                "cases":[
                    {"name":"copy","function":"strlcpy","spec_section":"strlcpy(3)","inputs":{"src":"abc","size":8},"expected_output":"ret=3 dst=\"abc\"","expected_errno":0,"mode":"both"},
                    {"name":"strict_null","function":"strlcpy","spec_section":"strlcpy(3)","inputs":{"src":null,"size":2},"expected_output":"ret=0 dst=\"##\"","expected_errno":14,"mode":"strict"},
                    {"name":"hard_null","function":"strlcpy","spec_section":"strlcpy(3)","inputs":{"src":null,"size":2},"expected_output":"ret=0 dst=\"\"","expected_errno":0,"mode":"hardened"}
                ]
            }"###,
        )
        .expect("valid fixture json")
    }

    #[test]
    fn strict_runner_executes_matching_cases() {
        let strict = TestRunner::new("smoke", SafetyLevel::Strict).run(&fixture());
        assert_eq!(strict.len(), 2);
        assert!(strict.iter().all(|r| r.passed), "{strict:?}");
    }

    #[test]
    fn hardened_runner_executes_matching_cases() {
        let hardened = TestRunner::new("smoke", SafetyLevel::Hardened).run(&fixture());
        assert_eq!(hardened.len(), 2);
        assert!(hardened.iter().all(|r| r.passed), "{hardened:?}");
        assert_eq!(hardened[1].heals, vec!["return_safe_default"]);
    }

    #[test]
    fn errno_mismatch_fails_case() {
        let mut set = fixture();
        set.cases[1].expected_errno = 0;
        let strict = TestRunner::new("errno", SafetyLevel::Strict).run(&set);
        assert!(!strict[1].passed);
        assert!(strict[1].diff.as_deref().unwrap().contains("errno mismatch"));
    }

    #[test]
    fn unsupported_function_is_reported_as_output() {
        let mut set = fixture();
        set.cases[0].function = String::from("memcpy");
        let strict = TestRunner::new("bad", SafetyLevel::Strict).run(&set);
        assert!(!strict[0].passed);
        assert!(strict[0].actual.starts_with("unsupported:"));
    }

    #[test]
    fn logged_run_emits_one_line_per_case() {
        let mut log = LogEmitter::to_buffer("portshim", "t1");
        let results = TestRunner::new("log", SafetyLevel::Hardened)
            .run_logged(&fixture(), &mut log)
            .unwrap();
        assert_eq!(log.lines_written(), results.len() as u64);
    }

    #[test]
    fn mode_arguments() {
        assert_eq!(parse_modes("BOTH").unwrap().len(), 2);
        assert_eq!(parse_modes("hardened").unwrap(), vec![SafetyLevel::Hardened]);
        assert!(parse_modes("off").is_err());
    }
}
