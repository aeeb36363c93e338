//! Per-case verdicts and their rollup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Verdict for one fixture case in one mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub case_name: String,
    pub function: String,
    /// Man page or standard reference from the fixture.
    pub spec_section: String,
    /// `strict` or `hardened`.
    pub mode: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    pub expected_errno: i32,
    pub actual_errno: i32,
    /// Healing actions applied while running the case.
    #[serde(default)]
    pub heals: Vec<String>,
    /// Output diff or errno mismatch, for failed cases.
    pub diff: Option<String>,
}

/// Pass/fail counts for one function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTally {
    pub passed: usize,
    pub failed: usize,
    /// Cases that needed at least one repair.
    pub healed: usize,
}

/// Rollup of a verify run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Counts keyed by function name.
    pub by_function: BTreeMap<String, FunctionTally>,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let mut by_function: BTreeMap<String, FunctionTally> = BTreeMap::new();
        for r in &results {
            let tally = by_function.entry(r.function.clone()).or_default();
            if r.passed {
                tally.passed += 1;
            } else {
                tally.failed += 1;
            }
            if !r.heals.is_empty() {
                tally.healed += 1;
            }
        }
        let passed = by_function.values().map(|t| t.passed).sum();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            by_function,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failed results, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(function: &str, passed: bool, heals: &[&str]) -> VerificationResult {
        VerificationResult {
            case_name: format!("{function}_{passed}"),
            function: function.to_string(),
            spec_section: String::new(),
            mode: String::from("hardened"),
            passed,
            expected: String::new(),
            actual: String::new(),
            expected_errno: 0,
            actual_errno: 0,
            heals: heals.iter().map(|h| h.to_string()).collect(),
            diff: None,
        }
    }

    #[test]
    fn tallies_per_function() {
        let summary = VerificationSummary::from_results(vec![
            result("strlcpy", true, &["clamp_size"]),
            result("strlcpy", false, &[]),
            result("getaddrinfo", true, &["default_port", "loopback_host"]),
        ]);
        assert_eq!((summary.total, summary.passed, summary.failed), (3, 2, 1));
        assert!(!summary.all_passed());
        assert_eq!(
            summary.by_function["strlcpy"],
            FunctionTally {
                passed: 1,
                failed: 1,
                healed: 1
            }
        );
        assert_eq!(summary.by_function["getaddrinfo"].healed, 1);
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn empty_run_passes() {
        let summary = VerificationSummary::from_results(Vec::new());
        assert!(summary.all_passed());
        assert!(summary.by_function.is_empty());
    }
}
