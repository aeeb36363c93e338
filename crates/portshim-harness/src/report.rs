//! Report generation for conformance results.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::HarnessError;
use crate::verify::VerificationSummary;

/// SHA-256 of a fixture file the report was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDigest {
    /// Path as given on the command line.
    pub path: String,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

impl FixtureDigest {
    /// Hash the file at `path`.
    pub fn of_file(path: &Path) -> Result<Self, HarnessError> {
        let data = std::fs::read(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self {
            path: path.display().to_string(),
            sha256: sha256_hex(&data),
        })
    }
}

fn sha256_hex(data: &[u8]) -> String {
    use sha2::Digest;
    use std::fmt::Write;
    let digest = sha2::Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// A conformance report: verification results plus the fixtures they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Report title.
    pub title: String,
    /// Runtime mode(s) tested, e.g. `strict+hardened`.
    pub mode: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    /// Fixture files consumed.
    pub fixtures: Vec<FixtureDigest>,
    /// Verification summary.
    pub summary: VerificationSummary,
}

impl ConformanceReport {
    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Mode: {}\n", self.mode));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!("- Failed: {}\n\n", self.summary.failed));

        if !self.fixtures.is_empty() {
            out.push_str("## Fixtures\n\n");
            for f in &self.fixtures {
                out.push_str(&format!("- `{}` sha256 `{}`\n", f.path, f.sha256));
            }
            out.push('\n');
        }

        out.push_str("| Function | Passed | Failed | Healed |\n");
        out.push_str("|----------|--------|--------|--------|\n");
        for (function, tally) in &self.summary.by_function {
            out.push_str(&format!(
                "| {function} | {} | {} | {} |\n",
                tally.passed, tally.failed, tally.healed
            ));
        }

        out.push_str("\n| Case | Function | Mode | Reference | Status |\n");
        out.push_str("|------|----------|------|-----------|--------|\n");
        for r in &self.summary.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                r.case_name, r.function, r.mode, r.spec_section, status
            ));
        }

        let mut failures = self.summary.failures().peekable();
        if failures.peek().is_some() {
            out.push_str("\n## Failures\n");
            for r in failures {
                out.push_str(&format!("\n### {} ({})\n\n```\n", r.case_name, r.mode));
                out.push_str(r.diff.as_deref().unwrap_or("(no diff)"));
                out.push_str("\n```\n");
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
