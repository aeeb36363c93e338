//! JSONL run logs.
//!
//! A verify run writes one [`LogEntry`] per executed fixture case. Every line
//! carries a `trace_id` of the form `<source>::<run_id>::<seq>` so lines from
//! interleaved runs can be told apart. [`validate_log_file`] checks a log
//! written by an earlier run.

use std::io::Write;
use std::path::Path;

use portshim_membrane::SafetyLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Verdict for one fixture case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

const REQUIRED: [&str; 4] = ["timestamp", "trace_id", "level", "event"];

/// One log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    /// Empty until an emitter assigns one.
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Fixture family (`string`, `resolv`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    /// Healing action names, in the order they were applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl LogEntry {
    /// Entry stamped with the current time and no trace id yet.
    #[must_use]
    pub fn new(level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: String::new(),
            level,
            event: event.into(),
            mode: None,
            family: None,
            function: None,
            case: None,
            outcome: None,
            errno: None,
            heals: Vec::new(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SafetyLevel) -> Self {
        self.mode = Some(mode.as_str().to_string());
        self
    }

    /// Identify the fixture case this line reports on.
    #[must_use]
    pub fn with_case(
        mut self,
        family: impl Into<String>,
        function: impl Into<String>,
        case: impl Into<String>,
    ) -> Self {
        self.family = Some(family.into());
        self.function = Some(function.into());
        self.case = Some(case.into());
        self
    }

    /// Record the verdict. An errno of 0 is left out.
    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome, errno: i32) -> Self {
        self.outcome = Some(outcome);
        self.errno = (errno != 0).then_some(errno);
        self
    }

    #[must_use]
    pub fn with_heals(mut self, heals: Vec<String>) -> Self {
        self.heals = heals;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Writes [`LogEntry`] lines, assigning trace ids in sequence.
pub struct LogEmitter {
    sink: Box<dyn Write>,
    prefix: String,
    emitted: u64,
}

impl LogEmitter {
    /// Emitter writing to a freshly created file at `path`.
    pub fn to_file(path: &Path, source: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::with_sink(
            Box::new(std::io::BufWriter::new(file)),
            source,
            run_id,
        ))
    }

    /// Emitter writing to memory; used by tests.
    #[must_use]
    pub fn to_buffer(source: &str, run_id: &str) -> Self {
        Self::with_sink(Box::new(Vec::new()), source, run_id)
    }

    fn with_sink(sink: Box<dyn Write>, source: &str, run_id: &str) -> Self {
        Self {
            sink,
            prefix: format!("{source}::{run_id}"),
            emitted: 0,
        }
    }

    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.emitted
    }

    /// Write `entry` as one line. Returns the trace id it was written under.
    pub fn emit(&mut self, mut entry: LogEntry) -> std::io::Result<String> {
        self.emitted += 1;
        if entry.trace_id.is_empty() {
            entry.trace_id = format!("{}::{:03}", self.prefix, self.emitted);
        }
        let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        writeln!(self.sink, "{line}")?;
        Ok(entry.trace_id)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.sink.flush()
    }
}

/// Problem found in one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} [{}]: {}", self.line_number, self.field, self.message)
    }
}

fn trace_id_is_well_formed(trace_id: &str) -> bool {
    let parts: Vec<&str> = trace_id.split("::").collect();
    parts.len() == 3
        && parts[..2].iter().all(|p| !p.is_empty())
        && parts[2].parse::<u64>().is_ok()
}

fn check_enum<T: serde::de::DeserializeOwned>(obj: &Map<String, Value>, field: &str) -> Option<String> {
    let value = obj.get(field)?;
    serde_json::from_value::<T>(value.clone())
        .err()
        .map(|_| format!("unknown {field} {value}"))
}

/// Check one line of a run log. Returns the parsed entry, or every problem
/// found on the line.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let problem = |field: &str, message: String| LogValidationError {
        line_number,
        field: field.to_string(),
        message,
    };

    let value: Value = serde_json::from_str(line)
        .map_err(|e| vec![problem("<json>", format!("not JSON: {e}"))])?;
    let Some(obj) = value.as_object() else {
        return Err(vec![problem("<root>", String::from("not a JSON object"))]);
    };

    let mut problems: Vec<LogValidationError> = REQUIRED
        .iter()
        .filter(|field| !obj.contains_key(**field))
        .map(|field| problem(*field, String::from("missing")))
        .collect();

    if let Some(msg) = check_enum::<LogLevel>(obj, "level") {
        problems.push(problem("level", msg));
    }
    if let Some(msg) = check_enum::<Outcome>(obj, "outcome") {
        problems.push(problem("outcome", msg));
    }
    if let Some(mode) = obj.get("mode").and_then(Value::as_str)
        && !matches!(mode, "strict" | "hardened")
    {
        problems.push(problem("mode", format!("unknown mode {mode:?}")));
    }
    if let Some(trace_id) = obj.get("trace_id").and_then(Value::as_str)
        && !trace_id_is_well_formed(trace_id)
    {
        problems.push(problem(
            "trace_id",
            format!("expected <source>::<run_id>::<seq>, got {trace_id:?}"),
        ));
    }

    if !problems.is_empty() {
        return Err(problems);
    }
    serde_json::from_value(value).map_err(|e| vec![problem("<entry>", e.to_string())])
}

/// Check every non-blank line of a run log. Returns the number of lines
/// checked and all problems found.
pub fn validate_log_file(path: &Path) -> std::io::Result<(usize, Vec<LogValidationError>)> {
    let content = std::fs::read_to_string(path)?;
    let mut checked = 0;
    let mut problems = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        checked += 1;
        if let Err(errs) = validate_log_line(line, idx + 1) {
            problems.extend(errs);
        }
    }
    Ok((checked, problems))
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn now_utc() -> String {
    let since_epoch = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(since_epoch.as_secs(), since_epoch.subsec_millis())
}

fn format_utc(secs: u64, millis: u32) -> String {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    // Days since epoch to proleptic Gregorian date.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_string(&LogEntry::new(LogLevel::Info, "fixture_case")).unwrap();
        assert!(json.contains("\"level\":\"info\""));
        assert!(!json.contains("heals"));
        assert!(!json.contains("errno"));
    }

    #[test]
    fn emitter_assigns_sequential_trace_ids() {
        let mut emitter = LogEmitter::to_buffer("portshim", "run");
        let first = emitter.emit(LogEntry::new(LogLevel::Info, "a")).unwrap();
        let second = emitter.emit(LogEntry::new(LogLevel::Info, "b")).unwrap();
        assert_eq!(first, "portshim::run::001");
        assert_eq!(second, "portshim::run::002");
        assert_eq!(emitter.lines_written(), 2);
    }

    #[test]
    fn case_entry_round_trips_through_validation() {
        let mut entry = LogEntry::new(LogLevel::Warn, "fixture_case")
            .with_mode(SafetyLevel::Hardened)
            .with_case("resolv", "getaddrinfo", "hardened_unknown_host")
            .with_outcome(Outcome::Pass, 0)
            .with_heals(vec![String::from("loopback_host")]);
        entry.trace_id = String::from("portshim::run::007");
        let line = serde_json::to_string(&entry).unwrap();
        assert_eq!(validate_log_line(&line, 1), Ok(entry));
    }

    #[test]
    fn every_problem_on_a_line_is_reported() {
        let errs = validate_log_line(
            r#"{"trace_id":"x::y::1","level":"loud","event":"e","mode":"off","outcome":"maybe"}"#,
            7,
        )
        .unwrap_err();
        let fields: Vec<&str> = errs.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["timestamp", "level", "outcome", "mode"]);
        assert!(errs.iter().all(|e| e.line_number == 7));
    }

    #[test]
    fn malformed_lines() {
        let errs = validate_log_line(
            r#"{"timestamp":"t","trace_id":"a::b::c","level":"info","event":"e"}"#,
            1,
        )
        .unwrap_err();
        assert_eq!(errs[0].field, "trace_id");
        assert_eq!(validate_log_line("[1]", 2).unwrap_err()[0].field, "<root>");
        assert_eq!(validate_log_line("{", 3).unwrap_err()[0].field, "<json>");
    }

    #[test]
    fn utc_formatting() {
        assert_eq!(format_utc(0, 0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_utc(951_782_400, 5), "2000-02-29T00:00:00.005Z");
        assert_eq!(format_utc(1_767_225_599, 999), "2025-12-31T23:59:59.999Z");
    }
}
