//! Per-check results and the run-wide summary

use serde::Serialize;
use std::time::Duration;

use crate::cluster::ClusterSnapshot;
use crate::utils::ExecMode;

// ── 单个检查结果 ──────────────────────────────────────────────────────────────

/// How a single provider run ended.
///
/// `Problems` covers both "found cluster issues" and "broke while running";
/// providers only give us an exit code. `Unavailable` means it never started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Problems { exit_code: i32 },
    Signaled { signal: String },
    TimedOut { after_secs: u64 },
    Silent,
    Unavailable { reason: String },
}

impl CheckStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckStatus::Passed)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CheckStatus::Unavailable { .. })
    }

    pub fn label(&self) -> String {
        match self {
            CheckStatus::Passed => "ok".to_string(),
            CheckStatus::Problems { exit_code } => format!("exit {}", exit_code),
            CheckStatus::Signaled { signal } => format!("killed by {}", signal),
            CheckStatus::TimedOut { after_secs } => format!("timed out after {}s", after_secs),
            CheckStatus::Silent => "no output".to_string(),
            CheckStatus::Unavailable { reason } => format!("unavailable: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub description: String,
    pub status: CheckStatus,
    /// Combined stdout+stderr, already filtered unless verbose.
    #[serde(skip)]
    pub output: String,
    /// Lines the non-verbose filter dropped from `output`.
    #[serde(skip)]
    pub hidden_lines: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

// ── 汇总 ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub name: String,
    #[serde(flatten)]
    pub status: CheckStatus,
    pub duration_ms: u64,
}

/// Accumulated while the engine flushes outcomes, finished once the run ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: String,
    pub mode: ExecMode,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Subset of `failed` whose provider never ran.
    pub unavailable: usize,
    #[serde(rename = "total_duration_ms", serialize_with = "as_millis")]
    pub total_duration: Duration,
    pub checks: Vec<CheckSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterSnapshot>,
}

impl RunSummary {
    pub fn new(mode: ExecMode) -> Self {
        Self {
            started_at: timestamp(),
            mode,
            total: 0,
            succeeded: 0,
            failed: 0,
            unavailable: 0,
            total_duration: Duration::ZERO,
            checks: Vec::new(),
            cluster: None,
        }
    }

    pub fn record(&mut self, outcome: &CheckOutcome) {
        self.total += 1;
        if outcome.status.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            if outcome.status.is_unavailable() {
                self.unavailable += 1;
            }
        }
        self.checks.push(CheckSummary {
            name: outcome.name.clone(),
            status: outcome.status.clone(),
            duration_ms: outcome.duration.as_millis() as u64,
        });
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.total_duration = elapsed;
    }

    pub fn failed_names(&self) -> impl Iterator<Item = &CheckSummary> {
        self.checks.iter().filter(|c| !c.status.is_success())
    }
}

pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string()
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: CheckStatus) -> CheckOutcome {
        CheckOutcome {
            name: name.to_string(),
            description: String::new(),
            status,
            output: String::new(),
            hidden_lines: 0,
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn record_tallies_by_status() {
        let mut s = RunSummary::new(ExecMode::Sequential);
        s.record(&outcome("a", CheckStatus::Passed));
        s.record(&outcome("b", CheckStatus::Problems { exit_code: 1 }));
        s.record(&outcome("c", CheckStatus::Unavailable { reason: "missing".into() }));
        s.record(&outcome("d", CheckStatus::Silent));
        s.finish(Duration::from_secs(3));

        assert_eq!(s.total, 4);
        assert_eq!(s.succeeded, 1);
        assert_eq!(s.failed, 3);
        assert_eq!(s.unavailable, 1);
        let failed: Vec<&str> = s.failed_names().map(|c| c.name.as_str()).collect();
        assert_eq!(failed, vec!["b", "c", "d"]);
    }

    #[test]
    fn serializes_durations_as_millis() {
        let mut s = RunSummary::new(ExecMode::Parallel);
        s.record(&outcome("etcd", CheckStatus::Problems { exit_code: 2 }));
        s.finish(Duration::from_millis(2250));

        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["mode"], "parallel");
        assert_eq!(v["total_duration_ms"], 2250);
        assert_eq!(v["checks"][0]["name"], "etcd");
        assert_eq!(v["checks"][0]["kind"], "problems");
        assert_eq!(v["checks"][0]["exit_code"], 2);
        assert_eq!(v["checks"][0]["duration_ms"], 1500);
        assert!(v.get("cluster").is_none());
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(CheckStatus::Passed.label(), "ok");
        assert_eq!(CheckStatus::Problems { exit_code: 3 }.label(), "exit 3");
        assert_eq!(
            CheckStatus::TimedOut { after_secs: 30 }.label(),
            "timed out after 30s"
        );
    }
}
