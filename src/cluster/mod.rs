//! The orchestrator's own cluster queries.
//! 来源：kubectl version / cluster-info / get nodes / get pods

use serde::Serialize;
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, warn};

use crate::utils::{KubecheckError, Result};

// ── 数据结构 ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ratio {
    /// Ready nodes or running pods, depending on the counter.
    pub up: u64,
    pub total: u64,
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.up, self.total)
    }
}

/// Cluster-wide counters for the summary. Each one is fetched on its own;
/// `None` means that query failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterSnapshot {
    pub nodes_ready: Option<Ratio>,
    pub pods_running: Option<Ratio>,
    pub system_pods_running: Option<Ratio>,
}

#[derive(Debug, Clone)]
pub struct Kubectl {
    bin: PathBuf,
    context: Option<String>,
    request_timeout_secs: u64,
}

// ── kubectl ─────────────────────────────────────────────────────────────────

impl Kubectl {
    pub fn new(bin: impl Into<PathBuf>, context: Option<String>, request_timeout_secs: u64) -> Self {
        Self { bin: bin.into(), context, request_timeout_secs }
    }

    /// Tool present and cluster reachable. Nothing runs unless both hold.
    pub fn preflight(&self) -> Result<()> {
        let out = Command::new(&self.bin)
            .args(["version", "--client"])
            .output()
            .map_err(|e| KubecheckError::KubectlMissing(format!("{}: {}", self.bin.display(), e)))?;
        if !out.status.success() {
            return Err(KubecheckError::KubectlMissing(format!(
                "{} version --client failed: {}",
                self.bin.display(),
                stderr_line(&out)
            )));
        }

        let out = self.run(&["cluster-info"])?;
        if !out.status.success() {
            return Err(KubecheckError::ClusterUnreachable(stderr_line(&out)));
        }
        debug!("preflight ok");
        Ok(())
    }

    pub fn get_json(&self, args: &[&str]) -> Result<serde_json::Value> {
        let mut full: Vec<&str> = vec!["get"];
        full.extend_from_slice(args);
        full.extend_from_slice(&["-o", "json"]);

        let out = self.run(&full)?;
        if !out.status.success() {
            return Err(KubecheckError::Kubectl(format!(
                "kubectl {} failed: {}",
                full.join(" "),
                stderr_line(&out)
            )));
        }
        serde_json::from_slice(&out.stdout)
            .map_err(|e| KubecheckError::Parse(format!("kubectl {} JSON: {}", full.join(" "), e)))
    }

    /// Best effort: a failed query leaves its counter empty.
    pub fn snapshot(&self) -> ClusterSnapshot {
        ClusterSnapshot {
            nodes_ready: self.counter("nodes", &["nodes"], count_ready_nodes),
            pods_running: self.counter("pods", &["pods", "--all-namespaces"], count_running_pods),
            system_pods_running: self.counter(
                "kube-system pods",
                &["pods", "-n", "kube-system"],
                count_running_pods,
            ),
        }
    }

    fn counter(&self, what: &str, args: &[&str], count: fn(&serde_json::Value) -> Ratio) -> Option<Ratio> {
        match self.get_json(args) {
            Ok(list) => Some(count(&list)),
            Err(e) => {
                warn!("cannot count {}: {}", what, e);
                None
            }
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.bin);
        if let Some(ctx) = &self.context {
            cmd.args(["--context", ctx.as_str()]);
        }
        cmd.arg(format!("--request-timeout={}s", self.request_timeout_secs));
        cmd.args(args);
        debug!(?args, "kubectl");

        cmd.output()
            .map_err(|e| KubecheckError::KubectlMissing(format!("{}: {}", self.bin.display(), e)))
    }
}

// ── 解析 ────────────────────────────────────────────────────────────────────

/// Nodes whose `Ready` condition is `True`, out of all listed nodes.
pub fn count_ready_nodes(list: &serde_json::Value) -> Ratio {
    let items = items(list);
    let ready = items
        .iter()
        .filter(|node| {
            node["status"]["conditions"]
                .as_array()
                .map(|conds| {
                    conds.iter().any(|c| c["type"] == "Ready" && c["status"] == "True")
                })
                .unwrap_or(false)
        })
        .count();
    Ratio { up: ready as u64, total: items.len() as u64 }
}

/// Pods in phase `Running`, out of all listed pods.
pub fn count_running_pods(list: &serde_json::Value) -> Ratio {
    let items = items(list);
    let running = items
        .iter()
        .filter(|pod| pod["status"]["phase"] == "Running")
        .count();
    Ratio { up: running as u64, total: items.len() as u64 }
}

fn items(list: &serde_json::Value) -> &[serde_json::Value] {
    list["items"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn stderr_line(out: &Output) -> String {
    let err = String::from_utf8_lossy(&out.stderr);
    let line = err.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.is_empty() {
        format!("exit status {}", out.status)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::os::unix::fs::PermissionsExt;

    fn node(ready: &str) -> serde_json::Value {
        json!({
            "status": {
                "conditions": [
                    { "type": "MemoryPressure", "status": "False" },
                    { "type": "Ready", "status": ready }
                ]
            }
        })
    }

    #[test]
    fn counts_ready_nodes() {
        let list = json!({ "items": [node("True"), node("False"), node("Unknown"), node("True")] });
        assert_eq!(count_ready_nodes(&list), Ratio { up: 2, total: 4 });
    }

    #[test]
    fn node_without_conditions_is_not_ready() {
        let list = json!({ "items": [ { "status": {} } ] });
        assert_eq!(count_ready_nodes(&list), Ratio { up: 0, total: 1 });
    }

    #[test]
    fn counts_running_pods() {
        let list = json!({ "items": [
            { "status": { "phase": "Running" } },
            { "status": { "phase": "Pending" } },
            { "status": { "phase": "Succeeded" } },
            { "status": { "phase": "Running" } }
        ]});
        assert_eq!(count_running_pods(&list), Ratio { up: 2, total: 4 });
    }

    #[test]
    fn missing_items_counts_zero() {
        assert_eq!(count_running_pods(&json!({})), Ratio { up: 0, total: 0 });
        assert_eq!(Ratio { up: 3, total: 5 }.to_string(), "3/5");
    }

    #[test]
    fn ratio_serializes_neutral_field_names() {
        let v = serde_json::to_value(Ratio { up: 3, total: 5 }).unwrap();
        assert_eq!(v, json!({ "up": 3, "total": 5 }));
    }

    fn stub_kubectl(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("kubectl");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn preflight_reports_missing_binary() {
        let k = Kubectl::new("/nonexistent/kubectl", None, 5);
        assert!(matches!(k.preflight(), Err(KubecheckError::KubectlMissing(_))));
    }

    #[test]
    fn preflight_reports_unreachable_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub_kubectl(
            dir.path(),
            r#"case "$*" in *cluster-info*) echo "connection refused" >&2; exit 1;; esac; exit 0"#,
        );
        let k = Kubectl::new(bin, None, 5);
        match k.preflight() {
            Err(KubecheckError::ClusterUnreachable(msg)) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn snapshot_counters_fail_independently() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub_kubectl(
            dir.path(),
            r#"case "$*" in "--context prod --request-timeout=5s "*) ;; *) exit 2;; esac
case "$*" in
  *"get nodes"*) echo '{"items":[{"status":{"conditions":[{"type":"Ready","status":"True"}]}}]}';;
  *kube-system*) exit 1;;
  *"get pods"*) echo '{"items":[{"status":{"phase":"Running"}},{"status":{"phase":"Failed"}}]}';;
esac"#,
        );
        let k = Kubectl::new(bin, Some("prod".into()), 5);
        let snap = k.snapshot();
        assert_eq!(snap.nodes_ready, Some(Ratio { up: 1, total: 1 }));
        assert_eq!(snap.pods_running, Some(Ratio { up: 1, total: 2 }));
        assert_eq!(snap.system_pods_running, None);
    }
}
