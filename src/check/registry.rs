//! Static table of check providers.
//! Declaration order is listing order: core checks first, peripheral ones last.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::{KubecheckError, Result};

// ── 数据结构 ────────────────────────────────────────────────────────────────

/// Whether a check looks at the cluster as a whole or at one component.
/// Selecting any cluster-level check adds the node/pod counters to the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Cluster,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDescriptor {
    pub name: String,
    pub executable_path: PathBuf,
    pub description: String,
    pub scope: Scope,
}

impl CheckDescriptor {
    pub fn new(
        name: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        description: impl Into<String>,
        scope: Scope,
    ) -> Self {
        Self {
            name: name.into(),
            executable_path: executable_path.into(),
            description: description.into(),
            scope,
        }
    }

    pub fn is_cluster_level(&self) -> bool {
        self.scope == Scope::Cluster
    }
}

/// (name, script file, description, scope)
const BUILTIN: &[(&str, &str, &str, Scope)] = &[
    ("cluster",          "cluster-overview.sh",        "API server, versions, namespaces and cluster-wide overview", Scope::Cluster),
    ("nodes",            "check-nodes.sh",             "Node readiness, pressure conditions and capacity",           Scope::Cluster),
    ("control-plane",    "check-control-plane.sh",     "API server, scheduler and controller-manager health",        Scope::Component),
    ("etcd",             "check-etcd.sh",              "etcd member health, leader and database size",              Scope::Component),
    ("coredns",          "check-coredns.sh",           "CoreDNS pods, service endpoints and in-cluster resolution", Scope::Component),
    ("cni",              "check-cni.sh",               "CNI plugin daemonset and pod networking",                   Scope::Component),
    ("kube-proxy",       "check-kube-proxy.sh",        "kube-proxy daemonset and service proxy mode",               Scope::Component),
    ("pods",             "check-pods.sh",              "Pod phases, restarts and CrashLoopBackOff",                 Scope::Cluster),
    ("workloads",        "check-workloads.sh",         "Deployment, StatefulSet and DaemonSet rollout state",       Scope::Component),
    ("storage",          "check-storage.sh",           "StorageClasses, CSI drivers and PV/PVC binding",            Scope::Component),
    ("ingress",          "check-ingress.sh",           "Ingress controllers and ingress resources",                 Scope::Component),
    ("cert-manager",     "check-cert-manager.sh",      "cert-manager deployment, issuers and certificates",        Scope::Component),
    ("metrics",          "check-metrics-server.sh",    "metrics-server availability and node/pod usage",            Scope::Component),
    ("events",           "check-events.sh",            "Recent warning events across namespaces",                   Scope::Component),
    ("resources",        "check-resources.sh",         "ResourceQuotas, LimitRanges and requests vs capacity",      Scope::Component),
    ("network-policies", "check-network-policies.sh",  "NetworkPolicy coverage per namespace",                      Scope::Component),
    ("security",         "check-security.sh",          "RBAC bindings, privileged pods and Pod Security admission", Scope::Component),
    ("certificates",     "check-certificates.sh",      "Control plane certificate expiry",                          Scope::Component),
    ("monitoring",       "check-monitoring.sh",        "Prometheus and Alertmanager stack",                         Scope::Component),
    ("logging",          "check-logging.sh",           "Log shipping agents and their backlog",                     Scope::Component),
];

// ── Registry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Registry {
    checks: Vec<CheckDescriptor>,
}

impl Registry {
    /// Build a registry from an explicit list. Names must be unique.
    pub fn new(checks: Vec<CheckDescriptor>) -> Result<Self> {
        for (i, c) in checks.iter().enumerate() {
            if checks[..i].iter().any(|prev| prev.name == c.name) {
                return Err(KubecheckError::DuplicateCheck(c.name.clone()));
            }
        }
        Ok(Self { checks })
    }

    /// The built-in table with every script resolved under `dir`.
    pub fn with_checks_dir(dir: &Path) -> Self {
        let checks = BUILTIN
            .iter()
            .map(|(name, file, desc, scope)| CheckDescriptor::new(*name, dir.join(file), *desc, *scope))
            .collect();
        Self { checks }
    }

    pub fn resolve(&self, name: &str) -> Result<&CheckDescriptor> {
        self.checks
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| KubecheckError::UnknownCheck(name.to_string()))
    }

    pub fn list_all(&self) -> &[CheckDescriptor] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// `checks/` next to the running executable, falling back to `./checks`.
pub fn default_checks_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("checks")))
        .unwrap_or_else(|| PathBuf::from("checks"))
}
