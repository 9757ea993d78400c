//! Kubernetes cluster health check orchestrator.
//!
//! Each check is an external provider script. `kubecheck` resolves the
//! requested checks against a static registry, runs them one by one or
//! concurrently, relays their output in selection order and prints a summary.

pub mod check;
pub mod cli;
pub mod cluster;
pub mod utils;
