use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// How the engine schedules the selected checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    Sequential,
    Parallel,
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecMode::Sequential => write!(f, "sequential"),
            ExecMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// Rendering of the final summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Knobs shared by the executor and the engine.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub mode: ExecMode,
    /// Pass provider output through unfiltered.
    pub verbose: bool,
    /// Upper bound on concurrently running providers in parallel mode.
    /// `None` launches every selected check at once.
    pub max_jobs: Option<NonZeroUsize>,
    /// Kill a provider still running after this long.
    pub timeout: Option<std::time::Duration>,
    /// Extra environment handed to every provider.
    pub env: Vec<(String, String)>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            mode: ExecMode::Sequential,
            verbose: false,
            max_jobs: None,
            timeout: None,
            env: Vec::new(),
        }
    }
}
