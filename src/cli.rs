use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::check::registry::default_checks_dir;
use crate::check::RunConfig;
use crate::utils::{ExecMode, ExecOptions, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "kubecheck")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Run Kubernetes cluster health checks and summarise the results", long_about = None)]
pub struct Cli {
    /// Checks to run, in order (see --list)
    #[arg(value_name = "CHECK")]
    pub checks: Vec<String>,

    /// Run every registered check
    #[arg(short, long)]
    pub all: bool,

    /// Also write the full transcript to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show each check's full output instead of status lines only
    #[arg(short, long)]
    pub verbose: bool,

    /// Run the selected checks concurrently
    #[arg(short, long)]
    pub parallel: bool,

    /// With --parallel, run at most N checks at a time (default: no limit)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<NonZeroUsize>,

    /// List available checks and exit
    #[arg(short, long)]
    pub list: bool,

    /// Kill a check still running after SECS seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Directory holding the check scripts
    #[arg(long, env = "KUBECHECK_CHECKS_DIR", value_name = "DIR")]
    pub checks_dir: Option<PathBuf>,

    /// kubectl binary
    #[arg(long, env = "KUBECTL", default_value = "kubectl")]
    pub kubectl: PathBuf,

    /// kubeconfig context for the orchestrator's queries (exported to checks)
    #[arg(long, env = "KUBECHECK_CONTEXT")]
    pub context: Option<String>,

    /// Per-request timeout for the orchestrator's own kubectl calls, in seconds
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    pub request_timeout: u64,

    /// Do not verify kubectl and cluster reachability before running
    #[arg(long)]
    pub skip_preflight: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Diagnostic log level (overridden by RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> RunConfig {
        let mode = if self.parallel { ExecMode::Parallel } else { ExecMode::Sequential };
        RunConfig {
            all: self.all,
            names: self.checks,
            list: self.list,
            output: self.output,
            format: self.format,
            checks_dir: self.checks_dir.unwrap_or_else(default_checks_dir),
            kubectl: self.kubectl,
            context: self.context,
            request_timeout_secs: self.request_timeout,
            skip_preflight: self.skip_preflight,
            exec: ExecOptions {
                mode,
                verbose: self.verbose,
                max_jobs: self.jobs,
                timeout: self.timeout.map(Duration::from_secs),
                env: Vec::new(),
            },
        }
    }
}
