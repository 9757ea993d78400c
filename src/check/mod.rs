pub mod engine;
pub mod executor;
pub mod filter;
pub mod output;
pub mod registry;
pub mod report;
pub mod selection;

use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::cluster::Kubectl;
use crate::utils::{ExecOptions, KubecheckError, OutputFormat, Result};
use registry::Registry;

/// Everything one invocation needs, already parsed from flags and environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub all: bool,
    pub names: Vec<String>,
    pub list: bool,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub checks_dir: PathBuf,
    pub kubectl: PathBuf,
    pub context: Option<String>,
    pub request_timeout_secs: u64,
    pub skip_preflight: bool,
    pub exec: ExecOptions,
}

pub fn run_checks(config: &RunConfig) -> Result<()> {
    let registry = Registry::with_checks_dir(&config.checks_dir);

    if config.list {
        let mut out = std::io::stdout();
        output::write_listing(&mut out, &registry)?;
        return Ok(());
    }

    let selection = match selection::resolve(&registry, config.all, &config.names) {
        Ok(sel) => sel,
        Err(e) => {
            let mut err = std::io::stderr();
            if matches!(e, KubecheckError::NoChecksSelected) {
                output::write_selection_hint(&mut err)?;
            }
            output::write_listing(&mut err, &registry)?;
            writeln!(err)?;
            return Err(e);
        }
    };
    info!("selected: {}", output::names(&selection));

    let kubectl = Kubectl::new(&config.kubectl, config.context.clone(), config.request_timeout_secs);
    if !config.skip_preflight {
        kubectl.preflight()?;
    }

    let mut exec = config.exec.clone();
    exec.env.push(("KUBECTL".to_string(), config.kubectl.display().to_string()));
    if let Some(ctx) = &config.context {
        exec.env.push(("KUBECHECK_CONTEXT".to_string(), ctx.clone()));
    }

    let mut transcript = output::open_transcript(config.output.as_deref())?;
    let started_at = report::timestamp();
    output::write_run_header(&mut transcript, &started_at, exec.mode, selection.len())?;

    let mut summary = engine::run(&selection, &exec, &mut transcript)?;

    // counters come from our own queries, independent of check results
    if selection.iter().any(|d| d.is_cluster_level()) {
        summary.cluster = Some(kubectl.snapshot());
    }
    summary.started_at = started_at;

    output::write_summary(&mut transcript, &summary, config.format)?;
    info!(
        total = summary.total,
        failed = summary.failed,
        "run complete"
    );
    Ok(())
}
