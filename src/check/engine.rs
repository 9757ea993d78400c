//! Scheduling of the selected checks.
//!
//! Both modes flush outcomes to the transcript in selection order, so the
//! transcript is identical whichever check finishes first.

use std::io::Write;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::check::executor;
use crate::check::output;
use crate::check::registry::CheckDescriptor;
use crate::check::report::{CheckOutcome, RunSummary};
use crate::utils::{ExecMode, ExecOptions, Result};

/// How often the parallel engine names the checks it is still waiting on.
const STILL_RUNNING_EVERY: Duration = Duration::from_secs(30);

pub fn run(selection: &[&CheckDescriptor], opts: &ExecOptions, out: &mut dyn Write) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::new(opts.mode);

    match opts.mode {
        ExecMode::Sequential => run_sequential(selection, opts, out, &mut summary)?,
        ExecMode::Parallel => run_parallel(selection, opts, out, &mut summary)?,
    }

    summary.finish(start.elapsed());
    Ok(summary)
}

fn run_sequential(
    selection: &[&CheckDescriptor],
    opts: &ExecOptions,
    out: &mut dyn Write,
    summary: &mut RunSummary,
) -> Result<()> {
    for desc in selection {
        let outcome = executor::execute(desc, opts);
        flush(out, &outcome, summary)?;
    }
    Ok(())
}

/// Worker pool over the selection. Without `max_jobs` there is one worker per
/// check, i.e. everything starts at once.
fn run_parallel(
    selection: &[&CheckDescriptor],
    opts: &ExecOptions,
    out: &mut dyn Write,
    summary: &mut RunSummary,
) -> Result<()> {
    if selection.is_empty() {
        return Ok(());
    }
    let workers = worker_count(selection.len(), opts.max_jobs);
    debug!(checks = selection.len(), workers, "launching checks");

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, CheckOutcome)>();

    std::thread::scope(|s| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            s.spawn(move || loop {
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(desc) = selection.get(i) else { break };
                let outcome = executor::execute(desc, opts);
                if tx.send((i, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        collect_in_order(rx, selection, &next, out, summary)
    })
}

/// Receive outcomes as they complete, write each one as soon as every check
/// selected before it has been written.
fn collect_in_order(
    rx: Receiver<(usize, CheckOutcome)>,
    selection: &[&CheckDescriptor],
    started: &AtomicUsize,
    out: &mut dyn Write,
    summary: &mut RunSummary,
) -> Result<()> {
    let mut slots: Vec<Option<CheckOutcome>> = (0..selection.len()).map(|_| None).collect();
    let mut flushed = 0;

    while flushed < slots.len() {
        match rx.recv_timeout(STILL_RUNNING_EVERY) {
            Ok((i, outcome)) => {
                slots[i] = Some(outcome);
                while let Some(outcome) = slots.get_mut(flushed).and_then(Option::take) {
                    flush(out, &outcome, summary)?;
                    flushed += 1;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let launched = started.load(Ordering::SeqCst).min(selection.len());
                let running: Vec<&str> = (flushed..launched)
                    .filter(|&i| slots[i].is_none())
                    .map(|i| selection[i].name.as_str())
                    .collect();
                warn!("still waiting on: {}", running.join(", "));
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

fn flush(out: &mut dyn Write, outcome: &CheckOutcome, summary: &mut RunSummary) -> Result<()> {
    output::write_check_block(out, outcome)?;
    out.flush()?;
    summary.record(outcome);
    Ok(())
}

fn worker_count(checks: usize, max_jobs: Option<NonZeroUsize>) -> usize {
    max_jobs.map_or(checks, |n| n.get().min(checks)).max(1)
}
