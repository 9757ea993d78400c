//! Runs one check provider and captures what it printed.
//!
//! stdout and stderr of the child share one anonymous temp file, so the
//! capture keeps their interleaving. The child inherits cwd and environment;
//! stdin is closed.
//!
//! Every provider leads its own process group. A timeout kills the whole
//! group, and [`terminate_running`] forwards an interrupt to every group
//! still alive, so nothing a provider started outlives the run.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::{access, AccessFlags, Pid};
use tracing::{debug, info, warn};

use crate::check::filter;
use crate::check::registry::CheckDescriptor;
use crate::check::report::{CheckOutcome, CheckStatus};
use crate::utils::ExecOptions;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Process groups of providers that have been spawned and not yet reaped.
static RUNNING: Mutex<Vec<Pid>> = Mutex::new(Vec::new());

enum Exit {
    Finished(ExitStatus),
    TimedOut(Duration),
}

/// Never fails: anything that stops the provider from running becomes
/// `CheckStatus::Unavailable` so the rest of the run carries on.
pub fn execute(desc: &CheckDescriptor, opts: &ExecOptions) -> CheckOutcome {
    let start = Instant::now();
    debug!(check = %desc.name, path = %desc.executable_path.display(), "starting check");

    let (status, raw) = match run_captured(desc, opts) {
        Ok((exit, raw)) => (classify(&exit, &raw), raw),
        Err(reason) => {
            warn!(check = %desc.name, "check unavailable: {}", reason);
            (CheckStatus::Unavailable { reason }, String::new())
        }
    };

    let duration = start.elapsed();
    info!(check = %desc.name, status = %status.label(), ms = duration.as_millis() as u64, "check finished");

    let output = filter::filter_output(&raw, opts.verbose);
    let hidden_lines = raw.lines().count().saturating_sub(output.lines().count());

    CheckOutcome {
        name: desc.name.clone(),
        description: desc.description.clone(),
        status,
        output,
        hidden_lines,
        duration,
    }
}

/// Missing, a directory, or lacking the execute bit.
pub fn check_runnable(path: &Path) -> std::result::Result<(), String> {
    let meta = std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if meta.is_dir() {
        return Err(format!("{} is a directory", path.display()));
    }
    access(path, AccessFlags::X_OK).map_err(|_| format!("{} is not executable", path.display()))
}

fn run_captured(desc: &CheckDescriptor, opts: &ExecOptions) -> std::result::Result<(Exit, String), String> {
    check_runnable(&desc.executable_path)?;

    let mut capture = tempfile::tempfile().map_err(|e| format!("capture file: {}", e))?;
    let stdout = clone_handle(&capture)?;
    let stderr = clone_handle(&capture)?;

    let mut cmd = Command::new(&desc.executable_path);
    cmd.envs(opts.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .process_group(0);

    // held across spawn so an interrupt never misses a fresh group
    let (child, group) = {
        let mut running = RUNNING.lock().unwrap_or_else(|e| e.into_inner());
        let child = cmd
            .spawn()
            .map_err(|e| format!("spawn {}: {}", desc.executable_path.display(), e))?;
        let group = Pid::from_raw(child.id() as i32);
        running.push(group);
        (child, group)
    };

    let exit = wait(child, group, opts.timeout);
    RUNNING.lock().unwrap_or_else(|e| e.into_inner()).retain(|p| *p != group);
    let exit = exit.map_err(|e| format!("wait: {}", e))?;

    let mut bytes = Vec::new();
    capture
        .seek(SeekFrom::Start(0))
        .and_then(|_| capture.read_to_end(&mut bytes))
        .map_err(|e| format!("read capture: {}", e))?;

    Ok((exit, String::from_utf8_lossy(&bytes).into_owned()))
}

fn clone_handle(file: &File) -> std::result::Result<Stdio, String> {
    file.try_clone()
        .map(Stdio::from)
        .map_err(|e| format!("capture file: {}", e))
}

/// Send SIGTERM to every provider process group still running.
pub fn terminate_running() {
    let running = RUNNING.lock().unwrap_or_else(|e| e.into_inner());
    for group in running.iter() {
        if let Err(e) = killpg(*group, Signal::SIGTERM) {
            debug!(pgid = group.as_raw(), "killpg: {}", e);
        }
    }
}

fn wait(mut child: Child, group: Pid, timeout: Option<Duration>) -> std::io::Result<Exit> {
    let Some(limit) = timeout else {
        return child.wait().map(Exit::Finished);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Exit::Finished(status));
        }
        if start.elapsed() >= limit {
            // the leader may already be gone; the rest of its group still dies
            if let Err(e) = killpg(group, Signal::SIGKILL) {
                debug!(pgid = group.as_raw(), "killpg: {}", e);
                let _ = child.kill();
            }
            child.wait()?;
            return Ok(Exit::TimedOut(limit));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn classify(exit: &Exit, raw: &str) -> CheckStatus {
    let status = match exit {
        Exit::TimedOut(limit) => return CheckStatus::TimedOut { after_secs: limit.as_secs() },
        Exit::Finished(status) => status,
    };

    match (status.code(), status.signal()) {
        (Some(0), _) if raw.trim().is_empty() => CheckStatus::Silent,
        (Some(0), _) => CheckStatus::Passed,
        (Some(code), _) => CheckStatus::Problems { exit_code: code },
        (None, Some(sig)) => CheckStatus::Signaled {
            signal: Signal::try_from(sig)
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|_| format!("signal {}", sig)),
        },
        (None, None) => CheckStatus::Problems { exit_code: -1 },
    }
}
