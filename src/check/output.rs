//! 输出层：banners, registry listing, summary (text or json), transcript tee

use console::style;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use crate::check::registry::{CheckDescriptor, Registry};
use crate::check::report::{CheckOutcome, CheckStatus, RunSummary};
use crate::utils::{ExecMode, KubecheckError, OutputFormat, Result};

const RULE_WIDTH: usize = 60;

// ── Transcript ──────────────────────────────────────────────────────────────

/// Writes every byte to `primary` and, when present, the same bytes to `copy`.
pub struct Tee<A: Write, B: Write> {
    primary: A,
    copy: Option<B>,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(primary: A, copy: Option<B>) -> Self {
        Self { primary, copy }
    }

    pub fn into_parts(self) -> (A, Option<B>) {
        (self.primary, self.copy)
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        if let Some(copy) = self.copy.as_mut() {
            copy.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        if let Some(copy) = self.copy.as_mut() {
            copy.flush()?;
        }
        Ok(())
    }
}

/// stdout, teed into `path` when given.
pub type Transcript = Tee<io::Stdout, File>;

pub fn open_transcript(path: Option<&Path>) -> Result<Transcript> {
    let copy = match path {
        Some(p) => Some(File::create(p).map_err(|e| {
            KubecheckError::System(format!("cannot create output file {}: {}", p.display(), e))
        })?),
        None => None,
    };
    Ok(Tee::new(io::stdout(), copy))
}

// ── Run header / check blocks ───────────────────────────────────────────────

pub fn write_run_header(w: &mut dyn Write, started_at: &str, mode: ExecMode, selected: usize) -> Result<()> {
    print_section(w, "KUBERNETES CLUSTER CHECKS")?;
    writeln!(w, "  Started      : {}", started_at)?;
    writeln!(w, "  Mode         : {}", mode)?;
    writeln!(w, "  Checks       : {}", selected)?;
    Ok(())
}

pub fn write_check_block(w: &mut dyn Write, outcome: &CheckOutcome) -> Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", "═".repeat(RULE_WIDTH))?;
    writeln!(w, "  {} {} — {}", style("▶").cyan(), style(&outcome.name).bold(), outcome.description)?;
    writeln!(w, "{}", "═".repeat(RULE_WIDTH))?;

    match &outcome.status {
        CheckStatus::Unavailable { reason } => {
            writeln!(w, "  {} check unavailable: {}", style("✗").red(), reason)?;
        }
        CheckStatus::Silent => {
            writeln!(w, "  {} (no output)", style("⚠").yellow())?;
        }
        _ if outcome.output.trim().is_empty() && outcome.hidden_lines > 0 => {
            writeln!(
                w,
                "  {}",
                style(format!("({} lines hidden, use --verbose)", outcome.hidden_lines)).dim()
            )?;
        }
        _ if outcome.output.trim().is_empty() => {
            writeln!(w, "  {} (no output)", style("⚠").yellow())?;
        }
        _ => {
            w.write_all(outcome.output.as_bytes())?;
            if !outcome.output.ends_with('\n') {
                writeln!(w)?;
            }
        }
    }

    let footer = format!(
        "── {} {} in {} ",
        outcome.name,
        outcome.status.label(),
        fmt_duration(outcome.duration)
    );
    let pad = RULE_WIDTH.saturating_sub(footer.chars().count());
    writeln!(w, "{}{}", status_colour(&outcome.status, &footer), "─".repeat(pad))?;
    Ok(())
}

// ── Listing ─────────────────────────────────────────────────────────────────

pub fn write_listing(w: &mut dyn Write, registry: &Registry) -> Result<()> {
    let checks = registry.list_all();
    let width = checks.iter().map(|c| c.name.len()).max().unwrap_or(0);

    writeln!(w, "Available checks:")?;
    for c in checks {
        writeln!(w, "  {:<width$}  {}", c.name, c.description, width = width)?;
    }
    Ok(())
}

pub fn write_selection_hint(w: &mut dyn Write) -> Result<()> {
    writeln!(w, "Usage: kubecheck [OPTIONS] [CHECK]...   (or --all; --help for options)")?;
    writeln!(w)?;
    Ok(())
}

// ── Summary ─────────────────────────────────────────────────────────────────

pub fn write_summary(w: &mut dyn Write, summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary)
                .map_err(|e| KubecheckError::System(format!("JSON serialize: {}", e)))?;
            writeln!(w, "{}", json)?;
        }
        OutputFormat::Text => write_summary_text(w, summary)?,
    }
    w.flush()?;
    Ok(())
}

fn write_summary_text(w: &mut dyn Write, s: &RunSummary) -> Result<()> {
    print_section(w, "SUMMARY")?;
    writeln!(w, "  Checks run   : {}", s.total)?;
    writeln!(w, "  Succeeded    : {}", style(s.succeeded).green())?;
    if s.failed > 0 {
        let detail = if s.unavailable > 0 {
            format!("  ({} unavailable)", s.unavailable)
        } else {
            String::new()
        };
        writeln!(w, "  Failed       : {}{}", style(s.failed).red(), detail)?;
    } else {
        writeln!(w, "  Failed       : 0")?;
    }
    writeln!(w, "  Duration     : {}", fmt_duration(s.total_duration))?;

    if s.failed > 0 {
        writeln!(w, "  Failed checks:")?;
        for c in s.failed_names() {
            writeln!(w, "    {} {:<18} {}", style("✗").red(), c.name, c.status.label())?;
        }
    }

    if let Some(cluster) = &s.cluster {
        writeln!(w, "  Cluster:")?;
        writeln!(w, "    Nodes ready        : {}", ratio_or_unavailable(cluster.nodes_ready))?;
        writeln!(w, "    Pods running       : {}", ratio_or_unavailable(cluster.pods_running))?;
        writeln!(w, "    kube-system running: {}", ratio_or_unavailable(cluster.system_pods_running))?;
    }
    Ok(())
}

// ── 格式化工具 ───────────────────────────────────────────────────────────────

fn print_section(w: &mut dyn Write, title: &str) -> Result<()> {
    writeln!(w, "\n{}", "─".repeat(RULE_WIDTH))?;
    writeln!(w, "  {}", style(title).bold())?;
    writeln!(w, "{}", "─".repeat(RULE_WIDTH))?;
    Ok(())
}

fn status_colour(status: &CheckStatus, text: &str) -> String {
    match status {
        CheckStatus::Passed => style(text).green().to_string(),
        CheckStatus::Silent => style(text).yellow().to_string(),
        _ => style(text).red().to_string(),
    }
}

fn ratio_or_unavailable(r: Option<crate::cluster::Ratio>) -> String {
    r.map(|r| r.to_string()).unwrap_or_else(|| "unavailable".to_string())
}

pub fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 60.0 {
        format!("{}m {:02}s", d.as_secs() / 60, d.as_secs() % 60)
    } else {
        format!("{:.2}s", secs)
    }
}

/// Names of the selected checks, for log lines.
pub fn names(selection: &[&CheckDescriptor]) -> String {
    selection.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterSnapshot, Ratio};

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).into_owned()
    }

    fn outcome(status: CheckStatus, output: &str) -> CheckOutcome {
        CheckOutcome {
            name: "etcd".into(),
            description: "etcd member health".into(),
            status,
            output: output.into(),
            hidden_lines: 0,
            duration: Duration::from_millis(1234),
        }
    }

    #[test]
    fn tee_copies_every_byte() {
        let mut tee: Tee<Vec<u8>, Vec<u8>> = Tee::new(Vec::new(), Some(Vec::new()));
        write!(tee, "line one\n✓ two\n").unwrap();
        tee.write_all(b"three").unwrap();
        let (a, b) = tee.into_parts();
        assert_eq!(a, b.unwrap());
        assert_eq!(a, "line one\n✓ two\nthree".as_bytes());
    }

    #[test]
    fn check_block_frames_output() {
        let text = render(|w| write_check_block(w, &outcome(CheckStatus::Passed, "✓ 3 members\n")));
        assert!(text.contains("▶ etcd — etcd member health"));
        assert!(text.contains("✓ 3 members\n"));
        assert!(text.contains("── etcd ok in 1.23s"));
    }

    #[test]
    fn check_block_reports_unavailable_and_silent() {
        let unavailable = render(|w| {
            write_check_block(w, &outcome(CheckStatus::Unavailable { reason: "/x: not found".into() }, ""))
        });
        assert!(unavailable.contains("check unavailable: /x: not found"));

        let silent = render(|w| write_check_block(w, &outcome(CheckStatus::Silent, "")));
        assert!(silent.contains("(no output)"));
    }

    #[test]
    fn check_block_notes_hidden_detail_instead_of_no_output() {
        let filtered = CheckOutcome { hidden_lines: 2, ..outcome(CheckStatus::Passed, "") };
        let text = render(|w| write_check_block(w, &filtered));
        assert!(text.contains("(2 lines hidden, use --verbose)"));
        assert!(!text.contains("(no output)"));
        assert!(text.contains("── etcd ok in 1.23s"));

        let crashed = render(|w| write_check_block(w, &outcome(CheckStatus::Problems { exit_code: 2 }, "")));
        assert!(crashed.contains("(no output)"));
    }

    #[test]
    fn listing_is_aligned_and_repeatable() {
        let reg = Registry::with_checks_dir(Path::new("/opt/checks"));
        let first = render(|w| write_listing(w, &reg));
        let second = render(|w| write_listing(w, &reg));
        assert_eq!(first, second);
        assert!(first.starts_with("Available checks:\n"));
        assert!(first.contains("  etcd              etcd member health"));
        assert_eq!(first.lines().count(), reg.len() + 1);
    }

    #[test]
    fn text_summary_lists_failures_and_counters() {
        let mut s = RunSummary::new(ExecMode::Sequential);
        s.record(&outcome(CheckStatus::Problems { exit_code: 1 }, "✗"));
        s.finish(Duration::from_secs(2));
        s.cluster = Some(ClusterSnapshot {
            nodes_ready: Some(Ratio { up: 3, total: 3 }),
            pods_running: Some(Ratio { up: 40, total: 42 }),
            system_pods_running: None,
        });

        let text = render(|w| write_summary(w, &s, OutputFormat::Text));
        assert!(text.contains("Checks run   : 1"));
        assert!(text.contains("Failed       : 1"));
        assert!(text.contains("etcd"));
        assert!(text.contains("exit 1"));
        assert!(text.contains("Nodes ready        : 3/3"));
        assert!(text.contains("Pods running       : 40/42"));
        assert!(text.contains("kube-system running: unavailable"));
    }

    #[test]
    fn json_summary_is_parseable() {
        let mut s = RunSummary::new(ExecMode::Parallel);
        s.record(&outcome(CheckStatus::Passed, "✓"));
        let text = render(|w| write_summary(w, &s, OutputFormat::Json));
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["succeeded"], 1);
        assert_eq!(v["checks"][0]["kind"], "passed");
    }

    #[test]
    fn durations() {
        assert_eq!(fmt_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(fmt_duration(Duration::from_secs(125)), "2m 05s");
    }
}
