//! Non-verbose output filter.
//!
//! Check providers print a lot of per-object detail. Without `--verbose` only
//! the lines that carry the verdict are kept:
//! - blank lines (they separate sections),
//! - lines holding a status glyph (`✓ ✗ ⚠ ...`) or a bracketed status tag,
//! - numbered section headers such as `3. Checking etcd members`,
//! - summary headers and banner rules (`=== SUMMARY ===`, `━━━━━━`).
//!
//! Matching runs on the line with ANSI colour codes stripped; the kept line
//! is passed through untouched.

const STATUS_GLYPHS: &[char] = &[
    '✓', '✔', '✗', '✘', '❌', '⚠', '❗', 'ℹ', '🔴', '🟢', '🟡', '✅',
];

const STATUS_TAGS: &[&str] = &["[OK]", "[PASS]", "[WARN]", "[FAIL]", "[ERROR]", "[INFO]"];

const RULE_CHARS: &[char] = &['=', '─', '━', '═', '-', '#', '*'];

pub fn is_interesting(line: &str) -> bool {
    let plain = console::strip_ansi_codes(line);
    let trimmed = plain.trim();

    trimmed.is_empty()
        || has_status_marker(trimmed)
        || is_numbered_header(trimmed)
        || is_summary_header(trimmed)
}

/// Keep every line when `verbose`, otherwise only the interesting ones.
pub fn filter_output(raw: &str, verbose: bool) -> String {
    if verbose {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len() / 2);
    for line in raw.lines().filter(|l| is_interesting(l)) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn has_status_marker(s: &str) -> bool {
    s.contains(STATUS_GLYPHS) || STATUS_TAGS.iter().any(|t| s.contains(t))
}

/// `1. Foo`, `12) Bar`, `[3/7] Baz`
fn is_numbered_header(s: &str) -> bool {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        return (rest.starts_with(". ") || rest.starts_with(") ")) && rest.len() > 2;
    }
    if let Some(inner) = s.strip_prefix('[') {
        if let Some((frac, _)) = inner.split_once(']') {
            if let Some((a, b)) = frac.split_once('/') {
                return is_number(a) && is_number(b);
            }
        }
    }
    false
}

fn is_summary_header(s: &str) -> bool {
    // "Summary", "SUMMARY:", "Summary of findings", not "pod-summary-exporter"
    let first = s.split_whitespace().next().unwrap_or("");
    if first.trim_end_matches(':').eq_ignore_ascii_case("summary") {
        return true;
    }
    // a banner rule, optionally wrapping a title: "=== ETCD ==="
    s.chars().take_while(|c| RULE_CHARS.contains(c)).count() >= 3
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
