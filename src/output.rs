//! CLI output formatting for pipeline stages and watch mode.
//!
//! Every `format_*` function is pure and returns display lines; the matching
//! `print_*` wrapper writes them to stdout. Tests assert on the lines.
//!
//! # Output Format
//!
//! ## Stage report
//!
//! ```text
//! markdown: 1 written, 1 unchanged, 1 removed
//!     intro/intro
//!     - old/old
//! ```
//!
//! ## Watch
//!
//! ```text
//! Watching app/_layout/, app/_md/, app/_less/
//! Changed (markdown): app/_md/led/led.md
//! ```

use crate::pipeline::ChangeKind;
use crate::types::StageReport;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn rel_display(path: &Path, root: &Path) -> String {
    let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn change_name(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Layout => "layout",
        ChangeKind::Markdown => "markdown",
        ChangeKind::Stylesheet => "stylesheet",
    }
}

// ============================================================================
// Stage reports
// ============================================================================

/// Header line with counts, then one indented line per written or removed
/// entry.
///
/// Skipped entries are only counted.
pub fn format_stage_report(report: &StageReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut header = format!("{}: {} written", report.stage.name(), report.written.len());
    if !report.skipped.is_empty() {
        header.push_str(&format!(", {} unchanged", report.skipped.len()));
    }
    if !report.removed.is_empty() {
        header.push_str(&format!(", {} removed", report.removed.len()));
    }
    lines.push(header);
    for entry in &report.written {
        lines.push(format!("{}{}", indent(1), entry));
    }
    for entry in &report.removed {
        lines.push(format!("{}- {}", indent(1), entry));
    }
    lines
}

pub fn print_stage_report(report: &StageReport) {
    for line in format_stage_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Watch mode
// ============================================================================

pub fn format_watch_start(dirs: &[PathBuf], root: &Path) -> Vec<String> {
    if dirs.is_empty() {
        return vec!["Nothing to watch".to_string()];
    }
    let names: Vec<String> = dirs
        .iter()
        .map(|d| format!("{}/", rel_display(d, root)))
        .collect();
    vec![format!("Watching {}", names.join(", "))]
}

pub fn print_watch_start(dirs: &[PathBuf], root: &Path) {
    for line in format_watch_start(dirs, root) {
        println!("{}", line);
    }
}

pub fn format_watch_change(kinds: &BTreeSet<ChangeKind>, paths: &[PathBuf], root: &Path) -> Vec<String> {
    let kinds: Vec<&str> = kinds.iter().map(|k| change_name(*k)).collect();
    let files: Vec<String> = paths.iter().map(|p| rel_display(p, root)).collect();
    vec![format!("Changed ({}): {}", kinds.join(", "), files.join(", "))]
}

pub fn print_watch_change(kinds: &BTreeSet<ChangeKind>, paths: &[PathBuf], root: &Path) {
    for line in format_watch_change(kinds, paths, root) {
        println!("{}", line);
    }
}

pub fn format_watch_error(err: &dyn Display) -> Vec<String> {
    vec![format!("Rebuild failed: {err}"), "Still watching".to_string()]
}

/// Watch errors go to stderr; the loop keeps running.
pub fn print_watch_error(err: &dyn Display) {
    for line in format_watch_error(err) {
        eprintln!("{}", line);
    }
}
