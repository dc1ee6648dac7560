//! One-shot command handlers and their console output.
//!
//! Layout errors are logged as warnings and otherwise swallowed; only
//! failures to write output propagate.

use std::io::Write;

use layout_tracker::{CaptureReport, GroupSummary, ReconcileReport, Tracker, Trigger, WindowRecord};
use time::{OffsetDateTime, macros::format_description};
use tracing::warn;

use crate::error::Result;

/// Capture `name` and print the new slots.
pub fn capture(tracker: &Tracker, name: &str, out: &mut dyn Write) -> Result<()> {
    match tracker.capture(name) {
        Ok(report) => write!(out, "{}", render_capture(&report))?,
        Err(e) => warn!("{e}"),
    }
    Ok(())
}

/// Restore (or rearrange, when `rearrange` is set) `name` and print a summary.
pub fn reconcile(
    tracker: &Tracker,
    name: &str,
    rearrange: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let result = if rearrange {
        tracker.rearrange(name)
    } else {
        tracker.restore(name)
    };
    match result {
        Ok(report) => writeln!(out, "{}", render_reconcile(&report))?,
        Err(e) => warn!("{e}"),
    }
    Ok(())
}

/// Print every saved group.
pub fn list(tracker: &Tracker, out: &mut dyn Write) -> Result<()> {
    write!(out, "{}", render_list(&tracker.list_groups()))?;
    Ok(())
}

/// `(x, y) - WxH` for one record.
fn geometry(r: &WindowRecord) -> String {
    format!("({}, {}) - {}x{}", r.x, r.y, r.width, r.height)
}

/// Capture time as `YYYY-MM-DD HH:MM:SS` UTC, or raw seconds if out of range.
fn captured_at(r: &WindowRecord) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp_nanos((r.captured_at * 1e9) as i128)
        .ok()
        .and_then(|t| t.format(&fmt).ok())
        .map(|s| format!("{s} UTC"))
        .unwrap_or_else(|| format!("{}s", r.captured_at))
}

/// Lines describing a capture.
fn render_capture(report: &CaptureReport) -> String {
    let mut s = format!(
        "Captured {} window(s) for '{}'\n",
        report.records.len(),
        report.group
    );
    for r in &report.records {
        s.push_str(&format!("  #{}: {}\n", r.slot, geometry(r)));
    }
    if report.save_error.is_some() {
        s.push_str("  (layout kept for this session only; it could not be saved)\n");
    }
    s
}

/// One-line summary of a restore/rearrange pass.
fn render_reconcile(report: &ReconcileReport) -> String {
    let verb = match report.trigger {
        Trigger::Restore => "Restored",
        Trigger::Rearrange => "Rearranged",
    };
    let mut s = format!(
        "{verb} '{}': {} moved, {} already in place",
        report.group,
        report.moved.len(),
        report.unchanged.len()
    );
    if !report.failed.is_empty() {
        s.push_str(&format!(", {} failed", report.failed.len()));
    }
    if !report.unmapped.is_empty() {
        s.push_str(&format!(", {} without a saved slot", report.unmapped.len()));
    }
    if report.unused_slots() > 0 {
        s.push_str(&format!(", {} saved slot(s) unused", report.unused_slots()));
    }
    s
}

/// Listing of saved groups.
fn render_list(groups: &[GroupSummary]) -> String {
    if groups.is_empty() {
        return "No saved groups\n".to_string();
    }
    let mut s = String::new();
    for g in groups {
        s.push_str(&format!("'{}': {} window(s)\n", g.name, g.slot_count()));
        for r in &g.records {
            s.push_str(&format!(
                "  #{}: {}  captured {}\n",
                r.slot,
                geometry(r),
                captured_at(r)
            ));
        }
    }
    s
}
