//! Capture and reconciliation of window groups.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result as FmtResult},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};
use winops::{WindowId, WindowInfo, ops::WinOps, sort_by_position};

use crate::{Drift, DriftDetector, Error, LayoutStore, Result, WindowRecord, unix_now};

/// Longest window title echoed in capture logs.
const TITLE_LOG_LEN: usize = 50;

/// What caused a reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Explicit request after a deliberate relayout.
    Restore,
    /// Tabs were closed or moved; invoked by hand or by the monitor.
    Rearrange,
}

impl Display for Trigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Restore => "restore",
            Self::Rearrange => "rearrange",
        })
    }
}

/// Result of a successful capture.
#[derive(Debug)]
pub struct CaptureReport {
    /// Captured group.
    pub group: String,
    /// New records, slot order.
    pub records: Vec<WindowRecord>,
    /// Set when the records were kept in memory but could not be persisted.
    pub save_error: Option<Error>,
}

/// Outcome of a restore/rearrange pass.
#[derive(Debug)]
pub struct ReconcileReport {
    /// Reconciled group.
    pub group: String,
    /// Why the pass ran.
    pub trigger: Trigger,
    /// Number of saved slots for the group.
    pub saved_slots: usize,
    /// Slots whose window was moved/resized.
    pub moved: Vec<usize>,
    /// Slots whose window already had the saved geometry.
    pub unchanged: Vec<usize>,
    /// Windows beyond the saved slot count, left in place.
    pub unmapped: Vec<WindowId>,
    /// Per-window command failures.
    pub failed: Vec<Error>,
}

impl ReconcileReport {
    /// Saved slots with no window this pass.
    pub fn unused_slots(&self) -> usize {
        let applied = self.moved.len() + self.unchanged.len() + self.failed.len();
        self.saved_slots.saturating_sub(applied)
    }
}

/// A saved group as shown by listings.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    /// Group name.
    pub name: String,
    /// Saved records, slot order.
    pub records: Vec<WindowRecord>,
}

impl GroupSummary {
    /// Number of saved slots.
    pub fn slot_count(&self) -> usize {
        self.records.len()
    }
}

/// Result of a single monitor poll.
#[derive(Debug)]
pub enum PollOutcome {
    /// No drift; `count` windows matched.
    Steady {
        /// Matching windows this cycle.
        count: usize,
    },
    /// Drift was found and a rearrange attempted.
    Drifted {
        /// Reason for the rearrange.
        drift: Drift,
        /// Rearrange result.
        result: Result<ReconcileReport>,
    },
}

/// Matches open windows to saved slots and corrects their geometry.
///
/// Operations on the same group are serialized by a per-group lock, so a
/// capture never interleaves with a rearrange reading that group.
pub struct Tracker {
    /// Window backend.
    ops: Arc<dyn WinOps>,
    /// Saved layouts.
    store: Mutex<LayoutStore>,
    /// One exclusive lock per group name.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Tracker {
    /// Tracker over `ops` and `store`.
    pub fn new(ops: Arc<dyn WinOps>, store: LayoutStore) -> Self {
        Self {
            ops,
            store: Mutex::new(store),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock guarding operations on `group`.
    fn group_lock(&self, group: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(group.to_string())
            .or_default()
            .clone()
    }

    /// Visible windows matching `group`, sorted by `(x, y)`.
    fn current_windows(&self, group: &str) -> Result<Vec<WindowInfo>> {
        let mut windows = self.ops.windows_matching(group)?;
        sort_by_position(&mut windows);
        Ok(windows)
    }

    /// Saved records for `group`.
    pub fn saved(&self, group: &str) -> Option<Vec<WindowRecord>> {
        self.store.lock().get(group).map(<[WindowRecord]>::to_vec)
    }

    /// Record the current geometry of every window matching `group`,
    /// replacing anything saved for it before.
    pub fn capture(&self, group: &str) -> Result<CaptureReport> {
        let lock = self.group_lock(group);
        let _guard = lock.lock();

        let windows = self.current_windows(group)?;
        if windows.is_empty() {
            return Err(Error::NotFound {
                pattern: group.to_string(),
            });
        }

        let now = unix_now();
        let records: Vec<WindowRecord> = windows
            .iter()
            .enumerate()
            .map(|(slot, w)| WindowRecord::from_window(group, slot, w, now))
            .collect();
        for (w, r) in windows.iter().zip(&records) {
            info!(
                group,
                slot = r.slot,
                "captured window #{}: {} at ({}, {}) - {}x{}",
                r.slot,
                truncate(&w.title, TITLE_LOG_LEN),
                r.x,
                r.y,
                r.width,
                r.height
            );
        }

        let save_error = self.store.lock().capture(group, records.clone()).err();
        if let Some(e) = &save_error {
            warn!(group, "{e}");
        }
        info!(group, count = records.len(), "captured {} window(s)", records.len());
        Ok(CaptureReport {
            group: group.to_string(),
            records,
            save_error,
        })
    }

    /// Move every matching window back to its saved slot.
    pub fn restore(&self, group: &str) -> Result<ReconcileReport> {
        self.reconcile(group, Trigger::Restore)
    }

    /// Refill saved slots after windows closed or moved. Same algorithm as
    /// [`Tracker::restore`].
    pub fn rearrange(&self, group: &str) -> Result<ReconcileReport> {
        self.reconcile(group, Trigger::Rearrange)
    }

    /// Apply saved geometry to current windows, matched by sorted index.
    fn reconcile(&self, group: &str, trigger: Trigger) -> Result<ReconcileReport> {
        let lock = self.group_lock(group);
        let _guard = lock.lock();

        let saved = self.saved(group).ok_or_else(|| Error::NoSavedData {
            group: group.to_string(),
        })?;
        let current = self.current_windows(group)?;
        if current.is_empty() {
            return Err(Error::NotFound {
                pattern: group.to_string(),
            });
        }
        info!(
            group,
            %trigger,
            "applying {} window(s) to {} saved slot(s)",
            current.len(),
            saved.len()
        );

        let mut report = ReconcileReport {
            group: group.to_string(),
            trigger,
            saved_slots: saved.len(),
            moved: Vec::new(),
            unchanged: Vec::new(),
            unmapped: Vec::new(),
            failed: Vec::new(),
        };
        for (slot, win) in current.iter().enumerate() {
            let Some(rec) = saved.get(slot) else {
                warn!(group, slot, "window #{slot} has no saved slot; leaving it in place");
                report.unmapped.push(win.id);
                continue;
            };
            let target = rec.pos();
            if win.pos == target {
                debug!(group, slot, "window #{slot} already in place");
                report.unchanged.push(slot);
                continue;
            }
            match self.ops.move_resize(win.id, target) {
                Ok(()) => {
                    info!(
                        group,
                        slot,
                        "moved window #{slot} to ({}, {}) - {}x{}",
                        target.x,
                        target.y,
                        target.width,
                        target.height
                    );
                    report.moved.push(slot);
                }
                Err(source) => {
                    let e = Error::GeometryCommand {
                        slot,
                        id: win.id,
                        source,
                    };
                    warn!(group, slot, "{e}");
                    report.failed.push(e);
                }
            }
        }
        if report.unused_slots() > 0 {
            debug!(group, unused = report.unused_slots(), "saved slots without a window");
        }
        info!(group, %trigger, moved = report.moved.len(), "{trigger} complete");
        Ok(report)
    }

    /// Every saved group with its slots, in name order.
    pub fn list_groups(&self) -> Vec<GroupSummary> {
        self.store
            .lock()
            .groups()
            .map(|(name, records)| GroupSummary {
                name: name.to_string(),
                records: records.to_vec(),
            })
            .collect()
    }

    /// One monitor cycle: detect drift for `group` and rearrange on drift.
    ///
    /// The detector's baseline moves to the observed count whenever a
    /// rearrange is attempted, whether or not it succeeds.
    pub fn poll(
        &self,
        group: &str,
        tolerance: u32,
        detector: &mut DriftDetector,
    ) -> Result<PollOutcome> {
        let current = self
            .current_windows(group)
            .map_err(|e| e.in_poll_cycle(group))?;
        let saved = self.saved(group);
        let Some(drift) = detector.check(&current, saved.as_deref(), tolerance) else {
            trace!(group, count = current.len(), "no drift");
            return Ok(PollOutcome::Steady {
                count: current.len(),
            });
        };
        info!(group, "change detected: {drift}");
        let result = self.rearrange(group);
        if let Err(e) = &result {
            warn!(group, "rearrange after drift failed: {e}");
        }
        detector.rebase(current.len());
        Ok(PollOutcome::Drifted { drift, result })
    }
}

/// At most `max` characters of `s`, with an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}
