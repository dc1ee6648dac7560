//! Drift detection for monitored groups.

use std::fmt::{Display, Formatter, Result as FmtResult};

use winops::{Pos, WindowInfo};

use crate::WindowRecord;

/// Why a monitored group needs rearranging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drift {
    /// The number of matching windows changed since the last rearrange.
    CountChanged {
        /// Baseline count.
        from: usize,
        /// Count seen this cycle.
        to: usize,
    },
    /// A window deviates from its saved slot by more than the tolerance.
    Geometry {
        /// First offending slot.
        slot: usize,
        /// Where the window is now.
        current: Pos,
        /// Where it was saved.
        saved: Pos,
    },
}

impl Display for Drift {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::CountChanged { from, to } => write!(f, "window count changed: {from} → {to}"),
            Self::Geometry {
                slot,
                current,
                saved,
            } => write!(
                f,
                "window #{slot} moved/resized: ({},{}) {}x{} → ({},{}) {}x{}",
                current.x,
                current.y,
                current.width,
                current.height,
                saved.x,
                saved.y,
                saved.width,
                saved.height
            ),
        }
    }
}

/// First window (in the given order) deviating from its slot by more than `tolerance`.
///
/// A deviation equal to `tolerance` is within bounds. Windows beyond the
/// saved slot count are ignored. The scan stops at the first offender.
pub fn first_deviation(
    current: &[WindowInfo],
    saved: &[WindowRecord],
    tolerance: u32,
) -> Option<Drift> {
    current
        .iter()
        .zip(saved)
        .enumerate()
        .find(|(_, (win, rec))| win.pos.max_deviation(&rec.pos()) > tolerance)
        .map(|(slot, (win, rec))| Drift::Geometry {
            slot,
            current: win.pos,
            saved: rec.pos(),
        })
}

/// Per-monitor drift state: the window count at the last rearrange.
///
/// The baseline starts at zero, so the first cycle that sees any window
/// reports a count change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftDetector {
    /// Window count remembered from the last drift.
    baseline: usize,
}

impl DriftDetector {
    /// Detector with a zero baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Window count remembered from the last drift.
    pub fn baseline(&self) -> usize {
        self.baseline
    }

    /// Check `current` (sorted by position) against the baseline and `saved`.
    pub fn check(
        &self,
        current: &[WindowInfo],
        saved: Option<&[WindowRecord]>,
        tolerance: u32,
    ) -> Option<Drift> {
        let count = current.len();
        if count != self.baseline && count > 0 {
            return Some(Drift::CountChanged {
                from: self.baseline,
                to: count,
            });
        }
        saved.and_then(|saved| first_deviation(current, saved, tolerance))
    }

    /// Remember `count` as the baseline for following cycles.
    pub fn rebase(&mut self, count: usize) {
        self.baseline = count;
    }
}

#[cfg(test)]
mod tests {
    use winops::ops::mock_window;

    use super::*;

    fn rec(slot: usize, x: i32, y: i32, w: i32, h: i32) -> WindowRecord {
        WindowRecord {
            group: "Tab".into(),
            slot,
            x,
            y,
            width: w,
            height: h,
            captured_at: 0.0,
        }
    }

    fn steady(count: usize) -> DriftDetector {
        let mut d = DriftDetector::new();
        d.rebase(count);
        d
    }

    #[test]
    fn first_cycle_with_windows_is_a_count_change() {
        let d = DriftDetector::new();
        let cur = vec![mock_window(1, "Tab", 0, 0, 10, 10)];
        assert_eq!(
            d.check(&cur, None, 10),
            Some(Drift::CountChanged { from: 0, to: 1 })
        );
    }

    #[test]
    fn zero_windows_never_count_as_change() {
        let d = steady(2);
        assert_eq!(d.check(&[], Some(&[rec(0, 0, 0, 1, 1)]), 0), None);
    }

    #[test]
    fn tolerance_is_inclusive_on_every_axis() {
        let saved = [rec(0, 100, 100, 800, 600)];
        let d = steady(1);
        for (x, y, w, h) in [(110, 100, 800, 600), (100, 90, 800, 600), (100, 100, 810, 600), (100, 100, 800, 590)] {
            let cur = vec![mock_window(1, "Tab", x, y, w, h)];
            assert_eq!(d.check(&cur, Some(&saved), 10), None, "({x},{y}) {w}x{h}");
        }
        for (x, y, w, h) in [(111, 100, 800, 600), (100, 89, 800, 600), (100, 100, 811, 600), (100, 100, 800, 589)] {
            let cur = vec![mock_window(1, "Tab", x, y, w, h)];
            assert!(
                matches!(d.check(&cur, Some(&saved), 10), Some(Drift::Geometry { slot: 0, .. })),
                "({x},{y}) {w}x{h}"
            );
        }
    }

    #[test]
    fn scan_stops_at_first_offending_slot() {
        let saved = [rec(0, 0, 0, 10, 10), rec(1, 100, 0, 10, 10), rec(2, 200, 0, 10, 10)];
        let cur = vec![
            mock_window(1, "Tab", 0, 0, 10, 10),
            mock_window(2, "Tab", 150, 0, 10, 10),
            mock_window(3, "Tab", 290, 0, 10, 10),
        ];
        assert_eq!(
            first_deviation(&cur, &saved, 5),
            Some(Drift::Geometry {
                slot: 1,
                current: Pos::new(150, 0, 10, 10),
                saved: Pos::new(100, 0, 10, 10),
            })
        );
    }

    #[test]
    fn windows_without_slots_are_not_compared() {
        let saved = [rec(0, 0, 0, 10, 10)];
        let cur = vec![
            mock_window(1, "Tab", 0, 0, 10, 10),
            mock_window(2, "Tab", 900, 900, 10, 10),
        ];
        assert_eq!(steady(2).check(&cur, Some(&saved), 0), None);
    }

    #[test]
    fn count_change_takes_precedence_over_geometry() {
        let saved = [rec(0, 0, 0, 10, 10), rec(1, 100, 0, 10, 10)];
        let cur = vec![mock_window(1, "Tab", 500, 500, 10, 10)];
        assert_eq!(
            steady(2).check(&cur, Some(&saved), 0),
            Some(Drift::CountChanged { from: 2, to: 1 })
        );
    }

    #[test]
    fn drift_reasons_render() {
        assert_eq!(
            Drift::CountChanged { from: 2, to: 1 }.to_string(),
            "window count changed: 2 → 1"
        );
        let g = Drift::Geometry {
            slot: 0,
            current: Pos::new(1, 2, 3, 4),
            saved: Pos::new(5, 6, 7, 8),
        };
        assert_eq!(g.to_string(), "window #0 moved/resized: (1,2) 3x4 → (5,6) 7x8");
    }
}
