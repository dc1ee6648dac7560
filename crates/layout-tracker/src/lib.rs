//! layout-tracker: remember and enforce the layout of same-titled windows.
//!
//! A *group* is the set of visible windows whose title contains a pattern.
//! [`Tracker::capture`] records the group's geometry as slots ordered by
//! `(x, y)`, [`Tracker::restore`] and [`Tracker::rearrange`] push the saved
//! geometry back onto whatever windows currently match, and [`Monitor`]
//! polls a group in the background and rearranges it when it drifts.
//!
//! Window identity is purely positional: the n-th window by `(x, y)` is
//! slot n. No OS handle is assumed stable across captures.

mod drift;
mod error;
pub mod monitor;
mod record;
pub mod store;
mod tracker;

pub use drift::{Drift, DriftDetector, first_deviation};
pub use error::{Error, Result};
pub use monitor::{Monitor, MonitorCfg, MonitorState, MonitorStats, StopOutcome};
pub use record::{WindowRecord, unix_now};
pub use store::{DEFAULT_STORE_FILE, LayoutStore, Layouts};
pub use tracker::{CaptureReport, GroupSummary, PollOutcome, ReconcileReport, Tracker, Trigger};
