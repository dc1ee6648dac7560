//! Error handling for the layout tracker.

use std::{path::PathBuf, result};

use thiserror::Error;
use winops::WindowId;

/// Convenient result type for layout tracker operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors reported by store, tracker and monitor operations.
///
/// None of these is fatal: each is caught at the operation boundary and
/// leaves saved state untouched unless stated otherwise.
#[derive(Debug, Error)]
pub enum Error {
    /// Persisted layouts could not be read or parsed; the store was reset to empty.
    #[error("failed to load layouts from {}: {message}", path.display())]
    StorageLoad {
        /// Storage file.
        path: PathBuf,
        /// Human-readable cause.
        message: String,
    },
    /// Layouts could not be written; in-memory state is unaffected.
    #[error("failed to save layouts to {}: {message}", path.display())]
    StorageSave {
        /// Storage file.
        path: PathBuf,
        /// Human-readable cause.
        message: String,
    },
    /// No visible window title contains the pattern.
    #[error("no windows with a title containing '{pattern}'")]
    NotFound {
        /// Title pattern that matched nothing.
        pattern: String,
    },
    /// The operation needs a previous capture of the group.
    #[error("no saved layout for '{group}'")]
    NoSavedData {
        /// Group without saved records.
        group: String,
    },
    /// A single move/resize failed; remaining windows were still processed.
    #[error("failed to move window #{slot} ({id:#x}): {source}")]
    GeometryCommand {
        /// Slot the window was being moved to.
        slot: usize,
        /// Backend window id.
        id: WindowId,
        /// Backend failure.
        #[source]
        source: winops::Error,
    },
    /// Window enumeration failed.
    #[error("window enumeration failed: {0}")]
    Enumerate(#[from] winops::Error),
    /// A monitor poll cycle failed; the monitor keeps running.
    #[error("poll cycle for '{group}' failed: {source}")]
    PollCycle {
        /// Group being monitored.
        group: String,
        /// What went wrong during the cycle.
        #[source]
        source: Box<Self>,
    },
}

impl Error {
    /// Wrap `self` as a failure of a monitor cycle for `group`.
    pub fn in_poll_cycle(self, group: &str) -> Self {
        Self::PollCycle {
            group: group.to_string(),
            source: Box::new(self),
        }
    }
}
