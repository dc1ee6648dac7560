use std::{io, path::PathBuf};

use thiserror::Error;

use crate::WindowId;

/// Errors that can occur during window operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The backend tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// Path or name of the tool we tried to run.
        tool: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The backend tool ran but reported failure.
    #[error("{tool} exited with {status}: {stderr}")]
    Command {
        /// Path or name of the tool.
        tool: PathBuf,
        /// Rendered exit status.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// A line of window list output could not be understood.
    #[error("unparseable window list line {line:?}: {reason}")]
    Parse {
        /// The offending line.
        line: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The window disappeared before the operation could be applied.
    #[error("window {0:#x} is gone")]
    WindowGone(WindowId),

    /// Requested geometry cannot be applied (negative size).
    #[error("invalid geometry {width}x{height}")]
    InvalidGeometry {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
}

/// Convenient result type for window operations.
pub type Result<T> = std::result::Result<T, Error>;
