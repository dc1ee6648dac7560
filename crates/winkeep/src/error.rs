//! Error handling for the winkeep binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for winkeep.
pub type Result<T> = result::Result<T, Error>;

/// Failures that end the process with a non-zero status.
///
/// Layout operation errors are not among them: those are reported as
/// warnings and the process still exits successfully.
#[derive(Debug, Error)]
pub enum Error {
    /// The async runtime could not be built.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    /// Waiting for Ctrl-C failed.
    #[error("failed to listen for Ctrl-C: {0}")]
    Signal(#[source] io::Error),
}
