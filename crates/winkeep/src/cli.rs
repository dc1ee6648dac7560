//! Command-line interface definitions for winkeep.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, value_parser};
use layout_tracker::{DEFAULT_STORE_FILE, MonitorCfg};
use logging::LogArgs;
use winops::wmctrl::DEFAULT_BIN;

/// Largest tolerance accepted on the command line, in pixels.
pub const MAX_TOLERANCE: u32 = 50;

/// Command-line interface for the `winkeep` binary.
#[derive(Parser, Debug)]
#[command(
    name = "winkeep",
    about = "Save, restore and guard the layout of same-titled windows",
    version
)]
pub struct Cli {
    /// Logging controls shared across workspace binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// File holding saved layouts.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    /// wmctrl executable used to list and move windows.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_BIN)]
    pub wmctrl: PathBuf,

    /// Operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save the position and size of every window whose title contains NAME.
    Capture(GroupArgs),
    /// Move windows matching NAME back to their saved positions.
    Restore(GroupArgs),
    /// Refill saved positions after some windows were closed.
    Rearrange(GroupArgs),
    /// Watch windows matching NAME and rearrange them when they drift.
    Monitor(MonitorArgs),
    /// List saved groups.
    List,
}

/// Arguments naming a window group.
#[derive(Args, Debug, Clone)]
pub struct GroupArgs {
    /// Title substring identifying the window group (case-insensitive).
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `monitor` subcommand.
#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    /// Title substring identifying the window group (case-insensitive).
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Time between checks.
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "2s",
        value_name = "DURATION"
    )]
    pub interval: Duration,

    /// Allowed deviation in pixels on each of x, y, width and height.
    #[arg(
        long,
        value_parser = value_parser!(u32).range(0..=i64::from(MAX_TOLERANCE)),
        default_value_t = 10,
        value_name = "PIXELS"
    )]
    pub tolerance: u32,
}

impl MonitorArgs {
    /// Monitor configuration for these arguments.
    pub fn cfg(&self) -> MonitorCfg {
        MonitorCfg {
            interval: self.interval,
            tolerance: self.tolerance,
        }
    }
}
