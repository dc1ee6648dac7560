#![warn(missing_docs)]

//! Entry point for the `winkeep` binary.

mod cli;
mod commands;
mod error;

use std::{io, process, sync::Arc};

use clap::Parser;
use layout_tracker::{LayoutStore, Monitor, StopOutcome, Tracker};
use tokio::{runtime::Builder, signal};
use tracing::{error, info};
use winops::{Wmctrl, ops::WinOps};

use crate::{
    cli::{Cli, Commands, MonitorArgs},
    error::{Error, Result},
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli {
        log,
        store,
        wmctrl,
        command,
    } = Cli::parse();
    logging::init(&log.spec());

    let ops: Arc<dyn WinOps> = Arc::new(Wmctrl::new(wmctrl));
    let tracker = Arc::new(Tracker::new(ops, LayoutStore::open(store)));
    let mut out = io::stdout().lock();

    match command {
        Commands::Capture(args) => commands::capture(&tracker, &args.name, &mut out),
        Commands::Restore(args) => commands::reconcile(&tracker, &args.name, false, &mut out),
        Commands::Rearrange(args) => commands::reconcile(&tracker, &args.name, true, &mut out),
        Commands::List => commands::list(&tracker, &mut out),
        Commands::Monitor(args) => {
            drop(out);
            monitor(tracker, &args)
        }
    }
}

/// Watch a group until Ctrl-C, then stop the monitor.
fn monitor(tracker: Arc<Tracker>, args: &MonitorArgs) -> Result<()> {
    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;
    let monitor = Monitor::new(tracker, rt.handle().clone());
    let cfg = args.cfg();
    monitor.start(&args.name, cfg);
    println!(
        "Monitoring '{}' every {} (tolerance ±{}px); press Ctrl-C to stop",
        args.name,
        humantime::format_duration(cfg.interval),
        cfg.tolerance
    );

    rt.block_on(signal::ctrl_c()).map_err(Error::Signal)?;
    info!("interrupted");
    if monitor.stop() == StopOutcome::Abandoned {
        eprintln!("monitor did not stop cleanly");
    }
    Ok(())
}
