//! Background drift monitor for one window group.
//!
//! A [`Monitor`] is either idle or watching a single group. While watching,
//! a task on the supplied Tokio runtime polls the group every interval,
//! running the blocking window queries on the blocking pool, and
//! rearranges the group when it drifts. Stopping cancels the task's token
//! and waits a bounded time for the current cycle to finish.

use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender, channel},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{DriftDetector, PollOutcome, Tracker};

/// Default time `stop` waits for the polling task.
pub const STOP_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorCfg {
    /// Pause between poll cycles.
    pub interval: Duration,
    /// Per-axis deviation in pixels tolerated before rearranging.
    pub tolerance: u32,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            tolerance: 10,
        }
    }
}

/// Counters updated by the polling task.
#[derive(Debug, Default)]
pub struct MonitorStats {
    /// Completed poll cycles.
    cycles: AtomicU64,
    /// Cycles that found drift and attempted a rearrange.
    drifts: AtomicU64,
    /// Cycles that failed.
    errors: AtomicU64,
}

impl MonitorStats {
    /// Completed poll cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
    /// Cycles that found drift.
    pub fn drifts(&self) -> u64 {
        self.drifts.load(Ordering::SeqCst)
    }
    /// Cycles that failed.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}

/// Externally visible monitor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    /// No polling task.
    Idle,
    /// A polling task is running.
    Watching {
        /// Group being polled.
        group: String,
    },
}

/// Result of [`Monitor::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The monitor was idle; nothing happened.
    NotRunning,
    /// The polling task finished within the timeout.
    Stopped,
    /// The polling task did not finish in time and was left to exit on its own.
    Abandoned,
}

/// Handle to a running polling task.
struct Watch {
    /// Group being polled.
    group: String,
    /// Cancels the polling task.
    token: CancellationToken,
    /// Signalled once when the polling task exits.
    done_rx: Receiver<()>,
}

/// Internal state machine.
enum State {
    /// Nothing running.
    Idle,
    /// Polling task running.
    Watching(Watch),
}

/// Idle/Watching drift monitor. At most one polling task exists per monitor.
pub struct Monitor {
    /// Tracker used for polling and rearranging.
    tracker: Arc<Tracker>,
    /// Runtime the polling task is spawned on.
    runtime: Handle,
    /// Current state.
    state: Mutex<State>,
    /// Counters shared with the polling task.
    stats: Arc<MonitorStats>,
    /// Bound on how long `stop` blocks.
    stop_timeout: Duration,
}

impl Monitor {
    /// Idle monitor that will spawn its task on `runtime`.
    pub fn new(tracker: Arc<Tracker>, runtime: Handle) -> Self {
        Self {
            tracker,
            runtime,
            state: Mutex::new(State::Idle),
            stats: Arc::new(MonitorStats::default()),
            stop_timeout: STOP_WAIT_TIMEOUT,
        }
    }

    /// Override how long [`Monitor::stop`] waits for the polling task.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Current state.
    pub fn state(&self) -> MonitorState {
        match &*self.state.lock() {
            State::Idle => MonitorState::Idle,
            State::Watching(w) => MonitorState::Watching {
                group: w.group.clone(),
            },
        }
    }

    /// True while a polling task is running.
    pub fn is_watching(&self) -> bool {
        matches!(*self.state.lock(), State::Watching(_))
    }

    /// Counters for the current and previous watches.
    pub fn stats(&self) -> Arc<MonitorStats> {
        self.stats.clone()
    }

    /// Start watching `group`. Returns false, without spawning anything,
    /// when the monitor is already watching.
    pub fn start(&self, group: &str, cfg: MonitorCfg) -> bool {
        let mut state = self.state.lock();
        if let State::Watching(w) = &*state {
            warn!(group = %w.group, "already monitoring; ignoring start for '{group}'");
            return false;
        }

        let token = CancellationToken::new();
        let (done_tx, done_rx) = channel::<()>();
        info!(
            group,
            interval_ms = cfg.interval.as_millis() as u64,
            tolerance = cfg.tolerance,
            "monitoring started"
        );
        // The task is detached; completion is observed through `done_rx`.
        drop(self.runtime.spawn(watch_loop(
            self.tracker.clone(),
            group.to_string(),
            cfg,
            token.clone(),
            self.stats.clone(),
            done_tx,
        )));
        *state = State::Watching(Watch {
            group: group.to_string(),
            token,
            done_rx,
        });
        true
    }

    /// Stop watching, blocking up to the stop timeout for the current cycle.
    ///
    /// Must not be called from within an async context on the monitor's runtime.
    pub fn stop(&self) -> StopOutcome {
        let watch = match mem::replace(&mut *self.state.lock(), State::Idle) {
            State::Idle => {
                warn!("monitor is not running");
                return StopOutcome::NotRunning;
            }
            State::Watching(w) => w,
        };
        watch.token.cancel();
        match watch.done_rx.recv_timeout(self.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!(group = %watch.group, "monitoring stopped");
                StopOutcome::Stopped
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    group = %watch.group,
                    timeout_ms = self.stop_timeout.as_millis() as u64,
                    "monitor did not stop in time; abandoning it"
                );
                StopOutcome::Abandoned
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if let State::Watching(w) = &*self.state.lock() {
            // Don't block in drop; the task exits at its next cancellation check.
            w.token.cancel();
        }
    }
}

/// Poll `group` until `cancel` fires, checking only between cycles.
async fn watch_loop(
    tracker: Arc<Tracker>,
    group: String,
    cfg: MonitorCfg,
    cancel: CancellationToken,
    stats: Arc<MonitorStats>,
    done_tx: Sender<()>,
) {
    let mut detector = DriftDetector::new();
    loop {
        let t = tracker.clone();
        let g = group.clone();
        let mut det = detector;
        let cycle = task::spawn_blocking(move || {
            let out = t.poll(&g, cfg.tolerance, &mut det);
            (det, out)
        })
        .await;
        match cycle {
            Ok((det, Ok(outcome))) => {
                detector = det;
                if let PollOutcome::Drifted { .. } = outcome {
                    stats.drifts.fetch_add(1, Ordering::SeqCst);
                }
            }
            Ok((det, Err(e))) => {
                detector = det;
                stats.errors.fetch_add(1, Ordering::SeqCst);
                warn!(group = %group, "{e}");
            }
            Err(e) => {
                stats.errors.fetch_add(1, Ordering::SeqCst);
                warn!(group = %group, "poll cycle aborted: {e}");
            }
        }
        stats.cycles.fetch_add(1, Ordering::SeqCst);
        trace!(group = %group, baseline = detector.baseline(), "cycle done");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = time::sleep(cfg.interval) => {}
        }
    }
    debug!(group = %group, "monitor task exiting");
    if done_tx.send(()).is_err() {
        trace!(group = %group, "nobody waiting for monitor exit");
    }
}
