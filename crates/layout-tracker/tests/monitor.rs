use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use layout_tracker::{LayoutStore, Monitor, MonitorCfg, MonitorState, StopOutcome, Tracker};
use tempfile::TempDir;
use tokio::runtime::{Builder, Runtime};
use winops::{
    Pos,
    ops::{MockWinOps, WinOps, mock_window},
};

const TICK: Duration = Duration::from_millis(20);

fn fast_cfg() -> MonitorCfg {
    MonitorCfg {
        interval: TICK,
        tolerance: 10,
    }
}

fn runtime() -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("build test runtime")
}

/// Poll `cond` until it holds or two seconds pass.
fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

struct Fixture {
    _dir: TempDir,
    rt: Runtime,
    mock: Arc<MockWinOps>,
    tracker: Arc<Tracker>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockWinOps::new());
        let store = LayoutStore::open(dir.path().join("layouts.json"));
        let tracker = Arc::new(Tracker::new(mock.clone() as Arc<dyn WinOps>, store));
        Self {
            _dir: dir,
            rt: runtime(),
            mock,
            tracker,
        }
    }

    fn monitor(&self) -> Monitor {
        Monitor::new(self.tracker.clone(), self.rt.handle().clone())
    }

    /// Two side-by-side windows, captured.
    fn captured_pair(&self) {
        self.mock.set_windows(vec![
            mock_window(1, "Tab", 0, 0, 400, 300),
            mock_window(2, "Tab", 400, 0, 400, 300),
        ]);
        self.tracker.capture("Tab").unwrap();
    }
}

#[test]
fn start_and_stop_transition_states() {
    let f = Fixture::new();
    let monitor = f.monitor();
    assert_eq!(monitor.state(), MonitorState::Idle);
    assert!(monitor.start("Tab", fast_cfg()));
    assert_eq!(
        monitor.state(),
        MonitorState::Watching {
            group: "Tab".into()
        }
    );
    assert!(wait_until(|| monitor.stats().cycles() >= 2));
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
    assert_eq!(monitor.state(), MonitorState::Idle);
}

#[test]
fn stop_while_idle_is_a_noop() {
    let f = Fixture::new();
    let monitor = f.monitor();
    assert_eq!(monitor.stop(), StopOutcome::NotRunning);
    assert!(!monitor.is_watching());
}

#[test]
fn second_start_does_not_spawn_another_task() {
    let f = Fixture::new();
    f.mock.set_windows(vec![mock_window(1, "Tab", 0, 0, 1, 1)]);
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(!monitor.start("Other", fast_cfg()));
    assert_eq!(
        monitor.state(),
        MonitorState::Watching {
            group: "Tab".into()
        }
    );
    assert!(wait_until(|| monitor.stats().cycles() >= 3));
    assert_eq!(monitor.stop(), StopOutcome::Stopped);

    // Once stopped nothing keeps polling, so no second task was left running.
    let lists = f.mock.list_count();
    thread::sleep(TICK * 5);
    assert_eq!(f.mock.list_count(), lists);
    assert_eq!(monitor.stop(), StopOutcome::NotRunning);
}

#[test]
fn monitor_can_be_restarted_after_stop() {
    let f = Fixture::new();
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(monitor.is_watching());
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
}

#[test]
fn closing_a_window_triggers_rearrange() {
    let f = Fixture::new();
    f.captured_pair();
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));

    // First cycle sees 0 → 2 and rearranges; windows are already in place.
    assert!(wait_until(|| monitor.stats().drifts() >= 1));
    assert_eq!(f.mock.move_count(), 0);

    f.mock.close(1);
    assert!(wait_until(|| f.mock.pos_of(2) == Some(Pos::new(0, 0, 400, 300))));
    assert!(monitor.stats().drifts() >= 2);
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
}

#[test]
fn geometry_beyond_tolerance_is_corrected() {
    let f = Fixture::new();
    f.captured_pair();
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(wait_until(|| monitor.stats().drifts() >= 1));

    f.mock.set_pos(2, Pos::new(411, 0, 400, 300));
    assert!(wait_until(|| f.mock.pos_of(2) == Some(Pos::new(400, 0, 400, 300))));
    assert_eq!(f.mock.moves(), vec![(2, Pos::new(400, 0, 400, 300))]);
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
}

#[test]
fn geometry_within_tolerance_is_left_alone() {
    let f = Fixture::new();
    f.captured_pair();
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(wait_until(|| monitor.stats().drifts() >= 1));

    f.mock.set_pos(2, Pos::new(410, 10, 390, 310));
    let cycles = monitor.stats().cycles();
    assert!(wait_until(|| monitor.stats().cycles() >= cycles + 4));
    assert_eq!(f.mock.move_count(), 0);
    assert_eq!(monitor.stats().drifts(), 1);
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
}

#[test]
fn cycle_errors_do_not_stop_watching() {
    let f = Fixture::new();
    f.captured_pair();
    f.mock.set_fail_list(true);
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(wait_until(|| monitor.stats().errors() >= 2));
    assert!(monitor.is_watching());

    f.mock.set_fail_list(false);
    assert!(wait_until(|| monitor.stats().drifts() >= 1));
    assert_eq!(monitor.stop(), StopOutcome::Stopped);
}

#[test]
fn dropping_a_watching_monitor_cancels_its_task() {
    let f = Fixture::new();
    let monitor = f.monitor();
    assert!(monitor.start("Tab", fast_cfg()));
    assert!(wait_until(|| monitor.stats().cycles() >= 1));
    drop(monitor);
    thread::sleep(TICK * 3);
    let lists = f.mock.list_count();
    thread::sleep(TICK * 5);
    assert_eq!(f.mock.list_count(), lists);
}
