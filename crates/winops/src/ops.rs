//! Window operations capability and its test double.

use crate::{Pos, Result as WinResult, WindowId, WindowInfo, title_matches};

/// Trait abstraction over window operations to improve testability.
pub trait WinOps: Send + Sync {
    /// Enumerate all top-level windows the backend can see.
    fn list_windows(&self) -> WinResult<Vec<WindowInfo>>;

    /// Move and resize a window to `pos` in one request.
    fn move_resize(&self, id: WindowId, pos: Pos) -> WinResult<()>;

    /// Visible windows whose title contains `pattern`, ignoring case.
    fn windows_matching(&self, pattern: &str) -> WinResult<Vec<WindowInfo>> {
        Ok(self
            .list_windows()?
            .into_iter()
            .filter(|w| w.visible && title_matches(&w.title, pattern))
            .collect())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockWinOps, mock_window};

/// Recording mock used by tests in this and dependent crates.
#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::{
        collections::HashSet,
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use parking_lot::Mutex;

    use super::WinOps;
    use crate::{Error, Pos, Result as WinResult, WindowId, WindowInfo};

    /// Build a visible window for tests.
    pub fn mock_window(
        id: WindowId,
        title: &str,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> WindowInfo {
        WindowInfo {
            id,
            title: title.into(),
            pos: Pos::new(x, y, width, height),
            visible: true,
        }
    }

    /// Simple mock implementation for tests (enabled with `test-utils` feature).
    ///
    /// Successful moves update the stored window geometry, so a following
    /// `list_windows` observes the result just like a real desktop would.
    #[derive(Clone, Default)]
    pub struct MockWinOps {
        /// Current simulated desktop.
        windows: Arc<Mutex<Vec<WindowInfo>>>,
        /// Every successful move/resize, in order.
        moves: Arc<Mutex<Vec<(WindowId, Pos)>>>,
        /// Number of enumerations served (including failed ones).
        lists: Arc<AtomicUsize>,
        /// Make `list_windows` fail.
        fail_list: Arc<AtomicBool>,
        /// Windows whose move/resize requests fail.
        fail_move: Arc<Mutex<HashSet<WindowId>>>,
    }

    impl MockWinOps {
        /// Empty desktop with no injected failures.
        pub fn new() -> Self {
            Self::default()
        }
        /// Replace the simulated desktop.
        pub fn set_windows(&self, wins: Vec<WindowInfo>) {
            *self.windows.lock() = wins;
        }
        /// Snapshot of the simulated desktop.
        pub fn windows(&self) -> Vec<WindowInfo> {
            self.windows.lock().clone()
        }
        /// Geometry of window `id`, if it exists.
        pub fn pos_of(&self, id: WindowId) -> Option<Pos> {
            self.windows.lock().iter().find(|w| w.id == id).map(|w| w.pos)
        }
        /// Simulate the user dragging or resizing a window.
        pub fn set_pos(&self, id: WindowId, pos: Pos) {
            if let Some(w) = self.windows.lock().iter_mut().find(|w| w.id == id) {
                w.pos = pos;
            }
        }
        /// Simulate the user closing a window.
        pub fn close(&self, id: WindowId) {
            self.windows.lock().retain(|w| w.id != id);
        }
        /// Successful move/resize calls, in order.
        pub fn moves(&self) -> Vec<(WindowId, Pos)> {
            self.moves.lock().clone()
        }
        /// Number of successful moves.
        pub fn move_count(&self) -> usize {
            self.moves.lock().len()
        }
        /// Forget recorded moves.
        pub fn clear_moves(&self) {
            self.moves.lock().clear();
        }
        /// Number of `list_windows` calls.
        pub fn list_count(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }
        /// Make enumeration fail while `v` is set.
        pub fn set_fail_list(&self, v: bool) {
            self.fail_list.store(v, Ordering::SeqCst);
        }
        /// Make moves of window `id` fail while `v` is set.
        pub fn set_fail_move(&self, id: WindowId, v: bool) {
            let mut g = self.fail_move.lock();
            if v {
                g.insert(id);
            } else {
                g.remove(&id);
            }
        }
    }

    impl WinOps for MockWinOps {
        fn list_windows(&self) -> WinResult<Vec<WindowInfo>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(Error::Command {
                    tool: "mock".into(),
                    status: "exit status: 1".into(),
                    stderr: "simulated enumeration failure".into(),
                });
            }
            Ok(self.windows.lock().clone())
        }

        fn move_resize(&self, id: WindowId, pos: Pos) -> WinResult<()> {
            if self.fail_move.lock().contains(&id) {
                return Err(Error::WindowGone(id));
            }
            let mut wins = self.windows.lock();
            let Some(w) = wins.iter_mut().find(|w| w.id == id) else {
                return Err(Error::WindowGone(id));
            };
            w.pos = pos;
            self.moves.lock().push((id, pos));
            Ok(())
        }
    }
}
