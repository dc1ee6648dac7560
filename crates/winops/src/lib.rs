//! winops: window geometry operations for winkeep.
//!
//! Provides the [`ops::WinOps`] capability used by the layout tracker to
//! enumerate top-level windows, filter them by title, and move/resize them.
//! The production backend drives `wmctrl` on EWMH-compliant X11 desktops; a
//! recording mock is available under the `test-utils` feature.

mod error;
pub mod ops;
mod window;
pub mod wmctrl;

pub use error::{Error, Result};
pub use window::{Pos, WindowId, WindowInfo, sort_by_position, title_matches};
pub use wmctrl::Wmctrl;
