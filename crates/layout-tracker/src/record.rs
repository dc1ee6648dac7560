use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use winops::{Pos, WindowInfo};

/// Saved geometry of one window at a fixed slot within its group.
///
/// Serialized with the on-disk field names `title`, `index` and
/// `timestamp` (float seconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// Group (title pattern) this record belongs to.
    #[serde(rename = "title")]
    pub group: String,
    /// Position of the window in `(x, y)` order at capture time.
    #[serde(rename = "index")]
    pub slot: usize,
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Capture time in seconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub captured_at: f64,
}

impl WindowRecord {
    /// Record `window` as `slot` of `group`.
    pub fn from_window(group: &str, slot: usize, window: &WindowInfo, captured_at: f64) -> Self {
        Self {
            group: group.to_string(),
            slot,
            x: window.pos.x,
            y: window.pos.y,
            width: window.pos.width,
            height: window.pos.height,
            captured_at,
        }
    }

    /// Saved geometry as a [`Pos`].
    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y, self.width, self.height)
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
