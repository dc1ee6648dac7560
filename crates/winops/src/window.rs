/// Backend-specific window identifier (an X11 window id for `wmctrl`).
pub type WindowId = u64;

/// Top-left position and size of a window in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Pos {
    /// Construct a position from its four components.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Largest absolute per-axis difference between two geometries.
    pub fn max_deviation(&self, other: &Self) -> u32 {
        let d = |a: i32, b: i32| a.abs_diff(b);
        d(self.x, other.x)
            .max(d(self.y, other.y))
            .max(d(self.width, other.width))
            .max(d(self.height, other.height))
    }
}

/// A top-level window as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Backend window id.
    pub id: WindowId,
    /// Window title.
    pub title: String,
    /// Current geometry.
    pub pos: Pos,
    /// False for windows the backend knows to be minimized or unmapped.
    pub visible: bool,
}

/// Case-insensitive substring match used to select a window group.
pub fn title_matches(title: &str, pattern: &str) -> bool {
    title.to_lowercase().contains(&pattern.to_lowercase())
}

/// Sort windows ascending by `(x, y)`. Ties keep enumeration order.
pub fn sort_by_position(windows: &mut [WindowInfo]) {
    windows.sort_by_key(|w| (w.pos.x, w.pos.y));
}
