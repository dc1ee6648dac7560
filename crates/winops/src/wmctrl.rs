//! Production backend driving the `wmctrl` command-line tool.
//!
//! `wmctrl -lG` lists managed windows with their geometry, `wmctrl -d`
//! identifies the current desktop, and `wmctrl -i -r <id> -e` moves and
//! resizes a window. Windows are considered visible when they live on the
//! current desktop or are sticky (desktop `-1`).

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, trace, warn};

use crate::{Error, Pos, Result as WinResult, WindowId, WindowInfo, ops::WinOps};

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_BIN: &str = "wmctrl";

/// `wmctrl`-backed implementation of [`WinOps`].
#[derive(Debug, Clone)]
pub struct Wmctrl {
    /// Path or name of the wmctrl executable.
    bin: PathBuf,
}

impl Default for Wmctrl {
    fn default() -> Self {
        Self::new(DEFAULT_BIN)
    }
}

impl Wmctrl {
    /// Backend that runs the wmctrl executable at `bin`.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Executable this backend invokes.
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Run wmctrl with `args` and return its standard output.
    fn run(&self, args: &[&str]) -> WinResult<String> {
        trace!(bin = %self.bin.display(), ?args, "wmctrl");
        let out = Command::new(&self.bin)
            .args(args)
            .output()
            .map_err(|source| Error::Spawn {
                tool: self.bin.clone(),
                source,
            })?;
        if !out.status.success() {
            return Err(Error::Command {
                tool: self.bin.clone(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    /// Index of the current desktop, if wmctrl reports one.
    fn current_desktop(&self) -> Option<i64> {
        match self.run(&["-d"]) {
            Ok(out) => parse_current_desktop(&out),
            Err(e) => {
                debug!("wmctrl -d failed, treating all windows as visible: {e}");
                None
            }
        }
    }

    /// Whether window `id` is still listed.
    fn exists(&self, id: WindowId) -> bool {
        self.run(&["-l"])
            .map(|out| {
                out.lines()
                    .filter_map(|l| l.split_whitespace().next())
                    .filter_map(|tok| parse_window_id(tok).ok())
                    .any(|w| w == id)
            })
            .unwrap_or(false)
    }
}

impl WinOps for Wmctrl {
    fn list_windows(&self) -> WinResult<Vec<WindowInfo>> {
        let current = self.current_desktop();
        let out = self.run(&["-lG"])?;
        let mut windows = Vec::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            match parse_list_line(line) {
                Ok((desktop, mut info)) => {
                    info.visible = match current {
                        Some(cur) => desktop == cur || desktop < 0,
                        None => true,
                    };
                    windows.push(info);
                }
                Err(e) => warn!("skipping window: {e}"),
            }
        }
        Ok(windows)
    }

    fn move_resize(&self, id: WindowId, pos: Pos) -> WinResult<()> {
        if pos.width < 0 || pos.height < 0 {
            return Err(Error::InvalidGeometry {
                width: pos.width,
                height: pos.height,
            });
        }
        let id_arg = format!("{id:#010x}");
        let geom = format!("0,{},{},{},{}", pos.x, pos.y, pos.width, pos.height);
        self.run(&["-i", "-r", id_arg.as_str(), "-e", geom.as_str()])
            .map_err(|e| match e {
                Error::Command { .. } if !self.exists(id) => Error::WindowGone(id),
                other => other,
            })?;
        Ok(())
    }
}

/// Parse a hexadecimal X11 window id such as `0x03a00003`.
fn parse_window_id(tok: &str) -> Result<WindowId, &'static str> {
    let hex = tok
        .strip_prefix("0x")
        .or_else(|| tok.strip_prefix("0X"))
        .ok_or("window id is not hexadecimal")?;
    WindowId::from_str_radix(hex, 16).map_err(|_| "window id is not hexadecimal")
}

/// Split off `n` whitespace-separated fields and return them with the untouched remainder.
fn split_fields(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(n);
    let mut rest = line.trim_start();
    for _ in 0..n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest))
}

/// Parse one `wmctrl -lG` line into its desktop index and window.
///
/// Layout: `<id> <desktop> <x> <y> <width> <height> <host> <title...>`.
fn parse_list_line(line: &str) -> WinResult<(i64, WindowInfo)> {
    let err = |reason| Error::Parse {
        line: line.to_string(),
        reason,
    };
    let (f, title) = split_fields(line, 7).ok_or_else(|| err("too few fields"))?;
    let id = parse_window_id(f[0]).map_err(err)?;
    let desktop: i64 = f[1].parse().map_err(|_| err("bad desktop index"))?;
    let num = |s: &str| s.parse::<i32>().map_err(|_| err("bad geometry"));
    let pos = Pos::new(num(f[2])?, num(f[3])?, num(f[4])?, num(f[5])?);
    Ok((
        desktop,
        WindowInfo {
            id,
            title: title.trim_end().to_string(),
            pos,
            visible: true,
        },
    ))
}

/// Find the desktop marked `*` in `wmctrl -d` output.
fn parse_current_desktop(out: &str) -> Option<i64> {
    out.lines().find_map(|line| {
        let mut it = line.split_whitespace();
        let idx = it.next()?;
        (it.next()? == "*").then(|| idx.parse().ok()).flatten()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_line_with_spaced_title() {
        let (desk, w) =
            parse_list_line("0x03a00003  0 64   24   1856 1032 box MetaBomb 2.0 - Chromium")
                .unwrap();
        assert_eq!(desk, 0);
        assert_eq!(w.id, 0x03a0_0003);
        assert_eq!(w.pos, Pos::new(64, 24, 1856, 1032));
        assert_eq!(w.title, "MetaBomb 2.0 - Chromium");
    }

    #[test]
    fn parses_sticky_and_untitled_windows() {
        let (desk, w) = parse_list_line("0x01e00001 -1 0    0    3840 24   box").unwrap();
        assert_eq!(desk, -1);
        assert_eq!(w.title, "");
        assert_eq!(w.pos.width, 3840);
    }

    #[test]
    fn negative_coordinates_are_accepted() {
        let (_, w) = parse_list_line("0x0400000a  1 -8 -31 800 600 box Tab").unwrap();
        assert_eq!(w.pos, Pos::new(-8, -31, 800, 600));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_list_line("0x0400000a 1 10 10"),
            Err(Error::Parse { reason: "too few fields", .. })
        ));
        assert!(matches!(
            parse_list_line("window 1 0 0 10 10 box t"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_list_line("0x1 1 0 zero 10 10 box t"),
            Err(Error::Parse { reason: "bad geometry", .. })
        ));
    }

    #[test]
    fn finds_current_desktop() {
        let out = "0  - DG: 3840x1080  VP: N/A  WA: 0,24 3840x1056  one\n\
                   1  * DG: 3840x1080  VP: 0,0  WA: 0,24 3840x1056  two\n";
        assert_eq!(parse_current_desktop(out), Some(1));
        assert_eq!(parse_current_desktop(""), None);
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let ops = Wmctrl::new("/nonexistent/winkeep-wmctrl");
        assert!(matches!(ops.list_windows(), Err(Error::Spawn { .. })));
    }

    #[test]
    fn negative_size_is_rejected_before_running() {
        let ops = Wmctrl::new("/nonexistent/winkeep-wmctrl");
        assert!(matches!(
            ops.move_resize(1, Pos::new(0, 0, -1, 10)),
            Err(Error::InvalidGeometry { .. })
        ));
    }
}
