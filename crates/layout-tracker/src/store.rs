//! Durable storage for captured layouts.
//!
//! The whole mapping is kept in memory and written as one JSON document
//! after every capture. Writes go to a temporary file in the destination
//! directory which is then renamed over the target, so readers only ever
//! see a complete document. The replacement keeps the permissions of the
//! file it replaces; a file created by the first save is owner-only.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    result,
};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{Error, Result, WindowRecord};

/// Storage file used when no path is configured.
pub const DEFAULT_STORE_FILE: &str = "window_positions.json";

/// Group name to slot-ordered records.
pub type Layouts = BTreeMap<String, Vec<WindowRecord>>;

/// In-memory layouts backed by a JSON file.
#[derive(Debug)]
pub struct LayoutStore {
    /// Backing file.
    path: PathBuf,
    /// Every captured group.
    groups: Layouts,
}

impl LayoutStore {
    /// Create an empty store for `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            groups: Layouts::new(),
        }
    }

    /// Create a store for `path` and load it, warning (not failing) on bad data.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        if let Err(e) = store.load() {
            warn!("{e}; starting with no saved layouts");
        }
        store
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace in-memory state with the file contents.
    ///
    /// A missing file yields an empty store. On any error the store is
    /// reset to empty before the error is returned.
    pub fn load(&mut self) -> Result<()> {
        self.groups.clear();
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no layout file yet");
                return Ok(());
            }
            Err(e) => return Err(self.load_error(e.to_string())),
        };
        let groups = decode(&text).map_err(|message| self.load_error(message))?;
        info!(
            path = %self.path.display(),
            groups = groups.len(),
            "loaded saved layouts"
        );
        self.groups = groups;
        Ok(())
    }

    /// Write every group to the backing file atomically.
    pub fn save(&self) -> Result<()> {
        let save_error = |message: String| Error::StorageSave {
            path: self.path.clone(),
            message,
        };
        let json = serde_json::to_string_pretty(&self.groups).map_err(|e| save_error(e.to_string()))?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| save_error(e.to_string()))?;
        info!(path = %self.path.display(), "saved layouts");
        Ok(())
    }

    /// Replace the records of `group` wholesale, then persist.
    ///
    /// The in-memory replacement stands even when saving fails.
    pub fn capture(&mut self, group: &str, records: Vec<WindowRecord>) -> Result<()> {
        self.groups.insert(group.to_string(), records);
        self.save()
    }

    /// Saved records for `group`, ordered by slot.
    pub fn get(&self, group: &str) -> Option<&[WindowRecord]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// All groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[WindowRecord])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of saved groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no group is saved.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Build a load error for this store's path.
    fn load_error(&self, message: String) -> Error {
        Error::StorageLoad {
            path: self.path.clone(),
            message,
        }
    }
}

/// Parse and validate a layout document.
fn decode(text: &str) -> result::Result<Layouts, String> {
    let mut groups: Layouts = serde_json::from_str(text).map_err(|e| e.to_string())?;
    for (name, records) in &mut groups {
        records.sort_by_key(|r| r.slot);
        if let Some((want, r)) = records.iter().enumerate().find(|(i, r)| r.slot != *i) {
            return Err(format!(
                "group '{name}' has slot {} where slot {want} was expected",
                r.slot
            ));
        }
    }
    Ok(groups)
}

/// Write `bytes` to a sibling temp file, sync it, and rename it over `path`.
///
/// An existing target's permissions are carried over to the replacement.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    match fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(group: &str, slot: usize, x: i32, y: i32) -> WindowRecord {
        WindowRecord {
            group: group.into(),
            slot,
            x,
            y,
            width: 800,
            height: 600,
            captured_at: 1_700_000_000.123_456_7,
        }
    }

    #[test]
    fn decode_orders_records_by_index() {
        let text = r#"{"Tab": [
            {"title": "Tab", "index": 1, "x": 50, "y": 50, "width": 1, "height": 2, "timestamp": 2.5},
            {"title": "Tab", "index": 0, "x": 10, "y": 10, "width": 3, "height": 4, "timestamp": 2.5}
        ]}"#;
        let groups = decode(text).unwrap();
        let slots: Vec<_> = groups["Tab"].iter().map(|r| (r.slot, r.x)).collect();
        assert_eq!(slots, vec![(0, 10), (1, 50)]);
    }

    #[test]
    fn decode_rejects_gaps_and_duplicates() {
        let gap = r#"{"Tab": [
            {"title": "Tab", "index": 0, "x": 0, "y": 0, "width": 1, "height": 1, "timestamp": 0.0},
            {"title": "Tab", "index": 2, "x": 0, "y": 0, "width": 1, "height": 1, "timestamp": 0.0}
        ]}"#;
        assert!(decode(gap).unwrap_err().contains("slot 2"));
        let dup = r#"{"Tab": [
            {"title": "Tab", "index": 0, "x": 0, "y": 0, "width": 1, "height": 1, "timestamp": 0.0},
            {"title": "Tab", "index": 0, "x": 0, "y": 0, "width": 1, "height": 1, "timestamp": 0.0}
        ]}"#;
        assert!(decode(dup).is_err());
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let text = r#"{"Tab": [{"title": "Tab", "index": 0, "x": 0}]}"#;
        assert!(decode(text).is_err());
    }

    #[test]
    fn encoded_document_uses_on_disk_names() {
        let mut groups = Layouts::new();
        groups.insert("Tab".into(), vec![rec("Tab", 0, 10, 20)]);
        let json = serde_json::to_string_pretty(&groups).unwrap();
        for key in ["\"title\"", "\"index\"", "\"timestamp\"", "\"width\""] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        assert!(json.contains("\n  \"Tab\""));
    }

    #[test]
    fn non_ascii_group_names_are_written_verbatim() {
        let mut groups = Layouts::new();
        groups.insert("Trò chơi".into(), vec![rec("Trò chơi", 0, 0, 0)]);
        let json = serde_json::to_string_pretty(&groups).unwrap();
        assert!(json.contains("Trò chơi"));
    }
}
