//! Selection store: the user's backlog of chosen games
//!
//! Ordered by insertion, unique by `id`. Every effective mutation writes the
//! full list to the [`StorageSlot`]. A failed write keeps the in-memory change
//! and returns the error to the caller; the next successful write catches the
//! slot up.

use agrd_common::{GameSummary, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::storage::StorageSlot;

/// Backlog mirrored to one storage slot
#[derive(Debug)]
pub struct SelectionStore {
    slot: StorageSlot,
    items: Vec<GameSummary>,
}

impl SelectionStore {
    /// Hydrate from `slot`
    ///
    /// A missing, unreadable or malformed slot yields an empty backlog and a
    /// warning. Duplicate ids keep the first occurrence.
    pub fn open(slot: StorageSlot) -> Self {
        let items = match slot.read() {
            Ok(Some(content)) => match parse_snapshot(&content) {
                Ok(items) => {
                    info!(count = items.len(), path = %slot.path().display(), "Backlog loaded");
                    items
                }
                Err(e) => {
                    warn!(path = %slot.path().display(), error = %e, "Ignoring malformed backlog");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(path = %slot.path().display(), "No stored backlog yet");
                Vec::new()
            }
            Err(e) => {
                warn!(path = %slot.path().display(), error = %e, "Backlog unreadable, starting empty");
                Vec::new()
            }
        };

        Self { slot, items }
    }

    /// Append `item` unless its id is already present
    ///
    /// Returns whether the backlog changed.
    pub fn add(&mut self, item: GameSummary) -> Result<bool> {
        if self.contains(item.id) {
            return Ok(false);
        }
        debug!(id = item.id, name = %item.name, "Adding to backlog");
        self.items.push(item);
        self.persist()?;
        Ok(true)
    }

    /// Remove the item with `id`, if any
    ///
    /// Returns whether the backlog changed.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|g| g.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        debug!(id, "Removed from backlog");
        self.persist()?;
        Ok(true)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.items.iter().any(|g| g.id == id)
    }

    /// Items in insertion order
    pub fn all(&self) -> &[GameSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.items).map_err(std::io::Error::from)?;
        self.slot.write(&snapshot).map_err(|e| {
            warn!(path = %self.slot.path().display(), error = %e, "Backlog write failed");
            e
        })
    }
}

/// Decode a stored snapshot, dropping repeated ids
///
/// The document must be an array of objects that each carry an integer `id`.
/// Display fields that fail to decode are dropped from that entry only.
fn parse_snapshot(content: &str) -> std::result::Result<Vec<GameSummary>, String> {
    let entries: Vec<Value> = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| format!("entry {} has no integer id", index))?;
        if !seen.insert(id) {
            continue;
        }
        let name = entry.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        let game = serde_json::from_value::<GameSummary>(entry).unwrap_or_else(|e| {
            debug!(id, error = %e, "Keeping backlog entry without its display fields");
            GameSummary::new(id, name)
        });
        items.push(game);
    }
    Ok(items)
}
