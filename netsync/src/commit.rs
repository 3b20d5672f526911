//! Board change sets
//!
//! A [`BoardCommit`] collects the edits of one update pass as Add, Modify and
//! Remove intents over a closed set of board items. Modify entries hold the
//! before-snapshot of an item that was already edited in place; adds and
//! removes are deferred until the commit is pushed to a [`CommitSink`], which
//! applies every intent and records the change set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::board::{Board, Footprint, NetInfo, Via, Zone};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Remove,
}

/// Every kind of board item a pass can touch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "item")]
pub enum BoardItem {
    Footprint(Footprint),
    Net(NetInfo),
    Zone(Zone),
    Via(Via),
}

impl BoardItem {
    /// Identity used to keep one snapshot per item
    pub fn key(&self) -> String {
        match self {
            BoardItem::Footprint(fp) => format!("footprint:{}", fp.uuid),
            BoardItem::Net(net) => format!("net:{}", net.code),
            BoardItem::Zone(zone) => format!("zone:{}", zone.uuid),
            BoardItem::Via(via) => format!("via:{}", via.uuid),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BoardItem::Footprint(fp) => format!("footprint {}", fp.reference),
            BoardItem::Net(net) => format!("net {}", net.name),
            BoardItem::Zone(_) => "zone".to_string(),
            BoardItem::Via(_) => "via".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub item: BoardItem,
    /// Uuid of the footprint an added footprint takes the place of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
}

/// Pending change set of one pass
#[derive(Debug, Clone, Default)]
pub struct BoardCommit {
    changes: Vec<Change>,
    snapshotted: HashSet<String>,
}

impl BoardCommit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: BoardItem) {
        self.changes.push(Change {
            kind: ChangeKind::Add,
            item,
            replaces: None,
        });
    }

    /// Swap `old` for `new` at the same position in the footprint list.
    pub fn replace(&mut self, old: Footprint, new: Footprint) {
        let old_uuid = old.uuid.clone();
        self.changes.push(Change {
            kind: ChangeKind::Add,
            item: BoardItem::Footprint(new),
            replaces: Some(old_uuid),
        });
        self.remove(BoardItem::Footprint(old));
    }

    pub fn remove(&mut self, item: BoardItem) {
        self.changes.push(Change {
            kind: ChangeKind::Remove,
            item,
            replaces: None,
        });
    }

    /// Register the before-snapshot of an item about to be edited in place.
    /// Only the first snapshot of an item is kept; returns whether this one was.
    pub fn modify(&mut self, before: BoardItem) -> bool {
        if !self.snapshotted.insert(before.key()) {
            return false;
        }
        self.changes.push(Change {
            kind: ChangeKind::Modify,
            item: before,
            replaces: None,
        });
        true
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Apply the deferred intents to the board. Modify entries were applied
    /// when they were registered.
    pub fn apply(&self, board: &mut Board) {
        for change in &self.changes {
            match (change.kind, &change.item) {
                (ChangeKind::Modify, _) => {}
                (ChangeKind::Add, BoardItem::Footprint(fp)) => {
                    let slot = change
                        .replaces
                        .as_deref()
                        .and_then(|uuid| board.find_footprint(uuid));
                    match slot {
                        Some(index) => board.footprints[index] = fp.clone(),
                        None => board.footprints.push(fp.clone()),
                    }
                }
                (ChangeKind::Remove, BoardItem::Footprint(fp)) => {
                    board.footprints.retain(|f| f.uuid != fp.uuid);
                }
                (ChangeKind::Add, BoardItem::Net(net)) => board.nets.add(net.clone()),
                (ChangeKind::Remove, BoardItem::Net(net)) => {
                    board.nets.remove(net.code);
                }
                (ChangeKind::Add, BoardItem::Zone(zone)) => board.zones.push(zone.clone()),
                (ChangeKind::Remove, BoardItem::Zone(zone)) => {
                    board.zones.retain(|z| z.uuid != zone.uuid);
                }
                (ChangeKind::Add, BoardItem::Via(via)) => board.vias.push(via.clone()),
                (ChangeKind::Remove, BoardItem::Via(via)) => {
                    board.vias.retain(|v| v.uuid != via.uuid);
                }
            }
        }
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

/// A pushed change set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<Change>,
}

impl CommitRecord {
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// Transactional sink that finalizes a pass
pub trait CommitSink {
    /// Apply every intent of `commit` to the board as one unit.
    fn push(&mut self, board: &mut Board, commit: BoardCommit, description: &str);
}

/// Applies commits and keeps them for undo
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    records: Vec<CommitRecord>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&CommitRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CommitSink for UndoHistory {
    fn push(&mut self, board: &mut Board, commit: BoardCommit, description: &str) {
        commit.apply(board);
        for change in commit.changes() {
            tracing::trace!("{:?} {}", change.kind, change.item.describe());
        }
        tracing::debug!("Committed '{}' with {} changes", description, commit.len());
        self.records.push(CommitRecord {
            description: description.to_string(),
            timestamp: Utc::now(),
            changes: commit.into_changes(),
        });
    }
}

/// Applies commits without recording them
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOnly;

impl CommitSink for ApplyOnly {
    fn push(&mut self, board: &mut Board, commit: BoardCommit, _description: &str) {
        commit.apply(board);
    }
}
