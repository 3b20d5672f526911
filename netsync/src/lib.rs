//! NetSync - netlist-to-board synchronization for KiCad PCB documents
//!
//! Brings a board (footprints, pads, nets, zones, vias) in line with the
//! netlist exported from its schematic: adds and replaces footprints,
//! updates their fields, reassigns pad nets, repairs zones and vias on
//! renamed nets, prunes single-pad nets and removes what is no longer used.
//! A dry run reports the same decisions without touching the board.
//!
//! # Quick Start
//!
//! ```no_run
//! use netsync::{NetSyncCore, UpdateOptions};
//! use std::path::Path;
//!
//! let options = UpdateOptions::default().dry_run(true);
//! let (_board, result) = NetSyncCore::update_files(
//!     Path::new("design.kicad_pcb"),
//!     Path::new("design.net"),
//!     Some(Path::new("footprints")),
//!     options,
//! ).unwrap();
//!
//! for message in &result.messages {
//!     println!("{}", message);
//! }
//! ```
//!
//! # Features
//!
//! - **Matching**: by reference designator or by symbol path
//! - **Footprints**: added from a library, swapped when the assignment changes
//! - **Nets**: pad nets reassigned, renames followed by zones and vias
//! - **Commit**: one change set per pass, pushed to an undo history

pub mod board;
pub mod commit;
pub mod connectivity;
pub mod core;
pub mod library;
pub mod netlist;
pub mod parser;
pub mod report;
pub mod updater;

// Re-export main types
pub use board::{Board, Footprint, FootprintId, NetInfo, Pad, UNCONNECTED};
pub use commit::{BoardCommit, BoardItem, ChangeKind, CommitRecord, CommitSink, UndoHistory};
pub use crate::core::{
    discover_project_files, find_project, NetSyncCore, NetSyncError, ProjectFiles, UpdateResult,
};
pub use library::{DirectoryLibrary, FootprintLibrary, InMemoryLibrary};
pub use netlist::{Component, ComponentNet, Netlist};
pub use parser::{NetlistParser, PcbParser};
pub use report::{MessageLog, ReportMessage, Reporter, Severity};
pub use updater::{BoardNetlistUpdater, UpdateOptions, UpdateStats};

/// Parse a netlist file (convenience wrapper).
pub fn parse_netlist(path: &std::path::Path) -> Result<Netlist, NetSyncError> {
    NetlistParser::parse_netlist(path).map_err(|e| NetSyncError::Parse(e.to_string()))
}

/// Parse a board file (convenience wrapper).
pub fn parse_board(path: &std::path::Path) -> Result<Board, NetSyncError> {
    PcbParser::parse_pcb(path).map_err(|e| NetSyncError::Parse(e.to_string()))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Board, BoardNetlistUpdater, Component, FootprintLibrary, MessageLog, NetSyncCore,
        NetSyncError, Netlist, Severity, UndoHistory, UpdateOptions, UpdateStats,
    };
}
