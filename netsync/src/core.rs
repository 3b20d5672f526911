//! Core update logic shared by the CLI and library callers.
//! Loads documents, runs a pass and collects the results.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::board::Board;
use crate::commit::{CommitRecord, UndoHistory};
use crate::library::{DirectoryLibrary, FootprintLibrary, InMemoryLibrary};
use crate::netlist::Netlist;
use crate::parser::kicad_netlist::{NetlistParseError, NetlistParser};
use crate::parser::pcb::{PcbParseError, PcbParser};
use crate::report::{MessageLog, ReportMessage, Severity};
use crate::updater::{BoardNetlistUpdater, UpdateOptions, UpdateStats};

#[derive(Debug, thiserror::Error)]
pub enum NetSyncError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

impl From<PcbParseError> for NetSyncError {
    fn from(e: PcbParseError) -> Self {
        NetSyncError::Parse(e.to_string())
    }
}

impl From<NetlistParseError> for NetSyncError {
    fn from(e: NetlistParseError) -> Self {
        NetSyncError::Parse(e.to_string())
    }
}

/// Outcome of one update pass.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub board_file: PathBuf,
    pub netlist_file: PathBuf,
    pub dry_run: bool,
    pub messages: Vec<ReportMessage>,
    pub stats: UpdateStats,
    /// Change set of a full pass
    pub commit: Option<CommitRecord>,
}

impl UpdateResult {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.stats.errors > 0 || self.stats.warnings > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }
}

/// Board and netlist found in a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    pub board: PathBuf,
    pub netlist: PathBuf,
}

/// Recursively discover boards and netlists in a directory.
pub fn discover_project_files(dir: &Path) -> Result<Vec<PathBuf>, NetSyncError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), NetSyncError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            // Footprint libraries are directories too
            if name.starts_with('.') || name == "target" || name.ends_with(".pretty") {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() {
            if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
                match ext {
                    "kicad_pcb" | "net" => files.push(path),
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Pair the first board in `dir` with a netlist, preferring one with the
/// same file stem.
pub fn find_project(dir: &Path) -> Result<ProjectFiles, NetSyncError> {
    let files = discover_project_files(dir)?;
    let has_ext = |p: &PathBuf, ext: &str| p.extension().and_then(|s| s.to_str()) == Some(ext);

    let board = files
        .iter()
        .find(|p| has_ext(p, "kicad_pcb"))
        .cloned()
        .ok_or_else(|| NetSyncError::Other(format!("No .kicad_pcb file in {}", dir.display())))?;

    let netlists: Vec<&PathBuf> = files.iter().filter(|p| has_ext(p, "net")).collect();
    let netlist = netlists
        .iter()
        .find(|p| p.file_stem() == board.file_stem())
        .or_else(|| netlists.first())
        .map(|p| (*p).clone())
        .ok_or_else(|| NetSyncError::Other(format!("No .net file in {}", dir.display())))?;

    Ok(ProjectFiles { board, netlist })
}

/// Core update API used by the CLI.
pub struct NetSyncCore;

impl NetSyncCore {
    /// Load a board from `.kicad_pcb` or from its JSON form.
    pub fn load_board(path: &Path) -> Result<Board, NetSyncError> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            Some("kicad_pcb") => Ok(PcbParser::parse_pcb(path)?),
            _ => Err(NetSyncError::Other(format!(
                "Unsupported board file: {}",
                path.display()
            ))),
        }
    }

    pub fn load_netlist(path: &Path) -> Result<Netlist, NetSyncError> {
        Ok(NetlistParser::parse_netlist(path)?)
    }

    /// Footprint library rooted at `dir`, or an empty one.
    pub fn library(dir: Option<&Path>) -> Box<dyn FootprintLibrary> {
        match dir {
            Some(dir) => Box::new(DirectoryLibrary::new(dir)),
            None => Box::new(InMemoryLibrary::new()),
        }
    }

    /// Run one pass over an in-memory board.
    pub fn update(
        board: &mut Board,
        netlist: &Netlist,
        library: &dyn FootprintLibrary,
        options: UpdateOptions,
    ) -> (Vec<ReportMessage>, UpdateStats, Option<CommitRecord>) {
        let dry_run = options.dry_run;
        let mut log = MessageLog::new();
        let mut history = UndoHistory::new();
        let stats = BoardNetlistUpdater::new(board, library)
            .with_options(options)
            .update_netlist(netlist, &mut log, &mut history);

        let commit = if dry_run { None } else { history.last().cloned() };
        (log.into_messages(), stats, commit)
    }

    /// Load both documents, run a pass and return the updated board along
    /// with the result.
    pub fn update_files(
        board_path: &Path,
        netlist_path: &Path,
        library_dir: Option<&Path>,
        options: UpdateOptions,
    ) -> Result<(Board, UpdateResult), NetSyncError> {
        let mut board = Self::load_board(board_path)?;
        let netlist = Self::load_netlist(netlist_path)?;
        let library = Self::library(library_dir);
        let dry_run = options.dry_run;

        tracing::info!(
            "Updating {} from {}",
            board_path.display(),
            netlist_path.display()
        );
        let (messages, stats, commit) = Self::update(&mut board, &netlist, library.as_ref(), options);

        Ok((
            board,
            UpdateResult {
                board_file: board_path.to_path_buf(),
                netlist_file: netlist_path.to_path_buf(),
                dry_run,
                messages,
                stats,
                commit,
            },
        ))
    }

    pub fn save_board_json(board: &Board, path: &Path) -> Result<(), NetSyncError> {
        let json = serde_json::to_string_pretty(board)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
