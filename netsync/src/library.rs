//! Footprint libraries
//!
//! The updater asks a [`FootprintLibrary`] for a fresh footprint instance
//! whenever it adds or replaces a footprint. Returning `None` means the
//! footprint type is unknown; the updater reports it and moves on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::board::{Footprint, FootprintId};
use crate::parser::pcb::PcbParser;

/// Source of footprint definitions
pub trait FootprintLibrary {
    /// Load a new instance of a footprint type. Every call returns a
    /// distinct instance with its own uuid.
    fn load_footprint(&self, fpid: &FootprintId) -> Option<Footprint>;
}

/// Footprints registered in memory, keyed by id
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibrary {
    footprints: HashMap<FootprintId, Footprint>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, footprint: Footprint) {
        self.footprints.insert(footprint.fpid.clone(), footprint);
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.add(footprint);
        self
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}

impl FootprintLibrary for InMemoryLibrary {
    fn load_footprint(&self, fpid: &FootprintId) -> Option<Footprint> {
        let mut fp = self.footprints.get(fpid)?.clone();
        fp.uuid = uuid::Uuid::new_v4().to_string();
        Some(fp)
    }
}

/// KiCad library directory: `<root>/<library>.pretty/<name>.kicad_mod`
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn footprint_path(&self, fpid: &FootprintId) -> Option<PathBuf> {
        let file = format!("{}.kicad_mod", fpid.name);
        if !fpid.library.is_empty() {
            let path = self.root.join(format!("{}.pretty", fpid.library)).join(&file);
            return path.is_file().then_some(path);
        }

        // Bare name: first library that has it
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir() && p.extension().map(|e| e == "pretty").unwrap_or(false))
            .collect();
        dirs.sort();
        dirs.into_iter().map(|d| d.join(&file)).find(|p| p.is_file())
    }
}

impl FootprintLibrary for DirectoryLibrary {
    fn load_footprint(&self, fpid: &FootprintId) -> Option<Footprint> {
        if fpid.is_empty() {
            return None;
        }
        let path = self.footprint_path(fpid)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };
        match PcbParser::parse_footprint_str(&content) {
            Ok(mut fp) => {
                // The file only knows the bare name
                fp.fpid = fpid.clone();
                fp.uuid = uuid::Uuid::new_v4().to_string();
                tracing::debug!("Loaded footprint {} from {:?}", fpid, path.file_name());
                Some(fp)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}", path.file_name(), e);
                None
            }
        }
    }
}
