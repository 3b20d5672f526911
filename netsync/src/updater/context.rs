//! Per-pass state
//!
//! Everything an update pass learns or stages lives here and is dropped when
//! the pass ends: counters, provisional nets, the rename map, the dry-run
//! overlay, staged footprints and the pending commit.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::board::{Board, Footprint, NetInfo, Pad, UNCONNECTED};
use crate::commit::{BoardCommit, BoardItem};
use crate::connectivity::{ConnectivityIndex, FootprintHandle, PadRef};
use crate::report::{Reporter, Severity};

use super::UpdateOptions;

/// Shadow state written instead of the board during a dry run
#[derive(Debug, Clone, Default)]
pub struct DryRunOverlay {
    pad_nets: HashMap<PadRef, String>,
    pad_pins: HashMap<PadRef, (String, String)>,
    zone_nets: HashMap<usize, String>,
}

impl DryRunOverlay {
    pub fn set_pad_net(&mut self, pad: PadRef, net_name: impl Into<String>) {
        self.pad_nets.insert(pad, net_name.into());
    }

    pub fn pad_net(&self, pad: &PadRef) -> Option<&str> {
        self.pad_nets.get(pad).map(String::as_str)
    }

    pub fn set_pin_data(&mut self, pad: PadRef, pin_function: String, pin_type: String) {
        self.pad_pins.insert(pad, (pin_function, pin_type));
    }

    /// Pin function and type
    pub fn pin_data(&self, pad: &PadRef) -> Option<(&str, &str)> {
        self.pad_pins
            .get(pad)
            .map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn set_zone_net(&mut self, zone: usize, net_name: impl Into<String>) {
        self.zone_nets.insert(zone, net_name.into());
    }

    pub fn zone_net(&self, zone: usize) -> Option<&str> {
        self.zone_nets.get(&zone).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.pad_nets.clear();
        self.pad_pins.clear();
        self.zone_nets.clear();
    }
}

/// Footprint loaded from the library during the pass
#[derive(Debug, Clone)]
pub struct StagedFootprint {
    pub footprint: Footprint,
    /// Board index of the footprint this one replaces
    pub replaces: Option<usize>,
}

pub struct PassContext<'r> {
    pub options: UpdateOptions,
    reporter: &'r mut dyn Reporter,

    pub warnings: usize,
    pub errors: usize,
    pub new_footprints: usize,
    pub actions: usize,

    added_nets: Vec<NetInfo>,
    next_net_code: u32,
    /// Old net name to new net name, last write wins
    pub renames: HashMap<String, String>,
    pub overlay: DryRunOverlay,
    live: HashSet<String>,

    staged: Vec<StagedFootprint>,
    replaced: HashMap<usize, usize>,
    /// Board footprints the sweep deletes
    pub removed: BTreeSet<usize>,
    /// Footprint resolved for each netlist component (by component index)
    pub resolved: BTreeMap<usize, FootprintHandle>,
    /// Pads each copper zone reached before the pass changed anything
    pub zone_pads: HashMap<usize, Vec<PadRef>>,
    pub commit: BoardCommit,
}

impl<'r> PassContext<'r> {
    pub fn new(options: UpdateOptions, reporter: &'r mut dyn Reporter, board: &Board) -> Self {
        Self {
            options,
            reporter,
            warnings: 0,
            errors: 0,
            new_footprints: 0,
            actions: 0,
            added_nets: Vec::new(),
            next_net_code: board.nets.next_code(),
            renames: HashMap::new(),
            overlay: DryRunOverlay::default(),
            live: HashSet::new(),
            staged: Vec::new(),
            replaced: HashMap::new(),
            removed: BTreeSet::new(),
            resolved: BTreeMap::new(),
            zone_pads: HashMap::new(),
            commit: BoardCommit::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    // Reporting

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.reporter.report(message.as_ref(), Severity::Info);
    }

    pub fn action(&mut self, message: impl AsRef<str>) {
        self.actions += 1;
        self.reporter.report(message.as_ref(), Severity::Action);
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.warnings += 1;
        self.reporter.report(message.as_ref(), Severity::Warning);
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.errors += 1;
        self.reporter.report(message.as_ref(), Severity::Error);
    }

    pub fn report_tail(&mut self, message: &str, severity: Severity) {
        self.reporter.report_tail(message, severity);
    }

    // Footprints

    /// Stage a footprint loaded during the pass.
    pub fn stage(&mut self, footprint: Footprint, replaces: Option<usize>) -> FootprintHandle {
        let index = self.staged.len();
        self.staged.push(StagedFootprint { footprint, replaces });
        if let Some(board_index) = replaces {
            self.replaced.insert(board_index, index);
        }
        FootprintHandle::Staged(index)
    }

    pub fn staged(&self) -> &[StagedFootprint] {
        &self.staged
    }

    pub fn is_staged(&self, handle: FootprintHandle) -> bool {
        matches!(handle, FootprintHandle::Staged(_))
    }

    /// Handle of whatever currently stands for a board footprint: its staged
    /// replacement if it has one.
    pub fn current_handle(&self, board_index: usize) -> FootprintHandle {
        match self.replaced.get(&board_index) {
            Some(&staged) => FootprintHandle::Staged(staged),
            None => FootprintHandle::Board(board_index),
        }
    }

    pub fn footprint<'a>(&'a self, board: &'a Board, handle: FootprintHandle) -> Option<&'a Footprint> {
        match handle {
            FootprintHandle::Board(i) => board.footprints.get(i),
            FootprintHandle::Staged(i) => self.staged.get(i).map(|s| &s.footprint),
        }
    }

    pub fn footprint_mut<'a>(
        &'a mut self,
        board: &'a mut Board,
        handle: FootprintHandle,
    ) -> Option<&'a mut Footprint> {
        match handle {
            FootprintHandle::Board(i) => board.footprints.get_mut(i),
            FootprintHandle::Staged(i) => self.staged.get_mut(i).map(|s| &mut s.footprint),
        }
    }

    pub fn replace_staged(&mut self, index: usize, footprint: Footprint) {
        if let Some(slot) = self.staged.get_mut(index) {
            slot.footprint = footprint;
        }
    }

    /// Footprints as the board will hold them once the pass is committed:
    /// board footprints not being removed with replacements substituted,
    /// then the new footprints.
    pub fn view<'a>(&'a self, board: &'a Board) -> Vec<(FootprintHandle, &'a Footprint)> {
        let mut view = Vec::with_capacity(board.footprints.len() + self.staged.len());
        for (i, fp) in board.footprints.iter().enumerate() {
            if self.removed.contains(&i) {
                continue;
            }
            match self.replaced.get(&i) {
                Some(&s) => view.push((FootprintHandle::Staged(s), &self.staged[s].footprint)),
                None => view.push((FootprintHandle::Board(i), fp)),
            }
        }
        for (s, staged) in self.staged.iter().enumerate() {
            if staged.replaces.is_none() {
                view.push((FootprintHandle::Staged(s), &staged.footprint));
            }
        }
        view
    }

    /// Every pad of the view, in view order
    pub fn view_pads(&self, board: &Board) -> Vec<PadRef> {
        self.view(board)
            .into_iter()
            .flat_map(|(handle, fp)| (0..fp.pads.len()).map(move |i| PadRef::new(handle, i)))
            .collect()
    }

    /// Follow a pad of a replaced board footprint to the same-named pad of
    /// its replacement.
    pub fn current_pad(&self, board: &Board, pad: PadRef) -> Option<PadRef> {
        let FootprintHandle::Board(i) = pad.footprint else {
            return Some(pad);
        };
        let Some(&s) = self.replaced.get(&i) else {
            return Some(pad);
        };
        let name = &board.footprints.get(i)?.pads.get(pad.pad)?.name;
        self.staged[s]
            .footprint
            .pads
            .iter()
            .position(|p| &p.name == name)
            .map(|j| PadRef::new(FootprintHandle::Staged(s), j))
    }

    /// Cache the pads every copper zone reaches, before anything changes.
    pub fn cache_zone_connections(&mut self, board: &Board) {
        let index = ConnectivityIndex::from_board(board);
        for (zi, zone) in board.zones.iter().enumerate() {
            if zone.is_copper_fill() {
                self.zone_pads.insert(zi, index.connected_pads(zi));
            }
        }
    }

    // Nets

    /// Name of a net code: board table first, then provisional nets.
    pub fn net_name(&self, board: &Board, code: u32) -> String {
        if code == UNCONNECTED {
            return String::new();
        }
        if let Some(net) = board.nets.by_code(code) {
            return net.name.clone();
        }
        self.added_nets
            .iter()
            .find(|n| n.code == code)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    /// Code of a net name: board table first, then provisional nets.
    pub fn find_net_code(&self, board: &Board, name: &str) -> Option<u32> {
        board
            .nets
            .find(name)
            .or_else(|| self.added_nets.iter().find(|n| n.name == name))
            .map(|n| n.code)
    }

    /// Register a provisional net and return its code.
    pub fn add_net(&mut self, name: &str) -> u32 {
        let code = self.next_net_code;
        self.next_net_code += 1;
        self.added_nets.push(NetInfo::new(code, name));
        code
    }

    pub fn added_nets(&self) -> &[NetInfo] {
        &self.added_nets
    }

    /// Drop every provisional net (end of a dry run).
    pub fn discard_provisional(&mut self) {
        self.added_nets.clear();
        self.overlay.clear();
        self.staged.clear();
        self.replaced.clear();
    }

    /// Net name of a pad, as the pass currently sees it.
    pub fn pad_net_name(&self, board: &Board, pad: PadRef) -> String {
        if self.is_dry_run() {
            if let Some(name) = self.overlay.pad_net(&pad) {
                return name.to_string();
            }
        }
        self.footprint(board, pad.footprint)
            .and_then(|fp| fp.pads.get(pad.pad))
            .map(|p| self.net_name(board, p.net))
            .unwrap_or_default()
    }

    /// Same as [`pad_net_name`](Self::pad_net_name) for a working copy of the pad.
    pub fn resolve_pad_net(&self, board: &Board, pad_ref: PadRef, pad: &Pad) -> String {
        if self.is_dry_run() {
            if let Some(name) = self.overlay.pad_net(&pad_ref) {
                return name.to_string();
            }
        }
        self.net_name(board, pad.net)
    }

    pub fn zone_net_name(&self, board: &Board, zone: usize) -> String {
        if self.is_dry_run() {
            if let Some(name) = self.overlay.zone_net(zone) {
                return name.to_string();
            }
        }
        board
            .zones
            .get(zone)
            .map(|z| self.net_name(board, z.net))
            .unwrap_or_default()
    }

    // Liveness

    /// Start of a full pass: every net except the sentinel is stale.
    pub fn mark_all_stale(&mut self, board: &mut Board) {
        for net in board.nets.iter_mut() {
            net.is_current = net.is_unconnected();
        }
    }

    pub fn mark_current(&mut self, board: &mut Board, name: &str) {
        if name.is_empty() {
            return;
        }
        self.live.insert(name.to_string());
        if !self.is_dry_run() {
            self.set_current_flag(board, name, true);
        }
    }

    pub fn mark_stale(&mut self, board: &mut Board, name: &str) {
        self.live.remove(name);
        if !self.is_dry_run() {
            self.set_current_flag(board, name, false);
        }
    }

    fn set_current_flag(&mut self, board: &mut Board, name: &str, current: bool) {
        if let Some(net) = board.nets.find_mut(name) {
            net.is_current = current;
        } else if let Some(net) = self.added_nets.iter_mut().find(|n| n.name == name) {
            net.is_current = current;
        }
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.live.contains(name)
    }

    // Commit

    /// Register the before-snapshot of a board footprint unless the
    /// footprint was staged this pass.
    pub fn snapshot_footprint(&mut self, handle: FootprintHandle, before: Footprint) {
        if !self.is_staged(handle) {
            self.commit.modify(BoardItem::Footprint(before));
        }
    }

    /// Move staged footprints and live provisional nets into the commit and
    /// hand it out.
    pub fn take_commit(&mut self, board: &Board) -> BoardCommit {
        for net in std::mem::take(&mut self.added_nets) {
            if net.is_current && self.live.contains(&net.name) {
                self.commit.add(BoardItem::Net(net));
            }
        }
        for staged in std::mem::take(&mut self.staged) {
            let old = staged.replaces.and_then(|i| board.footprints.get(i));
            match old {
                Some(old) => self.commit.replace(old.clone(), staged.footprint),
                None => self.commit.add(BoardItem::Footprint(staged.footprint)),
            }
        }
        self.replaced.clear();
        std::mem::take(&mut self.commit)
    }
}
