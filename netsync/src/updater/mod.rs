//! Board Netlist Updater
//!
//! Brings a board in line with a netlist in one pass:
//!
//! ```text
//! snapshot zone connectivity -> mark nets stale
//!   -> for each component: match / add / replace footprint, update fields and pads
//!   -> repair zones and vias on renamed nets
//!   -> sweep unused footprints
//!   -> full:    rebuild connectivity, verify pads, prune single-pad nets,
//!               collect unused nets, commit
//!   -> dry run: verify pads, prune single-pad nets (no new footprints only),
//!               report unused nets, discard provisional state
//! ```
//!
//! A dry run makes the same decisions and reports the same messages as a
//! full pass on the same board, but writes pad and zone changes to a
//! pass-scoped overlay instead of the board.

pub mod context;
pub mod footprints;
pub mod matcher;
pub mod options;
pub mod pads;
pub mod parameters;
pub mod prune;
pub mod sweep;
pub mod verify;
pub mod zones;

pub use context::{DryRunOverlay, PassContext, StagedFootprint};
pub use footprints::{estimate_insertion_position, exchange_footprint};
pub use options::UpdateOptions;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::commit::CommitSink;
use crate::connectivity::ConnectivityIndex;
use crate::library::FootprintLibrary;
use crate::netlist::Netlist;
use crate::report::{Reporter, Severity};

/// Description pushed with every commit
pub const COMMIT_DESCRIPTION: &str = "Update netlist";

/// Counters of one pass
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateStats {
    pub warnings: usize,
    pub errors: usize,
    pub new_footprints: usize,
    pub actions: usize,
}

impl UpdateStats {
    pub fn is_clean(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }
}

pub struct BoardNetlistUpdater<'a> {
    board: &'a mut Board,
    library: &'a dyn FootprintLibrary,
    options: UpdateOptions,
}

impl<'a> BoardNetlistUpdater<'a> {
    pub fn new(board: &'a mut Board, library: &'a dyn FootprintLibrary) -> Self {
        Self {
            board,
            library,
            options: UpdateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &UpdateOptions {
        &self.options
    }

    pub fn board(&self) -> &Board {
        self.board
    }

    /// Run one update pass. Reconciliation problems are reported and
    /// counted, never returned; the pass always runs to the end.
    pub fn update_netlist(
        &mut self,
        netlist: &Netlist,
        reporter: &mut dyn Reporter,
        sink: &mut dyn CommitSink,
    ) -> UpdateStats {
        let board = &mut *self.board;
        let library = self.library;
        let dry_run = self.options.dry_run;
        let mut ctx = PassContext::new(self.options.clone(), reporter, board);

        tracing::debug!(
            "Updating board from netlist ({} components, dry run: {})",
            netlist.len(),
            dry_run
        );

        ctx.cache_zone_connections(board);

        if !dry_run {
            ctx.mark_all_stale(board);
        }

        for (index, component) in netlist.components.iter().enumerate() {
            matcher::process_component(&mut ctx, board, library, index, component);
        }

        zones::update_copper_zone_nets(&mut ctx, board, netlist);
        sweep::delete_unused_footprints(&mut ctx, board, netlist);

        if !dry_run {
            let index = ConnectivityIndex::build(ctx.view(board), &board.zones, &board.vias);
            tracing::debug!("Rebuilt connectivity: {:?}", index.stats());

            verify::verify_footprint_pads(&mut ctx, board, netlist);

            if ctx.options.delete_single_pad_nets {
                prune::delete_single_pad_nets(&mut ctx, board, index.pads());
            }

            sweep::remove_unused_nets(&mut ctx, board);

            let commit = ctx.take_commit(board);
            tracing::debug!("Pushing {} changes", commit.len());
            sink.push(board, commit, COMMIT_DESCRIPTION);
        } else {
            verify::verify_footprint_pads(&mut ctx, board, netlist);

            // Staged footprints are not part of the board's pad list yet,
            // which would throw off the run lengths
            if ctx.options.delete_single_pad_nets && ctx.new_footprints == 0 {
                let pads = ctx.view_pads(board);
                prune::delete_single_pad_nets(&mut ctx, board, &pads);
            }

            sweep::remove_unused_nets(&mut ctx, board);
            ctx.discard_provisional();
        }

        let stats = UpdateStats {
            warnings: ctx.warnings,
            errors: ctx.errors,
            new_footprints: ctx.new_footprints,
            actions: ctx.actions,
        };

        ctx.report_tail(
            &format!(
                "Total warnings: {}, errors: {}.",
                stats.warnings, stats.errors
            ),
            Severity::Info,
        );

        tracing::info!(
            "Netlist update finished: {} actions, {} warnings, {} errors",
            stats.actions,
            stats.warnings,
            stats.errors
        );
        stats
    }
}
