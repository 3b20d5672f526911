//! Unused footprint sweep and net garbage collection

use std::collections::HashSet;

use crate::board::{Board, NetInfo, UNCONNECTED};
use crate::commit::BoardItem;
use crate::connectivity::{FootprintHandle, PadRef};
use crate::netlist::{Component, Netlist};

use super::context::PassContext;

/// Delete board footprints with no component (when enabled) and mark the
/// nets of everything that stays as current.
pub fn delete_unused_footprints(ctx: &mut PassContext<'_>, board: &mut Board, netlist: &Netlist) {
    for i in 0..board.footprints.len() {
        let fp = &board.footprints[i];
        let mut delete = ctx.options.delete_unused_components && !fp.is_board_only();

        if delete {
            let component = if ctx.options.lookup_by_timestamp {
                netlist.component_by_path(&fp.path)
            } else {
                netlist.component_by_reference(&fp.reference)
            };
            if component.map(|c: &Component| !c.is_excluded_from_board()).unwrap_or(false) {
                delete = false;
            }
        }

        if delete && fp.locked {
            let message = format!("Cannot remove unused footprint {} (locked).", fp.reference);
            ctx.warning(message);
            delete = false;
        }

        if delete {
            let fp = board.footprints[i].clone();
            ctx.action(format!("Remove unused footprint {}.", fp.reference));
            ctx.removed.insert(i);
            if !ctx.is_dry_run() {
                ctx.commit.remove(BoardItem::Footprint(fp));
            }
            continue;
        }

        let pads = handle_pads(ctx, board, ctx.current_handle(i));
        mark_pad_nets_current(ctx, board, pads);
    }

    // New footprints stay as well
    let added: Vec<PadRef> = ctx
        .staged()
        .iter()
        .enumerate()
        .filter(|(_, staged)| staged.replaces.is_none())
        .flat_map(|(s, staged)| {
            (0..staged.footprint.pads.len())
                .map(move |p| PadRef::new(FootprintHandle::Staged(s), p))
        })
        .collect();
    mark_pad_nets_current(ctx, board, added);

    for zi in 0..board.zones.len() {
        if board.zones[zi].is_copper_fill() {
            let name = ctx.zone_net_name(board, zi);
            ctx.mark_current(board, &name);
        }
    }
}

fn handle_pads(ctx: &PassContext<'_>, board: &Board, handle: FootprintHandle) -> Vec<PadRef> {
    let count = ctx.footprint(board, handle).map(|fp| fp.pads.len()).unwrap_or(0);
    (0..count).map(|p| PadRef::new(handle, p)).collect()
}

fn mark_pad_nets_current(ctx: &mut PassContext<'_>, board: &mut Board, pads: Vec<PadRef>) {
    for pad in pads {
        let name = ctx.pad_net_name(board, pad);
        ctx.mark_current(board, &name);
    }
}

/// Report every net nothing uses any more. A full pass also schedules the
/// removals and moves vias and rule areas left on removed nets to the
/// unconnected net.
pub fn remove_unused_nets(ctx: &mut PassContext<'_>, board: &mut Board) {
    let stale: Vec<NetInfo> = board
        .nets
        .iter()
        .filter(|n| !n.is_unconnected() && !ctx.is_live(&n.name))
        .cloned()
        .collect();

    for net in &stale {
        ctx.action(format!("Remove unused net \"{}\".", net.name));
    }

    if ctx.is_dry_run() {
        return;
    }

    let mut removed: HashSet<u32> = stale.iter().map(|n| n.code).collect();
    removed.extend(
        ctx.added_nets()
            .iter()
            .filter(|n| !ctx.is_live(&n.name))
            .map(|n| n.code),
    );

    for net in stale {
        ctx.commit.remove(BoardItem::Net(net));
    }

    for via in board.vias.iter_mut() {
        if removed.contains(&via.net) {
            ctx.commit.modify(BoardItem::Via(via.clone()));
            via.net = UNCONNECTED;
        }
    }
    for zone in board.zones.iter_mut() {
        if removed.contains(&zone.net) {
            ctx.commit.modify(BoardItem::Zone(zone.clone()));
            zone.net = UNCONNECTED;
        }
    }
}
