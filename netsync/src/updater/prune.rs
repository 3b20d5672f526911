//! Single-pad net pruning
//!
//! A net that reaches exactly one pad and no copper zone connects nothing,
//! so the pad is disconnected.

use crate::board::{Board, UNCONNECTED};
use crate::connectivity::{FootprintHandle, PadRef};

use super::context::PassContext;

/// Scan `pads` grouped by net name and clear every net with a single pad.
pub fn delete_single_pad_nets(ctx: &mut PassContext<'_>, board: &mut Board, pads: &[PadRef]) {
    let mut named: Vec<(String, PadRef)> = pads
        .iter()
        .map(|pad| (ctx.pad_net_name(board, *pad), *pad))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    // Stable, so pads of one net keep their board order
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let mut start = 0;
    while start < named.len() {
        let mut end = start + 1;
        while end < named.len() && named[end].0 == named[start].0 {
            end += 1;
        }
        if end - start == 1 {
            let (name, pad) = named[start].clone();
            clear_if_single(ctx, board, &name, pad);
        }
        start = end;
    }
}

fn clear_if_single(ctx: &mut PassContext<'_>, board: &mut Board, net_name: &str, pad: PadRef) {
    let has_zone = (0..board.zones.len())
        .any(|zi| board.zones[zi].is_copper_fill() && ctx.zone_net_name(board, zi) == net_name);
    if has_zone {
        return;
    }

    ctx.action(format!("Remove single pad net {}.", net_name));

    if ctx.is_dry_run() {
        ctx.overlay.set_pad_net(pad, "");
    } else {
        if let FootprintHandle::Board(i) = pad.footprint {
            if let Some(before) = board.footprints.get(i).cloned() {
                ctx.snapshot_footprint(pad.footprint, before);
            }
        }
        if let Some(target) = ctx
            .footprint_mut(board, pad.footprint)
            .and_then(|fp| fp.pads.get_mut(pad.pad))
        {
            target.net = UNCONNECTED;
        }
    }

    // Nothing else references the net now
    ctx.mark_stale(board, net_name);
}
