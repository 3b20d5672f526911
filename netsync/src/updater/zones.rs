//! Zone and via repair after net renames
//!
//! Vias and copper zones whose net no longer appears in the netlist follow
//! the pads they were connected to (zones only) or the rename map built
//! during pad reconciliation.

use crate::board::{Board, UNCONNECTED};
use crate::commit::BoardItem;
use crate::netlist::Netlist;

use super::context::PassContext;

pub fn update_copper_zone_nets(ctx: &mut PassContext<'_>, board: &mut Board, netlist: &Netlist) {
    let netlist_nets = netlist.net_names();

    for vi in 0..board.vias.len() {
        if board.vias[vi].net == UNCONNECTED {
            continue;
        }
        let net_name = ctx.net_name(board, board.vias[vi].net);
        if netlist_nets.contains(&net_name) {
            continue;
        }

        // Stitching vias rarely touch a pad, so only the rename map can help
        match ctx.renames.get(&net_name).cloned() {
            Some(updated) => {
                ctx.action(format!("Reconnect via from {} to {}.", net_name, updated));
                if !ctx.is_dry_run() {
                    if let Some(code) = ctx.find_net_code(board, &updated) {
                        ctx.commit.modify(BoardItem::Via(board.vias[vi].clone()));
                        board.vias[vi].net = code;
                    }
                }
            }
            None => {
                ctx.warning(format!("Via connected to unknown net ({}).", net_name));
            }
        }
    }

    for zi in 0..board.zones.len() {
        if !board.zones[zi].is_copper_fill() || board.zones[zi].net == UNCONNECTED {
            continue;
        }
        let net_name = ctx.zone_net_name(board, zi);
        if netlist_nets.contains(&net_name) {
            continue;
        }

        // The first connected pad that moved to another net wins. It is not
        // always right, but the old net is certainly wrong.
        let mut updated = ctx
            .zone_pads
            .get(&zi)
            .into_iter()
            .flatten()
            .filter_map(|pad| ctx.current_pad(board, *pad))
            .map(|pad| ctx.pad_net_name(board, pad))
            .find(|name| *name != net_name)
            .filter(|name| !name.is_empty());

        if updated.is_none() {
            updated = ctx.renames.get(&net_name).cloned();
        }

        match updated {
            Some(updated) => {
                ctx.action(format!(
                    "Reconnect copper zone from {} to {}.",
                    net_name, updated
                ));
                if ctx.is_dry_run() {
                    ctx.overlay.set_zone_net(zi, updated);
                } else if let Some(code) = ctx.find_net_code(board, &updated) {
                    ctx.commit.modify(BoardItem::Zone(board.zones[zi].clone()));
                    board.zones[zi].net = code;
                }
            }
            None => {
                ctx.warning(format!("Copper zone ({}) has no pads connected.", net_name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, FootprintId, NetInfo, Pad, Position, Via, Zone};
    use crate::connectivity::{FootprintHandle, PadRef};
    use crate::netlist::Component;
    use crate::report::MessageLog;
    use crate::updater::UpdateOptions;

    fn board() -> Board {
        let mut board = Board::new();
        board.nets.add(NetInfo::new(1, "NET1"));
        board.nets.add(NetInfo::new(2, "NET2"));
        board.nets.add(NetInfo::new(3, "ORPHAN"));
        let mut pad = Pad::new("1", &["F.Cu"]);
        pad.net = 1;
        board
            .footprints
            .push(Footprint::new("R1", FootprintId::parse("R:R")).with_pad(pad));
        board.vias.push(Via::new(1, Position::new(0.0, 0.0)));
        board.vias.push(Via::new(3, Position::new(1.0, 0.0)));
        board.zones.push(Zone::new(1, &["F.Cu"]));
        board
    }

    fn netlist() -> Netlist {
        let mut netlist = Netlist::new();
        netlist.add_component(Component::new("R1", FootprintId::parse("R:R")).with_net("1", "NET2"));
        netlist
    }

    #[test]
    fn test_renamed_via_and_zone_follow() {
        let mut board = board();
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.cache_zone_connections(&board);
        ctx.renames.insert("NET1".to_string(), "NET2".to_string());
        board.footprints[0].pads[0].net = 2;

        update_copper_zone_nets(&mut ctx, &mut board, &netlist());
        assert_eq!(ctx.actions, 2);
        assert_eq!(ctx.warnings, 1);
        drop(ctx);

        assert_eq!(board.vias[0].net, 2);
        assert_eq!(board.vias[1].net, 3);
        assert_eq!(board.zones[0].net, 2);
        assert!(log.contains("Reconnect via from NET1 to NET2."));
        assert!(log.contains("Via connected to unknown net (ORPHAN)."));
        assert!(log.contains("Reconnect copper zone from NET1 to NET2."));
    }

    #[test]
    fn test_zone_follows_connected_pad_in_dry_run() {
        let mut board = board();
        board.vias.clear();
        let original = board.clone();
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default().dry_run(true), &mut log, &board);
        ctx.cache_zone_connections(&board);
        ctx.overlay
            .set_pad_net(PadRef::new(FootprintHandle::Board(0), 0), "NET2");

        update_copper_zone_nets(&mut ctx, &mut board, &netlist());
        assert_eq!(ctx.zone_net_name(&board, 0), "NET2");
        drop(ctx);
        assert_eq!(board, original);
    }

    #[test]
    fn test_zone_without_pads_warns() {
        let mut board = board();
        board.vias.clear();
        board.zones[0].net = 3;
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.cache_zone_connections(&board);
        update_copper_zone_nets(&mut ctx, &mut board, &netlist());
        assert_eq!(ctx.warnings, 1);
        drop(ctx);
        assert!(log.contains("Copper zone (ORPHAN) has no pads connected."));
    }

    #[test]
    fn test_rule_area_is_left_alone() {
        let mut board = board();
        board.vias.clear();
        board.zones[0].net = 3;
        board.zones[0].is_rule_area = true;
        let original = board.clone();

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.cache_zone_connections(&board);
        ctx.renames.insert("ORPHAN".to_string(), "NET2".to_string());
        update_copper_zone_nets(&mut ctx, &mut board, &netlist());
        assert_eq!(ctx.actions, 0);
        assert_eq!(ctx.warnings, 0);
        drop(ctx);

        assert_eq!(board, original);
        assert!(!log.contains("Reconnect copper zone"));
        assert!(!log.contains("has no pads connected"));
    }
}
