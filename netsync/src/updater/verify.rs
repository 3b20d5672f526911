use crate::board::Board;
use crate::netlist::Netlist;

use super::context::PassContext;

/// Every pin a component declares must exist as a pad on its footprint.
/// Missing pads mean the footprint is wrong for the symbol; an entry without
/// a pin name only passes when the footprint has an unnamed pad.
pub fn verify_footprint_pads(ctx: &mut PassContext<'_>, board: &Board, netlist: &Netlist) {
    let mut missing = Vec::new();

    for (&index, &handle) in &ctx.resolved {
        let (Some(component), Some(fp)) = (netlist.components.get(index), ctx.footprint(board, handle))
        else {
            continue;
        };
        for net in &component.nets {
            if fp.find_pad_by_name(&net.pin_name).is_none() {
                missing.push(format!(
                    "{} pad {} not found in {}.",
                    component.reference, net.pin_name, fp.fpid
                ));
            }
        }
    }

    for message in missing {
        ctx.error(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, FootprintId, Pad};
    use crate::connectivity::FootprintHandle;
    use crate::netlist::Component;
    use crate::report::MessageLog;
    use crate::updater::UpdateOptions;

    #[test]
    fn test_missing_pad_is_an_error() {
        let mut board = Board::new();
        board.footprints.push(
            Footprint::new("R1", FootprintId::parse("R:R_0603")).with_pad(Pad::new("1", &["F.Cu"])),
        );
        let mut netlist = Netlist::new();
        netlist.add_component(
            Component::new("R1", FootprintId::parse("R:R_0603"))
                .with_net("1", "A")
                .with_net("3", "B"),
        );

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.resolved.insert(0, FootprintHandle::Board(0));
        verify_footprint_pads(&mut ctx, &board, &netlist);
        assert_eq!(ctx.errors, 1);
        drop(ctx);
        assert!(log.contains("R1 pad 3 not found in R:R_0603."));
    }

    #[test]
    fn test_unresolved_components_are_skipped() {
        let board = Board::new();
        let mut netlist = Netlist::new();
        netlist.add_component(Component::new("R1", FootprintId::default()).with_net("1", "A"));
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        verify_footprint_pads(&mut ctx, &board, &netlist);
        assert_eq!(ctx.errors, 0);
    }

    #[test]
    fn test_unnamed_pin_needs_unnamed_pad() {
        let mut board = Board::new();
        board.footprints.push(
            Footprint::new("J1", FootprintId::parse("C:Conn")).with_pad(Pad::new("1", &["F.Cu"])),
        );
        let mut netlist = Netlist::new();
        netlist.add_component(
            Component::new("J1", FootprintId::parse("C:Conn"))
                .with_net("1", "A")
                .with_net("", "SHIELD"),
        );

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.resolved.insert(0, FootprintHandle::Board(0));
        verify_footprint_pads(&mut ctx, &board, &netlist);
        assert_eq!(ctx.errors, 1);
        drop(ctx);
        assert!(log.contains("J1 pad  not found in C:Conn."));

        board.footprints[0].pads.push(Pad::new("", &["F.Cu"]));
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        ctx.resolved.insert(0, FootprintHandle::Board(0));
        verify_footprint_pads(&mut ctx, &board, &netlist);
        assert_eq!(ctx.errors, 0);
    }
}
