//! Pad net reconciliation
//!
//! Every pad of a footprint takes the net and pin data of the component
//! entry with the same pin name. Net names the board does not know yet are
//! registered as provisional nets. When a pad moves from one named net to
//! another, `old -> new` is recorded in the rename map for zone and via
//! repair.

use crate::board::{Board, UNCONNECTED};
use crate::connectivity::{FootprintHandle, PadRef};
use crate::netlist::Component;

use super::context::PassContext;

pub fn update_pad_connections(
    ctx: &mut PassContext<'_>,
    board: &mut Board,
    handle: FootprintHandle,
    component: &Component,
) {
    let Some(before) = ctx.footprint(board, handle).cloned() else {
        return;
    };
    let mut fp = before.clone();
    let mut changed = false;
    let reference = &component.reference;

    for (index, pad) in fp.pads.iter_mut().enumerate() {
        let pad_ref = PadRef::new(handle, index);
        let entry = component.net_for_pin(&pad.name);
        let current = ctx.resolve_pad_net(board, pad_ref, pad);

        let (mut pin_function, pin_type) = entry
            .map(|e| (e.pin_function.clone(), e.pin_type.clone()))
            .unwrap_or_default();

        let target = entry
            .map(|e| e.net_name.as_str())
            .filter(|name| !name.is_empty() && pad.is_on_copper_layer());

        match target {
            None => {
                if !current.is_empty() {
                    ctx.action(format!("Disconnect {} pin {}.", reference, pad.name));
                } else if ctx.options.warn_for_no_net_pads
                    && pad.is_on_copper_layer()
                    && !pad.name.is_empty()
                {
                    ctx.warning(format!("No net for symbol {} pin {}.", reference, pad.name));
                }

                // A pad without a net has no pin function
                pin_function.clear();

                if ctx.is_dry_run() {
                    ctx.overlay.set_pad_net(pad_ref, "");
                } else if pad.net != UNCONNECTED {
                    pad.net = UNCONNECTED;
                    changed = true;
                }
            }
            Some(net_name) => {
                if current != net_name {
                    let code = match ctx.find_net_code(board, net_name) {
                        Some(code) => code,
                        None => {
                            let code = ctx.add_net(net_name);
                            ctx.action(format!("Add net {}.", net_name));
                            code
                        }
                    };

                    if current.is_empty() {
                        ctx.action(format!(
                            "Connect {} pin {} to {}.",
                            reference, pad.name, net_name
                        ));
                    } else {
                        ctx.action(format!(
                            "Reconnect {} pin {} from {} to {}.",
                            reference, pad.name, current, net_name
                        ));
                        ctx.renames.insert(current.clone(), net_name.to_string());
                    }

                    if ctx.is_dry_run() {
                        ctx.overlay.set_pad_net(pad_ref, net_name);
                    } else {
                        pad.net = code;
                        changed = true;
                    }
                }
                ctx.mark_current(board, net_name);
            }
        }

        if ctx.is_dry_run() {
            ctx.overlay.set_pin_data(pad_ref, pin_function, pin_type);
        } else {
            if pad.pin_function != pin_function {
                pad.pin_function = pin_function;
                changed = true;
            }
            if pad.pin_type != pin_type {
                pad.pin_type = pin_type;
                changed = true;
            }
        }
    }

    if !changed {
        return;
    }

    if let Some(target) = ctx.footprint_mut(board, handle) {
        *target = fp;
    }
    ctx.snapshot_footprint(handle, before);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, FootprintId, NetInfo, Pad};
    use crate::commit::ChangeKind;
    use crate::report::{MessageLog, Severity};
    use crate::updater::UpdateOptions;

    fn board() -> Board {
        let mut board = Board::new();
        board.nets.add(NetInfo::new(1, "NET1"));
        board.nets.add(NetInfo::new(2, "GND"));
        let mut p1 = Pad::new("1", &["F.Cu"]);
        p1.net = 1;
        let mut p2 = Pad::new("2", &["F.Cu"]);
        p2.net = 2;
        let p3 = Pad::new("3", &["F.SilkS"]);
        board.footprints.push(
            Footprint::new("R1", FootprintId::parse("R:R"))
                .with_pad(p1)
                .with_pad(p2)
                .with_pad(p3),
        );
        board
    }

    fn actions(log: &MessageLog) -> Vec<String> {
        log.filtered(&[Severity::Action, Severity::Warning])
            .into_iter()
            .map(|m| m.message.clone())
            .collect()
    }

    #[test]
    fn test_reconnect_records_rename() {
        let mut board = board();
        let component = Component::new("R1", FootprintId::parse("R:R"))
            .with_net("1", "NET2")
            .with_net("2", "GND");
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        update_pad_connections(&mut ctx, &mut board, FootprintHandle::Board(0), &component);

        assert_eq!(ctx.renames.get("NET1").map(String::as_str), Some("NET2"));
        assert!(ctx.is_live("NET2"));
        assert!(ctx.is_live("GND"));
        assert_eq!(ctx.commit.count(ChangeKind::Modify), 1);
        let new_code = ctx.find_net_code(&board, "NET2").unwrap();
        drop(ctx);

        assert_eq!(board.footprints[0].pads[0].net, new_code);
        assert_eq!(
            actions(&log),
            vec!["Add net NET2.", "Reconnect R1 pin 1 from NET1 to NET2."]
        );
    }

    #[test]
    fn test_missing_entry_disconnects() {
        let mut board = board();
        let component = Component::new("R1", FootprintId::parse("R:R")).with_net("1", "NET1");
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        update_pad_connections(&mut ctx, &mut board, FootprintHandle::Board(0), &component);
        drop(ctx);

        assert_eq!(board.footprints[0].pads[1].net, UNCONNECTED);
        assert_eq!(actions(&log), vec!["Disconnect R1 pin 2."]);
    }

    #[test]
    fn test_warn_for_no_net_pads() {
        let mut board = board();
        board.footprints[0].pads[1].net = UNCONNECTED;
        let component = Component::new("R1", FootprintId::parse("R:R")).with_net("1", "NET1");
        let options = UpdateOptions {
            warn_for_no_net_pads: true,
            ..Default::default()
        };
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(options, &mut log, &board);
        update_pad_connections(&mut ctx, &mut board, FootprintHandle::Board(0), &component);
        assert_eq!(ctx.warnings, 1);
        drop(ctx);

        // The silkscreen pad is not copper and stays quiet
        assert_eq!(actions(&log), vec!["No net for symbol R1 pin 2."]);
    }

    #[test]
    fn test_dry_run_writes_overlay_only() {
        let mut board = board();
        let original = board.clone();
        let mut component = Component::new("R1", FootprintId::parse("R:R"))
            .with_net("1", "NET2")
            .with_net("2", "GND");
        component.nets[1].pin_function = "K".to_string();

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default().dry_run(true), &mut log, &board);
        update_pad_connections(&mut ctx, &mut board, FootprintHandle::Board(0), &component);

        let pad = PadRef::new(FootprintHandle::Board(0), 0);
        assert_eq!(ctx.pad_net_name(&board, pad), "NET2");
        assert_eq!(
            ctx.overlay.pin_data(&PadRef::new(FootprintHandle::Board(0), 1)),
            Some(("K", ""))
        );
        assert!(ctx.commit.is_empty());
        drop(ctx);
        assert_eq!(board, original);
    }

    #[test]
    fn test_unchanged_pads_are_quiet() {
        let mut board = board();
        let component = Component::new("R1", FootprintId::parse("R:R"))
            .with_net("1", "NET1")
            .with_net("2", "GND");
        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        update_pad_connections(&mut ctx, &mut board, FootprintHandle::Board(0), &component);
        assert_eq!(ctx.actions, 0);
        assert!(ctx.commit.is_empty());
    }
}
