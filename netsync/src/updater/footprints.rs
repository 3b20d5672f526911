//! Adding and replacing footprints
//!
//! New footprints are loaded from the library and staged in the pass
//! context in both modes; a full pass attaches them when it commits.

use crate::board::{Board, Footprint, Position, UNCONNECTED};
use crate::connectivity::FootprintHandle;
use crate::library::FootprintLibrary;
use crate::netlist::Component;

use super::context::PassContext;

const INSERTION_MARGIN_MM: f64 = 10.0;

/// Where new footprints go: centered 10 mm below the board outline, at the
/// origin if the outline is degenerate, or at the page center when the
/// board is empty.
pub fn estimate_insertion_position(board: &Board) -> Position {
    if board.is_empty() {
        return board.page.center();
    }
    match board.edges_bounding_box() {
        Some(bbox) if bbox.width() > 0.0 || bbox.height() > 0.0 => {
            Position::new(bbox.center().x, bbox.bottom() + INSERTION_MARGIN_MM)
        }
        _ => Position::default(),
    }
}

/// Load the component's footprint and stage it as a new board footprint.
pub fn add_new_footprint(
    ctx: &mut PassContext<'_>,
    board: &Board,
    library: &dyn FootprintLibrary,
    component: &Component,
) -> Option<FootprintHandle> {
    if component.fpid.is_empty() {
        ctx.error(format!(
            "Cannot add {} (no footprint assigned).",
            component.reference
        ));
        return None;
    }

    let Some(mut footprint) = library.load_footprint(&component.fpid) else {
        ctx.error(format!(
            "Cannot add {} (footprint \"{}\" not found).",
            component.reference, component.fpid
        ));
        return None;
    };

    ctx.action(format!(
        "Add {} (footprint \"{}\").",
        component.reference, component.fpid
    ));

    footprint.fpid = component.fpid.clone();
    for pad in &mut footprint.pads {
        pad.local_ratsnest_visible = ctx.options.show_global_ratsnest;
        pad.locked = !ctx.options.add_unlocked_pads;
        // Library pads carry orphaned net codes
        pad.net = UNCONNECTED;
    }
    footprint.position = estimate_insertion_position(board);

    ctx.new_footprints += 1;
    tracing::debug!("Staged new footprint {} at {:?}", component.reference, footprint.position);
    Some(ctx.stage(footprint, None))
}

/// Swap the footprint at `handle` for the component's footprint type.
pub fn replace_footprint(
    ctx: &mut PassContext<'_>,
    board: &Board,
    library: &dyn FootprintLibrary,
    handle: FootprintHandle,
    component: &Component,
) -> Option<FootprintHandle> {
    if component.fpid.is_empty() {
        ctx.error(format!(
            "Cannot update {} (no footprint assigned).",
            component.reference
        ));
        return None;
    }

    let Some(mut replacement) = library.load_footprint(&component.fpid) else {
        ctx.error(format!(
            "Cannot update {} (footprint \"{}\" not found).",
            component.reference, component.fpid
        ));
        return None;
    };

    let existing = ctx.footprint(board, handle)?.clone();
    ctx.action(format!(
        "Change {} footprint from \"{}\" to \"{}\".",
        existing.reference, existing.fpid, component.fpid
    ));
    ctx.new_footprints += 1;

    replacement.fpid = component.fpid.clone();
    exchange_footprint(&existing, &mut replacement);

    match handle {
        FootprintHandle::Board(i) => Some(ctx.stage(replacement, Some(i))),
        FootprintHandle::Staged(i) => {
            ctx.replace_staged(i, replacement);
            Some(handle)
        }
    }
}

/// Carry placement, identity and pad connections of `existing` over to
/// `replacement`. Pads are paired by name; unpaired pads end up unconnected.
pub fn exchange_footprint(existing: &Footprint, replacement: &mut Footprint) {
    replacement.position = existing.position;
    replacement.rotation = existing.rotation;
    replacement.layer = existing.layer.clone();
    replacement.locked = existing.locked;
    replacement.reference = existing.reference.clone();
    replacement.value = existing.value.clone();
    replacement.path = existing.path.clone();
    replacement.properties = existing.properties.clone();

    for pad in &mut replacement.pads {
        match existing.find_pad_by_name(&pad.name) {
            Some(old) if !pad.name.is_empty() => {
                pad.net = old.net;
                pad.pin_function = old.pin_function.clone();
                pad.pin_type = old.pin_type.clone();
                pad.local_ratsnest_visible = old.local_ratsnest_visible;
            }
            _ => {
                pad.net = UNCONNECTED;
                pad.pin_function.clear();
                pad.pin_type.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{EdgeSegment, FootprintId, Pad};

    #[test]
    fn test_insertion_position_empty_board_uses_page_center() {
        let board = Board::new();
        assert_eq!(estimate_insertion_position(&board), Position::new(148.5, 105.0));
    }

    #[test]
    fn test_insertion_position_below_outline() {
        let mut board = Board::new();
        board.edges.push(EdgeSegment {
            start: Position::new(0.0, 0.0),
            end: Position::new(100.0, 50.0),
        });
        assert_eq!(estimate_insertion_position(&board), Position::new(50.0, 60.0));
    }

    #[test]
    fn test_insertion_position_degenerate_outline() {
        let mut board = Board::new();
        let mut fp = Footprint::new("R1", FootprintId::parse("R:R"));
        fp.position = Position::new(30.0, 40.0);
        board.footprints.push(fp);
        assert_eq!(estimate_insertion_position(&board), Position::default());
    }

    #[test]
    fn test_exchange_copies_identity_and_pad_nets() {
        let mut existing = Footprint::new("U1", FootprintId::parse("Package_SO:SOIC-8"));
        existing.value = "LM358".to_string();
        existing.position = Position::new(12.0, 8.0);
        existing.rotation = 180.0;
        existing.locked = true;
        let mut p1 = Pad::new("1", &["F.Cu"]);
        p1.net = 3;
        p1.pin_function = "OUT".to_string();
        existing.pads.push(p1);

        let mut replacement = Footprint::new("REF**", FootprintId::parse("Package_SO:TSSOP-8"))
            .with_pad(Pad::new("1", &["F.Cu"]))
            .with_pad(Pad::new("9", &["F.Cu"]));
        replacement.pads[1].net = 42;

        exchange_footprint(&existing, &mut replacement);
        assert_eq!(replacement.reference, "U1");
        assert_eq!(replacement.value, "LM358");
        assert_eq!(replacement.position, Position::new(12.0, 8.0));
        assert_eq!(replacement.rotation, 180.0);
        assert!(replacement.locked);
        assert_eq!(replacement.fpid.name, "TSSOP-8");
        assert_eq!(replacement.pads[0].net, 3);
        assert_eq!(replacement.pads[0].pin_function, "OUT");
        assert_eq!(replacement.pads[1].net, UNCONNECTED);
    }
}
