//! Pairing netlist components with board footprints

use crate::board::{Board, Footprint};
use crate::library::FootprintLibrary;
use crate::netlist::Component;

use super::context::PassContext;
use super::footprints::{add_new_footprint, replace_footprint};
use super::pads::update_pad_connections;
use super::parameters::update_footprint_parameters;

/// Match key selected by the pass: symbol path or reference designator
/// (case-insensitive).
pub fn is_match(footprint: &Footprint, component: &Component, by_timestamp: bool) -> bool {
    if by_timestamp {
        footprint.path == component.path
    } else {
        footprint.reference.eq_ignore_ascii_case(&component.reference)
    }
}

/// Board footprints matching a component, by board index
pub fn find_matches(board: &Board, component: &Component, by_timestamp: bool) -> Vec<usize> {
    board
        .footprints
        .iter()
        .enumerate()
        .filter(|(_, fp)| is_match(fp, component, by_timestamp))
        .map(|(i, _)| i)
        .collect()
}

/// Bring the board in line with one component: add its footprint when
/// nothing matches, otherwise update every match.
pub fn process_component(
    ctx: &mut PassContext<'_>,
    board: &mut Board,
    library: &dyn FootprintLibrary,
    index: usize,
    component: &Component,
) {
    if component.is_excluded_from_board() {
        return;
    }

    ctx.info(format!(
        "Processing symbol '{}:{}'.",
        component.reference, component.fpid
    ));

    let matches = find_matches(board, component, ctx.options.lookup_by_timestamp);

    if matches.is_empty() {
        if let Some(handle) = add_new_footprint(ctx, board, library, component) {
            ctx.resolved.insert(index, handle);
            update_footprint_parameters(ctx, board, handle, component);
            update_pad_connections(ctx, board, handle, component);
        }
        return;
    }

    // Every match is updated; none of them is more right than the others
    for &board_index in &matches {
        let mut handle = ctx.current_handle(board_index);
        let fpid_differs = ctx
            .footprint(board, handle)
            .map(|fp| fp.fpid != component.fpid)
            .unwrap_or(false);

        if ctx.options.replace_footprints && fpid_differs {
            match replace_footprint(ctx, board, library, handle, component) {
                Some(replacement) => handle = replacement,
                None => continue,
            }
        }

        ctx.resolved.insert(index, handle);
        update_footprint_parameters(ctx, board, handle, component);
        update_pad_connections(ctx, board, handle, component);
    }

    if matches.len() > 1 {
        ctx.error(format!(
            "Multiple footprints found for \"{}\".",
            component.reference
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FootprintId, NetInfo, Pad};
    use crate::library::InMemoryLibrary;
    use crate::netlist::EXCLUDE_FROM_BOARD;
    use crate::report::MessageLog;
    use crate::updater::UpdateOptions;

    fn resistor(fpid: &str) -> Footprint {
        Footprint::new("REF**", FootprintId::parse(fpid))
            .with_pad(Pad::new("1", &["F.Cu"]))
            .with_pad(Pad::new("2", &["F.Cu"]))
    }

    fn placed_board() -> Board {
        let mut board = Board::new();
        board.nets.add(NetInfo::new(1, "A"));
        board.nets.add(NetInfo::new(2, "B"));
        let mut fp = resistor("R:R_0603");
        fp.reference = "R1".to_string();
        fp.value = "10k".to_string();
        fp.pads[0].net = 1;
        fp.pads[1].net = 2;
        board.footprints.push(fp);
        board
    }

    #[test]
    fn test_reference_match_ignores_case() {
        let fp = Footprint::new("r1", FootprintId::parse("R:R"));
        let component = Component::new("R1", FootprintId::parse("R:R")).with_path("/x");
        assert!(is_match(&fp, &component, false));
        assert!(!is_match(&fp, &component, true));
    }

    #[test]
    fn test_timestamp_match_is_exact() {
        let mut fp = Footprint::new("R9", FootprintId::parse("R:R"));
        fp.path = "/abc".to_string();
        let component = Component::new("R1", FootprintId::parse("R:R")).with_path("/abc");
        assert!(is_match(&fp, &component, true));
        assert!(!is_match(&fp, &component, false));
    }

    #[test]
    fn test_find_matches_returns_all() {
        let mut board = Board::new();
        board.footprints.push(Footprint::new("R1", FootprintId::parse("R:R")));
        board.footprints.push(Footprint::new("C1", FootprintId::parse("C:C")));
        board.footprints.push(Footprint::new("R1", FootprintId::parse("R:R")));
        let component = Component::new("R1", FootprintId::parse("R:R"));
        assert_eq!(find_matches(&board, &component, false), vec![0, 2]);
    }

    #[test]
    fn test_excluded_component_is_skipped() {
        let mut board = Board::new();
        let library = InMemoryLibrary::new().with_footprint(resistor("R:R_0603"));
        let component = Component::new("R5", FootprintId::parse("R:R_0603"))
            .with_property(EXCLUDE_FROM_BOARD, "")
            .with_net("1", "A");

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        process_component(&mut ctx, &mut board, &library, 0, &component);
        assert!(ctx.staged().is_empty());
        assert!(ctx.resolved.is_empty());
        assert_eq!(ctx.new_footprints, 0);
        assert_eq!(ctx.actions, 0);
        drop(ctx);

        assert!(board.footprints.is_empty());
        assert!(!log
            .messages()
            .iter()
            .any(|m| m.message.starts_with("Processing symbol")));
    }

    #[test]
    fn test_failed_replacement_leaves_footprint_alone() {
        let mut board = placed_board();
        let original = board.clone();
        let library = InMemoryLibrary::new().with_footprint(resistor("R:R_0603"));
        let component = Component::new("R1", FootprintId::parse("R:R_0805"))
            .with_value("22k")
            .with_net("1", "X")
            .with_net("2", "Y");

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        process_component(&mut ctx, &mut board, &library, 0, &component);
        assert_eq!(ctx.errors, 1);
        assert_eq!(ctx.actions, 0);
        assert_eq!(ctx.new_footprints, 0);
        assert!(ctx.staged().is_empty());
        assert!(ctx.resolved.is_empty());
        drop(ctx);

        assert!(log.contains("Cannot update R1 (footprint \"R:R_0805\" not found)."));
        assert_eq!(board, original);
    }

    #[test]
    fn test_replacement_without_footprint_is_an_error() {
        let mut board = placed_board();
        let original = board.clone();
        let library = InMemoryLibrary::new().with_footprint(resistor("R:R_0603"));
        let component = Component::new("R1", FootprintId::default()).with_net("1", "X");

        let mut log = MessageLog::new();
        let mut ctx = PassContext::new(UpdateOptions::default(), &mut log, &board);
        process_component(&mut ctx, &mut board, &library, 0, &component);
        assert_eq!(ctx.errors, 1);
        assert!(ctx.resolved.is_empty());
        drop(ctx);

        assert!(log.contains("Cannot update R1 (no footprint assigned)."));
        assert_eq!(board, original);
    }
}
