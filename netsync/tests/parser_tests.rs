//! Tests for KiCad file parsing

use netsync::{parse_board, parse_netlist, DirectoryLibrary, FootprintId, FootprintLibrary};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_parse_demo_board() {
    let board = parse_board(&fixture_path("demo.kicad_pcb")).expect("Should parse");

    assert_eq!(board.filename, "demo.kicad_pcb");
    assert_eq!(board.footprints.len(), 3);
    // Net 0 plus four named nets
    assert_eq!(board.nets.len(), 5);
    assert_eq!(board.vias.len(), 1);
    assert_eq!(board.zones.len(), 1);

    let r2 = &board.footprints[1];
    assert_eq!(r2.reference, "R2");
    assert_eq!(r2.value, "1k");
    assert_eq!(r2.path, "/a1b2c3d4-0002");
    assert_eq!(r2.rotation, 90.0);
    assert_eq!(r2.fpid.to_string(), "Resistor_SMD:R_0603_1608Metric");
    assert_eq!(board.nets.name_of(r2.pads[0].net), "SIG_OLD");

    assert_eq!(board.nets.name_of(board.zones[0].net), "GND");
    assert!(board.zones[0].is_copper_fill());
    assert_eq!(board.nets.name_of(board.vias[0].net), "SIG_OLD");

    let bbox = board.edges_bounding_box().expect("Should have an outline");
    assert_eq!(bbox.width(), 40.0);
    assert_eq!(bbox.height(), 30.0);
}

#[test]
fn test_parse_demo_netlist() {
    let netlist = parse_netlist(&fixture_path("demo.net")).expect("Should parse");

    assert_eq!(netlist.len(), 3);
    let u1 = netlist.component_by_reference("U1").expect("Should find U1");
    assert_eq!(u1.value, "TLV9062");
    assert_eq!(u1.path, "/a1b2c3d4-0010");
    assert_eq!(u1.properties.get("Sheetfile").map(String::as_str), Some("demo.kicad_sch"));

    let pin8 = u1.net_for_pin("8").expect("Should have pin 8");
    assert_eq!(pin8.net_name, "VCC");
    assert_eq!(pin8.pin_function, "V+");
    assert_eq!(pin8.pin_type, "power_in");

    let names: Vec<_> = netlist.net_names().into_iter().collect();
    assert_eq!(names, vec!["GND", "SIG", "VCC"]);
}

#[test]
fn test_directory_library_resolves_fixture_footprints() {
    let library = DirectoryLibrary::new(fixture_path("library"));

    let soic = library
        .load_footprint(&FootprintId::parse("Package_SO:SOIC-8_3.9x4.9mm_P1.27mm"))
        .expect("Should load SOIC-8");
    assert_eq!(soic.pads.len(), 8);
    assert_eq!(soic.reference, "REF**");

    let bare = library.load_footprint(&FootprintId::parse("R_0805_2012Metric"));
    assert!(bare.is_some(), "Bare names search every library");

    assert!(library
        .load_footprint(&FootprintId::parse("Resistor_SMD:R_9999"))
        .is_none());
}

#[test]
fn test_parse_invalid_file() {
    let result = parse_board(&PathBuf::from("not_a_real_file.kicad_pcb"));
    assert!(result.is_err(), "Should fail on nonexistent file");

    let result = parse_netlist(&fixture_path("demo.kicad_pcb"));
    assert!(result.is_err(), "A board is not a netlist");
}
