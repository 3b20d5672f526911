//! Preview example: dry-run a netlist update and print what would change.
//! Run with: cargo run --example preview_update <board.kicad_pcb> <netlist.net> [library dir]

use netsync::prelude::*;
use std::path::Path;

fn main() -> Result<(), NetSyncError> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: cargo run --example preview_update <board.kicad_pcb> <netlist.net> [library dir]");
        std::process::exit(1);
    }
    let library = args.get(3).map(Path::new);

    let options = UpdateOptions::default().dry_run(true);
    let (_, result) =
        NetSyncCore::update_files(Path::new(&args[1]), Path::new(&args[2]), library, options)?;

    println!("Preview for: {}", result.board_file.display());
    for message in result
        .messages
        .iter()
        .filter(|m| m.severity != Severity::Info)
    {
        println!("  {}", message);
    }
    println!();
    println!(
        "{} changes, {} new footprints, {} warnings, {} errors",
        result.stats.actions, result.stats.new_footprints, result.stats.warnings, result.stats.errors
    );

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
