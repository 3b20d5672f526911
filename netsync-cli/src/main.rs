//! NetSync CLI - update KiCad boards from schematic netlists on the command line.

use clap::{Parser, Subcommand, ValueEnum};
use netsync::{find_project, NetSyncCore, NetSyncError, Severity, UpdateOptions, UpdateResult};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netsync")]
#[command(about = "Synchronize KiCad boards with schematic netlists", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update a board from a netlist
    Update {
        /// Path to .kicad_pcb or board .json file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Path to .net file
        #[arg(value_name = "NETLIST")]
        netlist: PathBuf,

        #[command(flatten)]
        update: UpdateArgs,
    },

    /// Find the board and netlist in a directory and preview the update
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Apply the update instead of previewing it
        #[arg(long)]
        apply: bool,

        #[command(flatten)]
        update: UpdateArgs,
    },

    /// Print the default update options as JSON
    Options,
}

#[derive(clap::Args)]
struct UpdateArgs {
    /// Footprint library directory (contains <lib>.pretty folders)
    #[arg(short, long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Report changes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Remove footprints that have no symbol
    #[arg(long)]
    delete_unused: bool,

    /// Keep nets that end up with a single pad
    #[arg(long)]
    keep_single_pad_nets: bool,

    /// Never swap footprints whose library id changed
    #[arg(long)]
    no_replace: bool,

    /// Match footprints by symbol path instead of reference
    #[arg(long)]
    by_timestamp: bool,

    /// Warn about copper pads without a net
    #[arg(long)]
    warn_no_net_pads: bool,

    /// JSON options file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the updated board as JSON
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Exit with error code if messages of this severity or higher are reported
    #[arg(long, value_enum)]
    fail_on: Option<FailOnSeverity>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Update {
            board,
            netlist,
            update,
        } => handle_update(&board, &netlist, &update, update.dry_run),
        Commands::Project { dir, apply, update } => handle_project(&dir, apply, &update),
        Commands::Options => handle_options(),
    };

    process::exit(exit_code);
}

fn build_options(args: &UpdateArgs, dry_run: bool) -> Result<UpdateOptions, NetSyncError> {
    let mut options = match &args.config {
        Some(path) => UpdateOptions::from_file(path)?,
        None => UpdateOptions::default(),
    };

    if dry_run {
        options.dry_run = true;
    }
    if args.delete_unused {
        options.delete_unused_components = true;
    }
    if args.keep_single_pad_nets {
        options.delete_single_pad_nets = false;
    }
    if args.no_replace {
        options.replace_footprints = false;
    }
    if args.by_timestamp {
        options.lookup_by_timestamp = true;
    }
    if args.warn_no_net_pads {
        options.warn_for_no_net_pads = true;
    }
    Ok(options)
}

fn handle_update(board: &Path, netlist: &Path, args: &UpdateArgs, dry_run: bool) -> i32 {
    let options = match build_options(args, dry_run) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let (updated, result) =
        match NetSyncCore::update_files(board, netlist, args.library.as_deref(), options) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };

    output_result(&result, &args.format);

    if let Some(path) = &args.output {
        if let Err(e) = NetSyncCore::save_board_json(&updated, path) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if let Some(severity) = &args.fail_on {
        if should_fail(&result, severity) {
            return 1;
        }
    }
    0
}

fn handle_project(dir: &Path, apply: bool, args: &UpdateArgs) -> i32 {
    match find_project(dir) {
        Ok(project) => handle_update(&project.board, &project.netlist, args, !apply || args.dry_run),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_options() -> i32 {
    match serde_json::to_string_pretty(&UpdateOptions::default()) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn should_fail(result: &UpdateResult, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => result.has_errors(),
        FailOnSeverity::Warning => result.has_warnings_or_errors(),
    }
}

fn output_result(result: &UpdateResult, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(result),
        OutputFormat::Json => output_json(result),
        OutputFormat::Github => output_github(result),
    }
}

fn output_human(result: &UpdateResult) {
    let mode = if result.dry_run { "Preview" } else { "Update" };
    println!("\n{}: {}", mode, result.board_file.display());
    println!("Netlist: {}", result.netlist_file.display());
    println!("{}", "─".repeat(60));

    let changes: Vec<_> = result
        .messages
        .iter()
        .filter(|m| m.severity != Severity::Info)
        .collect();
    if changes.is_empty() {
        println!("  Board is up to date");
    }
    for message in changes {
        println!("  {:<8} {}", message.severity.to_string(), message.message);
    }

    println!("\n  Summary:");
    println!("    Changes:        {}", result.stats.actions);
    println!("    New footprints: {}", result.stats.new_footprints);
    println!("    Warnings:       {}", result.stats.warnings);
    println!("    Errors:         {}", result.stats.errors);
    if let Some(commit) = &result.commit {
        println!("    Committed:      {} items", commit.changes.len());
    }
}

fn output_json(result: &UpdateResult) {
    let output = serde_json::json!({
        "board": result.board_file.display().to_string(),
        "netlist": result.netlist_file.display().to_string(),
        "dry_run": result.dry_run,
        "messages": result.messages,
        "stats": result.stats,
        "committed": result.commit.as_ref().map(|c| c.changes.len()),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn severity_to_github(severity: Severity) -> Option<&'static str> {
    match severity {
        Severity::Error => Some("error"),
        Severity::Warning => Some("warning"),
        Severity::Action => Some("notice"),
        Severity::Info => None,
    }
}

fn output_github(result: &UpdateResult) {
    for message in &result.messages {
        if let Some(level) = severity_to_github(message.severity) {
            println!(
                "::{} file={}::{}",
                level,
                result.board_file.display(),
                message.message.replace('\n', " ")
            );
        }
    }
}
