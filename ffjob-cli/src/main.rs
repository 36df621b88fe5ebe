// ffjob-cli/src/main.rs
//
// Entry point for the ffjob binary: parses arguments, sets up logging,
// dispatches to the selected command and turns failures into exit codes.

use clap::Parser;
use console::style;
use ffjob_cli::error::exit_code;
use ffjob_cli::logging::init_logging;
use ffjob_cli::{Cli, Commands, run_encode, run_probe};
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref(), cli.verbose) {
        eprintln!("{} failed to set up logging: {e:#}", style("Error:").red().bold());
        process::exit(1);
    }

    let result = match &cli.command {
        Commands::Encode(args) => run_encode(args),
        Commands::Probe(args) => run_probe(args),
    };

    if let Err(e) = result {
        log::error!("{e:#}");
        // The log file is not where the user is looking.
        if cli.log_file.is_some() {
            eprintln!("{} {e:#}", style("Error:").red().bold());
        }
        process::exit(exit_code(&e));
    }
}
