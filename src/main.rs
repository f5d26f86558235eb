mod cli;
mod config;
mod convert;
mod logging;
mod spectrum_cmd;
mod table_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command, cli.verbose > 0) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command, verbose: bool) -> Result<()> {
    match command {
        Command::Table(args) => table_cmd::run(args, verbose),
        Command::Spectrum(args) => spectrum_cmd::run(args, verbose),
    }
}
