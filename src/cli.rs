use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// gcmeval: evaluation tables and spectra for bias-corrected GCM runs.
#[derive(Parser)]
#[command(
    name = "gcmeval",
    version,
    about = "Prepare evaluation tables of GCM runs against a gridded reference"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Build a tidy table and write it as CSV.
    Table(TableArgs),
    /// Compute Fourier spectra of daily point series and write them as JSON.
    Spectrum(SpectrumArgs),
}

/// Which tidy table to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TableKind {
    /// Multi-year means per bucket and grid cell.
    Boxplot,
    /// Spatial mean per time step.
    Timeseries,
    /// Time mean per grid cell.
    MeanField,
    /// Every time step of every grid cell.
    Spatiotemporal,
    /// Mean per calendar month over space and years; accepts several variables.
    Climatology,
    /// Raw daily values at a point.
    Daily,
}

impl TableKind {
    /// Name used in default output file names.
    pub fn file_stem(self) -> &'static str {
        match self {
            TableKind::Boxplot => "boxplot",
            TableKind::Timeseries => "timeseries",
            TableKind::MeanField => "mean_field",
            TableKind::Spatiotemporal => "spatiotemporal",
            TableKind::Climatology => "climatology",
            TableKind::Daily => "daily",
        }
    }
}

/// Arguments for the `table` subcommand.
#[derive(clap::Args)]
pub struct TableArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "gcmeval.toml")]
    pub config: PathBuf,

    /// Table to build.
    #[arg(short, long, value_enum)]
    pub kind: TableKind,

    /// Variable(s) to read; repeat for the climatology table.
    #[arg(long = "var", required = true)]
    pub vars: Vec<String>,

    /// Named point from `[points]` for nearest-cell selection.
    #[arg(long)]
    pub point: Option<String>,

    /// Region id from `[regions]` to combine with the mask.
    #[arg(long)]
    pub region: Option<i64>,

    /// Output CSV path (default: derived from kind and variable).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Recompute even if the output file exists.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `spectrum` subcommand.
#[derive(clap::Args)]
pub struct SpectrumArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "gcmeval.toml")]
    pub config: PathBuf,

    /// Variable to analyse.
    #[arg(long)]
    pub var: String,

    /// Named point from `[points]`.
    #[arg(long)]
    pub point: String,

    /// Output JSON path (default: derived from variable and point).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Recompute even if the output file exists.
    #[arg(long)]
    pub force: bool,
}
