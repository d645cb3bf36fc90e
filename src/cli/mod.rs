use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use timsconvert::extract::ExtractionMode;
use timsconvert::pipeline::{Compression, GroupingMode, ImzmlMode};
use timsconvert::spectrum::Polarity;

mod config;
mod convert;
mod inspect;

/// timsconvert - Bruker TDF/TSF/BAF to mzML and imzML converter
#[derive(Parser)]
#[command(name = "timsconvert")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Spectrum resolution.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Unprocessed sub-scan peaks (TDF only)
    Raw,
    /// Vendor centroiding
    Centroid,
    /// Vendor continuum trace
    Profile,
}

impl From<ModeArg> for ExtractionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Raw => ExtractionMode::Raw,
            ModeArg::Centroid => ExtractionMode::Centroid,
            ModeArg::Profile => ExtractionMode::Profile,
        }
    }
}

/// Binary array compression.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompressionArg {
    /// Uncompressed
    None,
    /// zlib
    Zlib,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Compression::None,
            CompressionArg::Zlib => Compression::Zlib,
        }
    }
}

/// MALDI spot output grouping.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupingArg {
    /// All spectra in one file
    Combined,
    /// One file per spot, named `{label}_{spot}`
    Individual,
    /// One file per plate-map label
    Sample,
}

impl From<GroupingArg> for GroupingMode {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Combined => GroupingMode::Combined,
            GroupingArg::Individual => GroupingMode::Individual,
            GroupingArg::Sample => GroupingMode::Sample,
        }
    }
}

/// imzML binary layout.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImzmlArg {
    /// Every pixel stores its own m/z array
    Processed,
    /// All pixels share one m/z array
    Continuous,
}

impl From<ImzmlArg> for ImzmlMode {
    fn from(arg: ImzmlArg) -> Self {
        match arg {
            ImzmlArg::Processed => ImzmlMode::Processed,
            ImzmlArg::Continuous => ImzmlMode::Continuous,
        }
    }
}

/// Ion polarity.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolarityArg {
    /// Positive ions
    Positive,
    /// Negative ions
    Negative,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Positive => Polarity::Positive,
            PolarityArg::Negative => Polarity::Negative,
        }
    }
}

/// Arguments of the convert command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Acquisition exported as JSON
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Output file stem (defaults to the input's stem)
    #[arg(long, value_name = "NAME")]
    pub outfile: Option<String>,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Spectrum resolution
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Only write MS2 spectra
    #[arg(long)]
    pub ms2_only: bool,

    /// Never write ion mobility arrays
    #[arg(long)]
    pub exclude_mobility: bool,

    /// Re-bin profile spectra into this many bins (0 keeps the native trace)
    #[arg(long, value_name = "BINS")]
    pub profile_bins: Option<usize>,

    /// Float width of binary arrays
    #[arg(short, long, value_parser = ["32", "64"])]
    pub encoding: Option<String>,

    /// Binary array compression
    #[arg(short, long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Survey-bounded intervals per frame window
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// MALDI spot output grouping
    #[arg(long, value_enum)]
    pub maldi_output: Option<GroupingArg>,

    /// Plate map CSV, required for individual and sample grouping
    #[arg(long, value_name = "CSV")]
    pub plate_map: Option<PathBuf>,

    /// imzML binary layout for MALDI imaging runs
    #[arg(long, value_enum)]
    pub imzml_mode: Option<ImzmlArg>,

    /// Polarity of BAF polarity code 0
    #[arg(long, value_enum)]
    pub polarity_code_zero: Option<PolarityArg>,

    /// Bin width of the PASEF precursor merge
    #[arg(long)]
    pub pasef_bin_width: Option<f64>,

    /// Omit acquisition software and instrument details
    #[arg(long)]
    pub barebones_metadata: bool,

    /// Parallel extraction workers (requires the parallel feature)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Write conversion statistics as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub stats_json: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an acquisition to mzML (LC and MALDI spots) or imzML (MALDI imaging)
    Convert(ConvertArgs),

    /// Classify the frames of an acquisition without extracting spectra
    Inspect {
        /// Acquisition exported as JSON
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Count spectra as if MS1 were omitted
        #[arg(long)]
        ms2_only: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert(args) => convert::run(args),
        Commands::Inspect { input, ms2_only, json } => inspect::run(input, ms2_only, json),
    }
}
