//! # timsconvert
//!
//! Command-line converter from Bruker acquisitions to mzML and imzML.
//!
//! ## Usage
//!
//! ```bash
//! # LC run to mzML, centroided, 32-bit arrays
//! timsconvert convert sample.d.json --mode centroid --encoding 32
//!
//! # MALDI spots, one file per plate-map sample
//! timsconvert convert plate.d.json --maldi-output sample --plate-map plate.csv
//!
//! # Frame classification only
//! timsconvert inspect sample.d.json
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
