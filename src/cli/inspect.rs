use anyhow::{Context, Result};
use std::path::PathBuf;

use timsconvert::pipeline::AcquisitionSummary;
use timsconvert::source::InMemoryAcquisition;

/// Classify the frames of an acquisition
pub fn run(input: PathBuf, ms2_only: bool, json: bool) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let source = InMemoryAcquisition::from_path(&input)
        .with_context(|| format!("Failed to load acquisition {}", input.display()))?;
    let summary = AcquisitionSummary::from_source(&source, ms2_only).context("Failed to classify frames")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("File: {}", input.display());
        print!("{}", summary.format_colored());
    }
    Ok(())
}
