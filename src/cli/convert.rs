use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use timsconvert::acquisition::{Layout, MaldiApplication};
use timsconvert::extract::ExtractionSettings;
use timsconvert::imaging::{plan_groups, PlateMap};
use timsconvert::imzml::ImzmlSink;
use timsconvert::mzml::MzMLSink;
use timsconvert::pipeline::{ConversionConfig, ConversionStats, Converter};
use timsconvert::serializer::RunMetadata;
use timsconvert::source::{AcquisitionSource, InMemoryAcquisition};

use super::{config, ConvertArgs};

/// Default output stem: the input name without `.json` and `.d` suffixes.
fn default_stem(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    let name = name.strip_suffix(".json").unwrap_or(&name);
    name.strip_suffix(".d").unwrap_or(name).to_string()
}

/// Convert an acquisition to mzML or imzML
pub fn run(args: ConvertArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    let config = config::resolve(&args)?;
    let run_id = args.outfile.clone().unwrap_or_else(|| default_stem(&args.input));
    let outdir = args.outdir.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    info!("timsconvert");
    info!("===========");
    info!("Input:  {}", args.input.display());
    info!("Output: {} ({})", outdir.display(), run_id);

    let source = InMemoryAcquisition::from_path(&args.input)
        .with_context(|| format!("Failed to load acquisition {}", args.input.display()))?;
    let metadata = source.metadata();
    let settings = ExtractionSettings::resolve(&config, metadata.schema);
    let run = RunMetadata::new(
        metadata,
        &args.input,
        run_id.as_str(),
        settings.mode,
        config.ms2_only,
        config.barebones_metadata,
    );
    info!("Schema: {}, layout: {:?}, mode: {}", metadata.schema, metadata.layout(), settings.mode);

    let stats = if metadata.layout() == Layout::Maldi(MaldiApplication::Imaging) {
        vec![convert_imaging(&source, &config, &run, &outdir)?]
    } else {
        let plate_map = args
            .plate_map
            .as_ref()
            .map(PlateMap::from_path)
            .transpose()
            .context("Failed to load plate map")?;
        convert_groups(&source, &config, &run, &outdir, plate_map.as_ref())?
    };

    for entry in &stats {
        println!("{}", entry.format_colored());
    }
    if let Some(path) = &args.stats_json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create stats file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &stats).context("Failed to write stats")?;
        info!("Statistics written to {}", path.display());
    }
    Ok(())
}

fn convert_imaging(
    source: &dyn AcquisitionSource,
    config: &ConversionConfig,
    run: &RunMetadata,
    outdir: &Path,
) -> Result<ConversionStats> {
    let converter = Converter::new(source, config.clone())?;
    let sink = ImzmlSink::create(outdir, &run.run_id, config.imzml_mode)?;
    info!("Writing {}", sink.imzml_path().display());
    converter.convert(sink, run).context("Conversion failed")
}

fn convert_groups(
    source: &dyn AcquisitionSource,
    config: &ConversionConfig,
    run: &RunMetadata,
    outdir: &Path,
    plate_map: Option<&PlateMap>,
) -> Result<Vec<ConversionStats>> {
    let groups = plan_groups(source, config.maldi_output, &run.run_id, plate_map)?;
    let mut stats = Vec::with_capacity(groups.len());
    for group in groups {
        let mut converter = Converter::new(source, config.clone())?;
        if let Some(frames) = group.frames {
            converter = converter.with_frames(frames);
        }
        if converter.expected_count()? == 0 && group.label.is_some() {
            info!("Skipping {}: no spectra to write", group.stem);
            continue;
        }
        let sink = MzMLSink::create(outdir, &group.stem)?;
        let group_stats = converter
            .convert(sink, &run.renamed(group.stem.as_str()))
            .with_context(|| format!("Conversion of {} failed", group.stem))?;
        stats.push(group_stats);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stem() {
        assert_eq!(default_stem(Path::new("/data/sample.d.json")), "sample");
        assert_eq!(default_stem(Path::new("run.json")), "run");
        assert_eq!(default_stem(Path::new("plain")), "plain");
    }
}
