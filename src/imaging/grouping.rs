use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use super::plate_map::{is_sample_label, PlateMap, PlateMapError};
use crate::acquisition::{Layout, MaldiApplication};
use crate::pipeline::GroupingMode;
use crate::source::AcquisitionSource;

/// One output file of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputGroup {
    /// Output stem, also used as the run id
    pub stem: String,
    /// Plate-map label of the group
    pub label: Option<String>,
    /// Frames written to this file, `None` for all of them
    pub frames: Option<Vec<u32>>,
}

impl OutputGroup {
    /// The whole run in one file.
    pub fn combined(stem: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            label: None,
            frames: None,
        }
    }
}

/// Split a run into output files.
///
/// Only MALDI single-spectra (spot) runs are split; every other layout is
/// written as one combined file whatever `grouping` says. Frames whose spot
/// the plate map does not label are skipped with a warning.
pub fn plan_groups(
    source: &dyn AcquisitionSource,
    grouping: GroupingMode,
    run_id: &str,
    plate_map: Option<&PlateMap>,
) -> Result<Vec<OutputGroup>, PlateMapError> {
    if grouping == GroupingMode::Combined {
        return Ok(vec![OutputGroup::combined(run_id)]);
    }
    let layout = source.metadata().layout();
    if layout != Layout::Maldi(MaldiApplication::SingleSpectra) {
        warn!("{grouping:?} output applies to MALDI spot runs only; writing {layout:?} run as one file");
        return Ok(vec![OutputGroup::combined(run_id)]);
    }
    let plate_map = plate_map.ok_or(PlateMapError::Missing(grouping))?;

    let mut spots = Vec::new();
    for frame in source.frame_ids() {
        match source.maldi_frame(frame) {
            Some(row) => spots.push((frame, row.spot_name)),
            None => debug!("Frame {frame} has no MALDI spot"),
        }
    }

    let groups = match grouping {
        GroupingMode::Individual => individual(&spots, plate_map),
        GroupingMode::Sample => by_sample(&spots, plate_map),
        GroupingMode::Combined => vec![OutputGroup::combined(run_id)],
    };
    Ok(groups)
}

/// One file per labelled spot, `{label}_{spot}`, holding every frame of the spot.
fn individual(spots: &[(u32, String)], plate_map: &PlateMap) -> Vec<OutputGroup> {
    let mut frames: BTreeMap<&str, (&str, Vec<u32>)> = BTreeMap::new();
    for (frame, spot) in spots {
        match plate_map.label(spot) {
            Some(label) if is_sample_label(label) => {
                frames.entry(spot.as_str()).or_insert_with(|| (label, Vec::new())).1.push(*frame)
            }
            Some(_) => debug!("Spot {spot} (frame {frame}) is not labelled"),
            None => warn!("Spot {spot} (frame {frame}) is missing from the plate map"),
        }
    }
    frames
        .into_iter()
        .map(|(spot, (label, frames))| OutputGroup {
            stem: format!("{label}_{spot}"),
            label: Some(label.to_string()),
            frames: Some(frames),
        })
        .collect()
}

/// One file per sample label, `{label}`, holding every frame of its spots.
fn by_sample(spots: &[(u32, String)], plate_map: &PlateMap) -> Vec<OutputGroup> {
    let mut frames: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
    for (frame, spot) in spots {
        match plate_map.label(spot) {
            Some(label) if is_sample_label(label) => frames.entry(label).or_default().push(*frame),
            Some(_) => debug!("Spot {spot} (frame {frame}) is not labelled"),
            None => warn!("Spot {spot} (frame {frame}) is missing from the plate map"),
        }
    }
    for label in plate_map.samples().keys() {
        if !frames.contains_key(label) {
            warn!("Sample {label} has no acquired spots");
        }
    }
    frames
        .into_iter()
        .map(|(label, frames)| OutputGroup {
            stem: label.to_string(),
            label: Some(label.to_string()),
            frames: Some(frames),
        })
        .collect()
}
