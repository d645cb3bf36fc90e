use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::calibration::{one_over_k0_to_ccs, Calibration};
use super::error::ProviderError;
use super::records::*;
use super::{AcquisitionSource, DecodedTrace, ScanRange, SubScan, TraceAxis, TraceKind};
use crate::acquisition::Schema;

/// Continuum trace stored for a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTrace {
    /// TOF indices (TDF/TSF) or m/z (BAF)
    pub positions: Vec<f64>,
    /// Intensities
    pub intensities: Vec<f64>,
}

/// Decoded peaks of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FramePeaks {
    /// Frame id
    pub frame: u32,
    /// Per sub-scan peak lists. TSF and BAF frames carry a single sub-scan.
    #[serde(default)]
    pub scans: Vec<SubScan>,
    /// Optional continuum trace
    #[serde(default)]
    pub profile: Option<ProfileTrace>,
}

/// Serializable export of an acquisition: vendor tables plus decoded peaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionDump {
    /// `GlobalMetadata`
    pub metadata: GlobalMetadata,
    /// Linear calibrations
    pub calibration: Calibration,
    /// `Frames` / `Spectra`
    pub frames: Vec<FrameRecord>,
    /// `Precursors`
    pub precursors: Vec<PrecursorRecord>,
    /// `PasefFrameMsMsInfo`
    pub pasef_windows: Vec<PasefWindowRecord>,
    /// `DiaFrameMsMsInfo`
    pub dia_frames: Vec<DiaFrameRecord>,
    /// `DiaFrameMsMsWindows`
    pub dia_windows: Vec<DiaWindowRecord>,
    /// `PrmFrameMsMsInfo`
    pub prm_frames: Vec<PrmFrameRecord>,
    /// `PrmTargets`
    pub prm_targets: Vec<PrmTargetRecord>,
    /// `FrameMsMsInfo`
    pub frame_msms_info: Vec<FrameMsMsInfoRecord>,
    /// `MaldiFrameInfo`
    pub maldi_frames: Vec<MaldiFrameRecord>,
    /// BAF `Variables`
    pub baf_variables: Vec<BafVariableRecord>,
    /// BAF `Steps`
    pub baf_steps: Vec<BafStepRecord>,
    /// Decoded peaks per frame
    pub peaks: Vec<FramePeaks>,
}

/// [`AcquisitionSource`] over an [`AcquisitionDump`] held in memory.
#[derive(Debug)]
pub struct InMemoryAcquisition {
    metadata: GlobalMetadata,
    calibration: Calibration,
    frame_ids: Vec<u32>,
    frames: HashMap<u32, FrameRecord>,
    precursors: HashMap<u32, Vec<PrecursorRecord>>,
    pasef_windows: HashMap<u32, Vec<PasefWindowRecord>>,
    dia_groups: HashMap<u32, u32>,
    dia_windows: HashMap<u32, Vec<DiaWindowRecord>>,
    prm_frames: HashMap<u32, PrmFrameRecord>,
    prm_targets: HashMap<u32, PrmTargetRecord>,
    frame_msms_info: HashMap<u32, FrameMsMsInfoRecord>,
    maldi_frames: HashMap<u32, MaldiFrameRecord>,
    baf_variables: HashMap<(u32, u32), f64>,
    baf_steps: HashMap<u32, BafStepRecord>,
    peaks: HashMap<u32, FramePeaks>,
}

impl InMemoryAcquisition {
    /// Index a dump. Fails on duplicate frame ids.
    pub fn new(dump: AcquisitionDump) -> Result<Self, ProviderError> {
        let AcquisitionDump {
            metadata,
            calibration,
            frames: frame_rows,
            precursors: precursor_rows,
            pasef_windows: pasef_rows,
            dia_frames,
            dia_windows: dia_window_rows,
            prm_frames,
            prm_targets,
            frame_msms_info,
            maldi_frames,
            baf_variables,
            baf_steps,
            peaks: peak_rows,
        } = dump;

        let mut frames = HashMap::with_capacity(frame_rows.len());
        for frame in frame_rows {
            let id = frame.id;
            if frames.insert(id, frame).is_some() {
                return Err(ProviderError::invalid("Frames.Id", format!("duplicate frame {id}")));
            }
        }
        let mut frame_ids: Vec<u32> = frames.keys().copied().collect();
        frame_ids.sort_unstable();

        let mut precursors: HashMap<u32, Vec<PrecursorRecord>> = HashMap::new();
        for row in precursor_rows {
            precursors.entry(row.parent).or_default().push(row);
        }
        for rows in precursors.values_mut() {
            rows.sort_by_key(|row| row.id);
        }

        let mut pasef_windows: HashMap<u32, Vec<PasefWindowRecord>> = HashMap::new();
        for row in pasef_rows {
            pasef_windows.entry(row.precursor).or_default().push(row);
        }
        for rows in pasef_windows.values_mut() {
            rows.sort_by_key(|row| (row.frame, row.scan_num_begin));
        }

        let mut dia_windows: HashMap<u32, Vec<DiaWindowRecord>> = HashMap::new();
        for row in dia_window_rows {
            dia_windows.entry(row.window_group).or_default().push(row);
        }

        let mut peaks = HashMap::with_capacity(peak_rows.len());
        for mut entry in peak_rows {
            entry.scans.sort_by_key(|scan| scan.scan);
            peaks.insert(entry.frame, entry);
        }

        debug!(
            "Indexed acquisition: {} frames, {} precursor parents, {} frames with peaks",
            frame_ids.len(),
            precursors.len(),
            peaks.len()
        );

        Ok(Self {
            metadata,
            calibration,
            frame_ids,
            frames,
            precursors,
            pasef_windows,
            dia_groups: dia_frames.into_iter().map(|row| (row.frame, row.window_group)).collect(),
            dia_windows,
            prm_frames: prm_frames.into_iter().map(|row| (row.frame, row)).collect(),
            prm_targets: prm_targets.into_iter().map(|row| (row.id, row)).collect(),
            frame_msms_info: frame_msms_info.into_iter().map(|row| (row.frame, row)).collect(),
            maldi_frames: maldi_frames.into_iter().map(|row| (row.frame, row)).collect(),
            baf_variables: baf_variables
                .into_iter()
                .map(|row| ((row.spectrum, row.variable), row.value))
                .collect(),
            baf_steps: baf_steps.into_iter().map(|row| (row.target_spectrum, row)).collect(),
            peaks,
        })
    }

    /// Load a JSON [`AcquisitionDump`] from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProviderError> {
        let file = File::open(path.as_ref())?;
        let dump: AcquisitionDump = serde_json::from_reader(BufReader::new(file))?;
        Self::new(dump)
    }

    /// Calibration in use.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn ensure_frame(&self, frame: u32) -> Result<(), ProviderError> {
        if self.frames.contains_key(&frame) {
            Ok(())
        } else {
            Err(ProviderError::missing("Frames", frame))
        }
    }

    fn scans_in(&self, frame: u32, range: Option<ScanRange>) -> impl Iterator<Item = &SubScan> + '_ {
        self.peaks
            .get(&frame)
            .into_iter()
            .flat_map(|entry| entry.scans.iter())
            .filter(move |scan| range.map_or(true, |r| r.contains(scan.scan)))
    }

    fn concatenated(&self, frame: u32, range: Option<ScanRange>) -> (Vec<f64>, Vec<f64>) {
        let mut positions = Vec::new();
        let mut intensities = Vec::new();
        for scan in self.scans_in(frame, range).filter(|scan| scan.is_usable()) {
            positions.extend_from_slice(&scan.positions);
            intensities.extend_from_slice(&scan.intensities);
        }
        (positions, intensities)
    }

    fn summed(&self, frame: u32, range: Option<ScanRange>) -> (Vec<f64>, Vec<f64>) {
        let (positions, intensities) = self.concatenated(frame, range);
        sum_equal_positions(positions, intensities)
    }
}

/// Sort by position and add up the intensities of identical positions.
fn sum_equal_positions(positions: Vec<f64>, intensities: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = positions.into_iter().zip(intensities).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged_positions: Vec<f64> = Vec::with_capacity(pairs.len());
    let mut merged_intensities: Vec<f64> = Vec::with_capacity(pairs.len());
    for (position, intensity) in pairs {
        match (merged_positions.last(), merged_intensities.last_mut()) {
            (Some(last), Some(total)) if *last == position => *total += intensity,
            _ => {
                merged_positions.push(position);
                merged_intensities.push(intensity);
            }
        }
    }
    (merged_positions, merged_intensities)
}

impl AcquisitionSource for InMemoryAcquisition {
    fn metadata(&self) -> &GlobalMetadata {
        &self.metadata
    }

    fn frame_ids(&self) -> Vec<u32> {
        self.frame_ids.clone()
    }

    fn frame(&self, id: u32) -> Result<FrameRecord, ProviderError> {
        self.frames
            .get(&id)
            .cloned()
            .ok_or_else(|| ProviderError::missing("Frames", id))
    }

    fn precursors(&self, parent: u32) -> Vec<PrecursorRecord> {
        self.precursors.get(&parent).cloned().unwrap_or_default()
    }

    fn pasef_windows(&self, precursor: u32) -> Vec<PasefWindowRecord> {
        self.pasef_windows.get(&precursor).cloned().unwrap_or_default()
    }

    fn dia_windows(&self, frame: u32) -> Vec<DiaWindowRecord> {
        self.dia_groups
            .get(&frame)
            .and_then(|group| self.dia_windows.get(group))
            .cloned()
            .unwrap_or_default()
    }

    fn prm_frame(&self, frame: u32) -> Option<PrmFrameRecord> {
        self.prm_frames.get(&frame).cloned()
    }

    fn prm_target(&self, id: u32) -> Option<PrmTargetRecord> {
        self.prm_targets.get(&id).cloned()
    }

    fn frame_msms_info(&self, frame: u32) -> Option<FrameMsMsInfoRecord> {
        self.frame_msms_info.get(&frame).cloned()
    }

    fn maldi_frame(&self, frame: u32) -> Option<MaldiFrameRecord> {
        self.maldi_frames.get(&frame).cloned()
    }

    fn baf_variable(&self, spectrum: u32, variable: BafVariable) -> Option<f64> {
        self.baf_variables.get(&(spectrum, variable.id())).copied()
    }

    fn baf_step(&self, spectrum: u32) -> Option<BafStepRecord> {
        self.baf_steps.get(&spectrum).cloned()
    }

    fn read_scans(&self, frame: u32, range: ScanRange) -> Result<Vec<SubScan>, ProviderError> {
        self.ensure_frame(frame)?;
        Ok(self.scans_in(frame, Some(range)).cloned().collect())
    }

    fn read_trace(
        &self,
        frame: u32,
        range: Option<ScanRange>,
        kind: TraceKind,
    ) -> Result<DecodedTrace, ProviderError> {
        self.ensure_frame(frame)?;
        let schema = self.metadata.schema;

        let trace = match kind {
            TraceKind::Centroid => match schema {
                Schema::Tdf => {
                    let (indices, intensities) = self.summed(frame, range);
                    DecodedTrace {
                        axis: TraceAxis::Mz,
                        positions: self.index_to_mz(frame, &indices)?,
                        intensities,
                    }
                }
                Schema::Tsf => {
                    let (positions, intensities) = self.concatenated(frame, range);
                    DecodedTrace {
                        axis: TraceAxis::Index,
                        positions,
                        intensities,
                    }
                }
                Schema::Baf => {
                    let (positions, intensities) = self.concatenated(frame, range);
                    DecodedTrace {
                        axis: TraceAxis::Mz,
                        positions,
                        intensities,
                    }
                }
            },
            TraceKind::Profile => {
                let axis = match schema {
                    Schema::Baf => TraceAxis::Mz,
                    Schema::Tdf | Schema::Tsf => TraceAxis::Index,
                };
                let stored = self.peaks.get(&frame).and_then(|entry| entry.profile.as_ref());
                match stored {
                    Some(profile) if range.is_none() => {
                        if profile.positions.len() != profile.intensities.len() {
                            return Err(ProviderError::DecodeError {
                                frame,
                                message: format!(
                                    "profile has {} positions but {} intensities",
                                    profile.positions.len(),
                                    profile.intensities.len()
                                ),
                            });
                        }
                        DecodedTrace {
                            axis,
                            positions: profile.positions.clone(),
                            intensities: profile.intensities.clone(),
                        }
                    }
                    _ => {
                        let (positions, intensities) = self.summed(frame, range);
                        DecodedTrace {
                            axis,
                            positions,
                            intensities,
                        }
                    }
                }
            }
        };
        Ok(trace)
    }

    fn index_to_mz(&self, frame: u32, indices: &[f64]) -> Result<Vec<f64>, ProviderError> {
        self.ensure_frame(frame)?;
        Ok(indices.iter().map(|&index| self.calibration.index_to_mz(index)).collect())
    }

    fn scan_to_mobility(&self, frame: u32, scans: &[f64]) -> Result<Vec<f64>, ProviderError> {
        self.ensure_frame(frame)?;
        Ok(scans
            .iter()
            .map(|&scan| self.calibration.scan_to_mobility(scan))
            .collect())
    }

    fn mobility_to_ccs(&self, one_over_k0: f64, charge: i32, mz: f64) -> f64 {
        one_over_k0_to_ccs(
            one_over_k0,
            charge,
            mz,
            self.calibration.gas_mass,
            self.calibration.gas_temperature,
        )
    }
}
