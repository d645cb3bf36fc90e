//! # Scan record building
//!
//! [`ScanRecordBuilder`] classifies a frame and hands it to the
//! [`RecordStrategy`] of its acquisition mode. Strategies read the mode's
//! metadata rows, extract arrays and push finished [`CanonicalSpectrum`]s into
//! a [`WindowAccumulator`].
//!
//! Population shared by all modes (polarity, centroided flag, retention time,
//! MALDI coordinate) lives on [`BuildContext`].

mod strategies;


pub use strategies::RecordStrategy;

use log::debug;
use std::collections::BTreeMap;

use crate::acquisition::{AcquisitionClassifier, AcquisitionMode, Layout, MaldiApplication, Schema};
use crate::extract::{ArrayExtractor, Extraction, ExtractionSettings};
use crate::pipeline::{ConversionConfig, FrameWindow};
use crate::source::{AcquisitionSource, FrameRecord, ProviderError};
use crate::spectrum::{CanonicalSpectrum, Coordinate, Polarity, SpectrumError, SpectrumHeader};

/// Errors raised while building records.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Provider fault
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Extracted arrays violate the record invariants
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

/// Records produced for one frame window, in production order.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAccumulator {
    /// The window
    pub window: FrameWindow,
    /// Finished records
    pub records: Vec<CanonicalSpectrum>,
    /// Frames read from the source
    pub frames_seen: usize,
    /// Frames no route classifies
    pub skipped_frames: usize,
    /// Candidate spectra dropped because they had no peaks
    pub dropped: usize,
    /// Records per acquisition mode
    pub mode_counts: BTreeMap<AcquisitionMode, usize>,
}

impl WindowAccumulator {
    /// Empty accumulator for a window.
    pub fn new(window: FrameWindow) -> Self {
        Self {
            window,
            records: Vec::new(),
            frames_seen: 0,
            skipped_frames: 0,
            dropped: 0,
            mode_counts: BTreeMap::new(),
        }
    }

    /// Append a record.
    pub fn push(&mut self, spectrum: CanonicalSpectrum) {
        *self.mode_counts.entry(spectrum.mode()).or_insert(0) += 1;
        self.records.push(spectrum);
    }

    /// Count a dropped candidate.
    pub fn drop_empty(&mut self, frame: u32, mode: AcquisitionMode) {
        debug!("Frame {frame}: {mode} spectrum has no peaks, dropped");
        self.dropped += 1;
    }
}

/// Per-run state shared by all strategies.
pub struct BuildContext<'a> {
    /// Metadata and array provider
    pub source: &'a dyn AcquisitionSource,
    /// Array extractor
    pub extractor: ArrayExtractor<'a>,
    /// Storage schema
    pub schema: Schema,
    /// Acquisition layout
    pub layout: Layout,
    /// Skip MS1 spectra
    pub ms2_only: bool,
    /// Polarity of integer code 0
    pub polarity_code_zero: Polarity,
}

impl<'a> BuildContext<'a> {
    /// Context for a source and configuration.
    pub fn new(source: &'a dyn AcquisitionSource, config: &ConversionConfig) -> Self {
        let metadata = source.metadata();
        let schema = metadata.schema;
        Self {
            source,
            extractor: ArrayExtractor::new(source, ExtractionSettings::resolve(config, schema)),
            schema,
            layout: metadata.layout(),
            ms2_only: config.ms2_only,
            polarity_code_zero: config.polarity_code_zero,
        }
    }

    /// Header populated with the fields every mode shares.
    pub fn header(&self, frame: &FrameRecord, mode: AcquisitionMode) -> Result<SpectrumHeader, BuildError> {
        let polarity = frame.polarity.resolve(self.polarity_code_zero)?;
        let centroided = self.extractor.settings().mode.is_centroided();
        let mut header = SpectrumHeader::new(frame.id, mode, polarity, centroided);

        match self.layout {
            Layout::LcMs => header.retention_time = frame.time / 60.0,
            Layout::Maldi(application) => {
                let row = self
                    .source
                    .maldi_frame(frame.id)
                    .ok_or_else(|| ProviderError::missing("MaldiFrameInfo", frame.id))?;
                header.coordinate = Some(match application {
                    MaldiApplication::SingleSpectra => Coordinate::Spot(row.spot_name),
                    MaldiApplication::Imaging => Coordinate::Pixel {
                        x: row.x_index_pos,
                        y: row.y_index_pos,
                        z: row.z_index_pos,
                    },
                });
            }
        }
        Ok(header)
    }

    /// Validate and store a record, or count the candidate as dropped.
    pub fn emit(
        &self,
        acc: &mut WindowAccumulator,
        header: SpectrumHeader,
        extraction: Extraction,
    ) -> Result<(), BuildError> {
        let (frame, mode) = (header.frame, header.mode);
        let Some(arrays) = extraction.into_arrays() else {
            acc.drop_empty(frame, mode);
            return Ok(());
        };
        match CanonicalSpectrum::new(header, arrays) {
            Ok(spectrum) => {
                acc.push(spectrum);
                Ok(())
            }
            Err(SpectrumError::Empty { .. }) => {
                acc.drop_empty(frame, mode);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// CCS of the selected ion when both mobility and a valid charge are known.
    pub fn ccs(&self, mobility: Option<f64>, charge: Option<i32>, mz: f64) -> Option<f64> {
        match (mobility, charge) {
            (Some(k0), Some(z)) => Some(self.source.mobility_to_ccs(k0, z, mz)),
            _ => None,
        }
    }
}

/// Classifies frames and dispatches them to their strategies.
pub struct ScanRecordBuilder<'a> {
    classifier: AcquisitionClassifier,
    context: BuildContext<'a>,
}

impl<'a> ScanRecordBuilder<'a> {
    /// Builder for a source and configuration.
    pub fn new(source: &'a dyn AcquisitionSource, config: &ConversionConfig) -> Self {
        let context = BuildContext::new(source, config);
        Self {
            classifier: AcquisitionClassifier::new(context.schema, context.layout),
            context,
        }
    }

    /// Classifier in use.
    pub fn classifier(&self) -> &AcquisitionClassifier {
        &self.classifier
    }

    /// Shared context.
    pub fn context(&self) -> &BuildContext<'a> {
        &self.context
    }

    /// Build every record of one frame into `acc`.
    pub fn build_frame(&self, frame: &FrameRecord, acc: &mut WindowAccumulator) -> Result<(), BuildError> {
        acc.frames_seen += 1;
        match self.classifier.classify_frame(frame) {
            Some(mode) => mode.strategy().populate(&self.context, frame, acc),
            None => {
                debug!(
                    "Frame {}: no route for scan mode {} / MS/MS type {}, skipped",
                    frame.id, frame.scan_mode, frame.msms_type
                );
                acc.skipped_frames += 1;
                Ok(())
            }
        }
    }

    /// Build the frames of `frame_ids` (ascending) that fall in `window`.
    pub fn build_window(&self, window: FrameWindow, frame_ids: &[u32]) -> Result<WindowAccumulator, BuildError> {
        let mut acc = WindowAccumulator::new(window);
        let start = frame_ids.partition_point(|id| *id < window.start);
        let stop = frame_ids.partition_point(|id| *id < window.stop);
        for &id in &frame_ids[start..stop] {
            let frame = self.context.source.frame(id)?;
            self.build_frame(&frame, &mut acc)?;
        }
        Ok(acc)
    }
}
