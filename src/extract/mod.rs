//! # Array extraction
//!
//! [`ArrayExtractor`] turns a frame (optionally restricted to a sub-scan
//! range) into peak arrays in raw, centroid or profile resolution, either
//! collapsed over mobility (2-D) or mobility-resolved (3-D).
//!
//! 2-D results are normalized so that m/z is strictly unique and ascending;
//! 3-D results are sorted by `(m/z, mobility, intensity)` without collapsing.
//! A frame without usable peaks yields [`Extraction::Empty`], which callers
//! skip; only provider faults are errors.

mod binning;

#[cfg(test)]
mod tests;

pub use binning::{bin_spectrum, BinEdges, SpectrumBinner, MAX_BIN_EDGES};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::acquisition::Schema;
use crate::pipeline::ConversionConfig;
use crate::source::{
    AcquisitionSource, PasefWindowRecord, ProviderError, ScanRange, TraceAxis, TraceKind,
};
use crate::spectrum::SpectrumArrays;

/// Requested spectrum resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Unprocessed sub-scan peaks (TDF only)
    #[default]
    Raw,
    /// Vendor centroiding
    Centroid,
    /// Vendor continuum trace
    Profile,
}

impl ExtractionMode {
    /// Whether spectra extracted in this mode are flagged centroided.
    pub fn is_centroided(&self) -> bool {
        !matches!(self, ExtractionMode::Profile)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Raw => write!(f, "raw"),
            ExtractionMode::Centroid => write!(f, "centroid"),
            ExtractionMode::Profile => write!(f, "profile"),
        }
    }
}

/// Outcome of an extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Peaks were found
    Arrays(SpectrumArrays),
    /// No usable peaks
    Empty,
}

impl Extraction {
    /// The arrays, if any.
    pub fn into_arrays(self) -> Option<SpectrumArrays> {
        match self {
            Extraction::Arrays(arrays) => Some(arrays),
            Extraction::Empty => None,
        }
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        matches!(self, Extraction::Empty)
    }
}

/// Extraction settings after schema-specific adjustments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionSettings {
    /// Effective resolution
    pub mode: ExtractionMode,
    /// Whether mobility is collapsed for every spectrum
    pub exclude_mobility: bool,
    /// Number of bins for profile spectra, 0 to keep the native trace
    pub profile_bins: usize,
    /// Bin width of the PASEF precursor merge
    pub pasef_bin_width: f64,
}

impl ExtractionSettings {
    /// Resolve the configured settings for a schema.
    ///
    /// Profile spectra are never mobility-resolved, and schemas without a raw
    /// trace fall back to centroid.
    pub fn resolve(config: &ConversionConfig, schema: Schema) -> Self {
        let mut mode = config.mode;
        let mut exclude_mobility = config.exclude_mobility || !schema.is_mobility_resolved();

        if mode == ExtractionMode::Profile && !exclude_mobility {
            info!("Profile mode cannot be mobility-resolved; excluding mobility arrays");
            exclude_mobility = true;
        }
        if mode == ExtractionMode::Raw && !schema.has_raw_trace() {
            info!("{schema} data has no raw trace; extracting centroided spectra");
            mode = ExtractionMode::Centroid;
        }

        Self {
            mode,
            exclude_mobility,
            profile_bins: config.profile_bins,
            pasef_bin_width: config.pasef_bin_width,
        }
    }
}

/// Reads peak arrays from an [`AcquisitionSource`].
pub struct ArrayExtractor<'a> {
    source: &'a dyn AcquisitionSource,
    settings: ExtractionSettings,
    pasef_edges: OnceLock<BinEdges>,
}

impl<'a> ArrayExtractor<'a> {
    /// Create an extractor.
    pub fn new(source: &'a dyn AcquisitionSource, settings: ExtractionSettings) -> Self {
        Self {
            source,
            settings,
            pasef_edges: OnceLock::new(),
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Edges of the PASEF precursor merge over the acquisition's m/z range,
    /// built on first use and shared by every precursor of the run.
    pub fn pasef_edges(&self) -> &BinEdges {
        self.pasef_edges.get_or_init(|| {
            let metadata = self.source.metadata();
            BinEdges::fixed_width(
                metadata.mz_acq_range_lower,
                metadata.mz_acq_range_upper,
                self.settings.pasef_bin_width,
            )
        })
    }

    /// Whether a spectrum that allows mobility will actually be mobility-resolved.
    pub fn resolves_mobility(&self, allow_mobility: bool) -> bool {
        allow_mobility && !self.settings.exclude_mobility && self.settings.mode != ExtractionMode::Profile
    }

    /// Extract a frame or a sub-scan range of it.
    ///
    /// `allow_mobility` is false for modes that are always collapsed (prmPASEF, MRM).
    pub fn extract(
        &self,
        frame: u32,
        range: Option<ScanRange>,
        allow_mobility: bool,
    ) -> Result<Extraction, ProviderError> {
        if self.resolves_mobility(allow_mobility) {
            let range = match range {
                Some(range) => range,
                None => self.full_range(frame)?,
            };
            self.extract_3d(frame, range)
        } else {
            self.extract_2d(frame, range)
        }
    }

    fn full_range(&self, frame: u32) -> Result<ScanRange, ProviderError> {
        let record = self.source.frame(frame)?;
        Ok(ScanRange::new(0, record.num_scans))
    }

    /// Mobility-collapsed extraction.
    pub fn extract_2d(&self, frame: u32, range: Option<ScanRange>) -> Result<Extraction, ProviderError> {
        let (mz, intensity) = match self.settings.mode {
            ExtractionMode::Raw => {
                let range = match range {
                    Some(range) => range,
                    None => self.full_range(frame)?,
                };
                let mut mz = Vec::new();
                let mut intensity = Vec::new();
                for scan in self.source.read_scans(frame, range)? {
                    if !scan.is_usable() {
                        continue;
                    }
                    mz.extend(self.calibrate(frame, &scan.positions)?);
                    intensity.extend(scan.intensities);
                }
                (mz, intensity)
            }
            ExtractionMode::Centroid => self.read_calibrated(frame, range, TraceKind::Centroid)?,
            ExtractionMode::Profile => {
                let (mz, intensity) = self.read_calibrated(frame, range, TraceKind::Profile)?;
                if self.settings.profile_bins > 0 && mz.len() == intensity.len() && !mz.is_empty() {
                    let (lo, hi) = min_max(&mz);
                    bin_spectrum(&mz, &intensity, &BinEdges::uniform(lo, hi, self.settings.profile_bins))
                } else {
                    (mz, intensity)
                }
            }
        };

        if mz.is_empty() || mz.len() != intensity.len() {
            return Ok(Extraction::Empty);
        }
        let (mz, intensity) = normalize_2d(mz, intensity);
        Ok(Extraction::Arrays(SpectrumArrays::new(mz, intensity)))
    }

    /// TOF indices to m/z; a result of a different length is a decoder fault.
    fn calibrate(&self, frame: u32, positions: &[f64]) -> Result<Vec<f64>, ProviderError> {
        let mz = self.source.index_to_mz(frame, positions)?;
        if mz.len() != positions.len() {
            return Err(ProviderError::DecodeError {
                frame,
                message: format!("{} m/z values for {} TOF indices", mz.len(), positions.len()),
            });
        }
        Ok(mz)
    }

    fn read_calibrated(
        &self,
        frame: u32,
        range: Option<ScanRange>,
        kind: TraceKind,
    ) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
        let trace = self.source.read_trace(frame, range, kind)?;
        let mz = match trace.axis {
            TraceAxis::Mz => trace.positions,
            TraceAxis::Index => self.calibrate(frame, &trace.positions)?,
        };
        Ok((mz, trace.intensities))
    }

    /// Mobility-resolved extraction over absolute sub-scan numbers.
    pub fn extract_3d(&self, frame: u32, range: ScanRange) -> Result<Extraction, ProviderError> {
        let mut peaks: Vec<(f64, f64, f64)> = Vec::new();
        for scan in self.source.read_scans(frame, range)? {
            if !scan.is_usable() {
                continue;
            }
            let mz = self.calibrate(frame, &scan.positions)?;
            let mobility = self
                .source
                .scan_to_mobility(frame, &[f64::from(scan.scan)])?
                .first()
                .copied()
                .ok_or_else(|| ProviderError::DecodeError {
                    frame,
                    message: format!("no mobility for scan {}", scan.scan),
                })?;
            peaks.extend(
                mz.into_iter()
                    .zip(scan.intensities)
                    .filter(|(m, i)| m.is_finite() && i.is_finite())
                    .map(|(m, i)| (m, mobility, i)),
            );
        }
        if peaks.is_empty() {
            return Ok(Extraction::Empty);
        }

        peaks.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.total_cmp(&b.2))
        });
        peaks.dedup();

        let mut mz = Vec::with_capacity(peaks.len());
        let mut intensity = Vec::with_capacity(peaks.len());
        let mut mobility = Vec::with_capacity(peaks.len());
        for (m, k, i) in peaks {
            mz.push(m);
            mobility.push(k);
            intensity.push(i);
        }
        Ok(Extraction::Arrays(SpectrumArrays::with_mobility(mz, intensity, mobility)))
    }

    /// Merge every PASEF isolation of one precursor into a single 2-D spectrum.
    ///
    /// Each window row is extracted over its sub-scan range; the concatenation
    /// is normalized and re-binned at the configured fixed width over the
    /// acquisition's m/z range.
    pub fn extract_pasef_precursor(&self, windows: &[PasefWindowRecord]) -> Result<Extraction, ProviderError> {
        let mut mz = Vec::new();
        let mut intensity = Vec::new();
        for window in windows {
            let range = ScanRange::new(window.scan_num_begin, window.scan_num_end);
            if let Extraction::Arrays(arrays) = self.extract_2d(window.frame, Some(range))? {
                mz.extend(arrays.mz);
                intensity.extend(arrays.intensity);
            }
        }
        if mz.is_empty() {
            return Ok(Extraction::Empty);
        }

        let (mz, intensity) = normalize_2d(mz, intensity);
        let (mz, intensity) = bin_spectrum(&mz, &intensity, self.pasef_edges());
        Ok(Extraction::Arrays(SpectrumArrays::new(mz, intensity)))
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Sort by `(m/z, intensity)`, drop exact duplicates, then sum the intensities of equal m/z.
///
/// Points with a non-finite m/z or intensity are dropped first.
pub fn normalize_2d(mz: Vec<f64>, intensity: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let total = mz.len();
    let mut pairs: Vec<(f64, f64)> = mz
        .into_iter()
        .zip(intensity)
        .filter(|(m, i)| m.is_finite() && i.is_finite())
        .collect();
    if pairs.len() < total {
        debug!("Dropped {} non-finite point(s)", total - pairs.len());
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pairs.dedup();

    let mut out_mz: Vec<f64> = Vec::with_capacity(pairs.len());
    let mut out_intensity: Vec<f64> = Vec::with_capacity(pairs.len());
    for (m, i) in pairs {
        match (out_mz.last(), out_intensity.last_mut()) {
            (Some(last), Some(total)) if *last == m => *total += i,
            _ => {
                out_mz.push(m);
                out_intensity.push(i);
            }
        }
    }
    (out_mz, out_intensity)
}
