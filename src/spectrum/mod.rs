//! # Canonical spectrum records
//!
//! [`CanonicalSpectrum`] is the single record type every acquisition mode is
//! normalized into. It is validated on construction and immutable afterwards:
//! arrays are non-empty, of equal length and sorted by m/z, and the summary
//! statistics are computed once from the arrays.
//!
//! Scan numbers are deliberately absent. They are assigned at emission time
//! and travel alongside the record in
//! [`EmittedSpectrum`](crate::serializer::EmittedSpectrum).

mod error;


pub use error::SpectrumError;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::acquisition::AcquisitionMode;

/// Ion polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Positive ions
    Positive,
    /// Negative ions
    Negative,
}

impl Polarity {
    /// The other polarity.
    pub fn opposite(&self) -> Polarity {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
        }
    }
}

/// Spatial position of a MALDI spectrum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coordinate {
    /// Named spot on a target plate
    Spot(String),
    /// Imaging pixel
    Pixel {
        /// Column
        x: i64,
        /// Row
        y: i64,
        /// Layer, for 3-D imaging
        z: Option<i64>,
    },
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Spot(name) => f.write_str(name),
            Coordinate::Pixel { x, y, z: Some(z) } => write!(f, "{x}_{y}_{z}"),
            Coordinate::Pixel { x, y, z: None } => write!(f, "{x}_{y}"),
        }
    }
}

/// Survey or fragment spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// MS1
    Ms1,
    /// MS2 and higher
    MsN,
}

impl ScanType {
    /// Scan type of an MS level.
    pub fn from_ms_level(ms_level: u8) -> Self {
        if ms_level <= 1 {
            ScanType::Ms1
        } else {
            ScanType::MsN
        }
    }

    /// Controlled-vocabulary name.
    pub fn label(&self) -> &'static str {
        match self {
            ScanType::Ms1 => "MS1 spectrum",
            ScanType::MsN => "MSn spectrum",
        }
    }
}

/// Peak arrays of one spectrum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumArrays {
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensities
    pub intensity: Vec<f64>,
    /// Inverse reduced ion mobility (1/K0), for mobility-resolved spectra
    pub mobility: Option<Vec<f64>>,
}

impl SpectrumArrays {
    /// 2-D arrays.
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            mz,
            intensity,
            mobility: None,
        }
    }

    /// 3-D arrays.
    pub fn with_mobility(mz: Vec<f64>, intensity: Vec<f64>, mobility: Vec<f64>) -> Self {
        Self {
            mz,
            intensity,
            mobility: Some(mobility),
        }
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Whether there are no peaks.
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

/// Precursor and isolation information of a fragment spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecursorInfo {
    /// Isolation window target m/z
    pub target_mz: Option<f64>,
    /// Isolation window lower offset
    pub isolation_lower_offset: Option<f64>,
    /// Isolation window upper offset
    pub isolation_upper_offset: Option<f64>,
    /// Selected ion m/z
    pub selected_ion_mz: Option<f64>,
    /// Selected ion intensity
    pub selected_ion_intensity: Option<f64>,
    /// Selected ion inverse reduced mobility
    pub selected_ion_mobility: Option<f64>,
    /// Selected ion collision cross section
    pub selected_ion_ccs: Option<f64>,
    /// Selected ion charge
    pub charge_state: Option<i32>,
    /// Collision energy in eV
    pub collision_energy: Option<f64>,
}

impl PrecursorInfo {
    /// Isolation window centered on `target` with symmetric offsets of `width / 2`.
    pub fn isolation(target: Option<f64>, width: Option<f64>) -> Self {
        let half = width.map(|w| w / 2.0);
        Self {
            target_mz: target,
            isolation_lower_offset: half,
            isolation_upper_offset: half,
            ..Self::default()
        }
    }

    /// Whether the isolation window is described.
    pub fn has_isolation_window(&self) -> bool {
        self.target_mz.is_some()
    }

    /// Whether a selected ion is described.
    pub fn has_selected_ion(&self) -> bool {
        self.selected_ion_mz.is_some()
    }
}

/// Accept a vendor charge only when it is finite, integral and non-zero.
pub fn valid_charge(charge: Option<f64>) -> Option<i32> {
    let value = charge?;
    if !value.is_finite() || value == 0.0 || value.fract() != 0.0 {
        return None;
    }
    if value.abs() > f64::from(i32::MAX) {
        return None;
    }
    Some(value as i32)
}

/// Summary statistics derived from the arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumStats {
    /// Sum of intensities
    pub total_ion_current: f64,
    /// m/z of the most intense peak (first one on ties)
    pub base_peak_mz: f64,
    /// Intensity of the most intense peak
    pub base_peak_intensity: f64,
    /// Lowest m/z
    pub low_mz: f64,
    /// Highest m/z
    pub high_mz: f64,
}

impl SpectrumStats {
    /// Compute statistics over non-empty, m/z-sorted arrays.
    fn compute(mz: &[f64], intensity: &[f64]) -> Self {
        let mut base = 0;
        for (i, &value) in intensity.iter().enumerate() {
            if value > intensity[base] {
                base = i;
            }
        }
        Self {
            total_ion_current: intensity.iter().sum(),
            base_peak_mz: mz[base],
            base_peak_intensity: intensity[base],
            low_mz: mz[0],
            high_mz: mz[mz.len() - 1],
        }
    }
}

/// Everything about a spectrum except its arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumHeader {
    /// Frame the spectrum was read from
    pub frame: u32,
    /// MS1 frame of the precursor
    pub parent_frame: Option<u32>,
    /// Sub-scan of the precursor apex
    pub parent_scan: Option<u32>,
    /// Acquisition mode of the spectrum
    pub mode: AcquisitionMode,
    /// Whether the arrays are centroided
    pub centroided: bool,
    /// Ion polarity
    pub polarity: Polarity,
    /// Retention time in minutes, 0 for MALDI
    pub retention_time: f64,
    /// MALDI position
    pub coordinate: Option<Coordinate>,
    /// Precursor information of fragment spectra
    pub precursor: Option<PrecursorInfo>,
}

impl SpectrumHeader {
    /// Header with no linkage, coordinate or precursor.
    pub fn new(frame: u32, mode: AcquisitionMode, polarity: Polarity, centroided: bool) -> Self {
        Self {
            frame,
            parent_frame: None,
            parent_scan: None,
            mode,
            centroided,
            polarity,
            retention_time: 0.0,
            coordinate: None,
            precursor: None,
        }
    }
}

/// Validated, immutable spectrum record.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSpectrum {
    header: SpectrumHeader,
    arrays: SpectrumArrays,
    stats: SpectrumStats,
}

impl CanonicalSpectrum {
    /// Validate the arrays and build the record.
    ///
    /// m/z must be strictly ascending for 2-D spectra and non-decreasing for
    /// mobility-resolved ones.
    pub fn new(header: SpectrumHeader, arrays: SpectrumArrays) -> Result<Self, SpectrumError> {
        let frame = header.frame;
        if arrays.mz.is_empty() {
            return Err(SpectrumError::Empty { frame });
        }
        if arrays.mz.len() != arrays.intensity.len() {
            return Err(SpectrumError::LengthMismatch {
                frame,
                mz: arrays.mz.len(),
                intensity: arrays.intensity.len(),
            });
        }
        if let Some(mobility) = &arrays.mobility {
            if mobility.len() != arrays.mz.len() {
                return Err(SpectrumError::MobilityLengthMismatch {
                    frame,
                    mz: arrays.mz.len(),
                    mobility: mobility.len(),
                });
            }
        }

        if let Some(index) = arrays.mz.iter().position(|mz| !mz.is_finite()) {
            return Err(SpectrumError::NonFiniteMz {
                frame,
                index,
                value: arrays.mz[index],
            });
        }

        let strict = arrays.mobility.is_none();
        let out_of_order = arrays.mz.windows(2).position(|pair| {
            match pair[0].partial_cmp(&pair[1]) {
                Some(Ordering::Less) => false,
                Some(Ordering::Equal) => strict,
                _ => true,
            }
        });
        if let Some(index) = out_of_order {
            return Err(SpectrumError::NotAscending { frame, index: index + 1 });
        }

        let stats = SpectrumStats::compute(&arrays.mz, &arrays.intensity);
        Ok(Self { header, arrays, stats })
    }

    /// Source frame.
    pub fn frame(&self) -> u32 {
        self.header.frame
    }

    /// Parent MS1 frame.
    pub fn parent_frame(&self) -> Option<u32> {
        self.header.parent_frame
    }

    /// Precursor apex sub-scan.
    pub fn parent_scan(&self) -> Option<u32> {
        self.header.parent_scan
    }

    /// Acquisition mode.
    pub fn mode(&self) -> AcquisitionMode {
        self.header.mode
    }

    /// MS level.
    pub fn ms_level(&self) -> u8 {
        self.header.mode.ms_level()
    }

    /// Scan type.
    pub fn scan_type(&self) -> ScanType {
        ScanType::from_ms_level(self.ms_level())
    }

    /// Whether the arrays are centroided.
    pub fn centroided(&self) -> bool {
        self.header.centroided
    }

    /// Ion polarity.
    pub fn polarity(&self) -> Polarity {
        self.header.polarity
    }

    /// Retention time in minutes.
    pub fn retention_time(&self) -> f64 {
        self.header.retention_time
    }

    /// MALDI position.
    pub fn coordinate(&self) -> Option<&Coordinate> {
        self.header.coordinate.as_ref()
    }

    /// Precursor information.
    pub fn precursor(&self) -> Option<&PrecursorInfo> {
        self.header.precursor.as_ref()
    }

    /// Fragment spectrum without a resolvable precursor ion (bbCID, isCID).
    pub fn ms2_no_precursor(&self) -> bool {
        self.header.mode.lacks_precursor()
    }

    /// Header fields.
    pub fn header(&self) -> &SpectrumHeader {
        &self.header
    }

    /// Peak arrays.
    pub fn arrays(&self) -> &SpectrumArrays {
        &self.arrays
    }

    /// m/z array.
    pub fn mz(&self) -> &[f64] {
        &self.arrays.mz
    }

    /// Intensity array.
    pub fn intensity(&self) -> &[f64] {
        &self.arrays.intensity
    }

    /// Mobility array.
    pub fn mobility(&self) -> Option<&[f64]> {
        self.arrays.mobility.as_deref()
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Always false; empty spectra cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Summary statistics.
    pub fn stats(&self) -> &SpectrumStats {
        &self.stats
    }

    /// Total ion current.
    pub fn total_ion_current(&self) -> f64 {
        self.stats.total_ion_current
    }

    /// Base peak `(m/z, intensity)`.
    pub fn base_peak(&self) -> (f64, f64) {
        (self.stats.base_peak_mz, self.stats.base_peak_intensity)
    }
}
