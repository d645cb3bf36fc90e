//! # Acquisition sources
//!
//! The vendor library is consumed through [`AcquisitionSource`]: a read-only
//! provider of metadata rows keyed by frame id and of decoded peak arrays.
//! The conversion engine never touches vendor files directly.
//!
//! [`InMemoryAcquisition`] is the provider shipped with the crate. It is built
//! from an [`AcquisitionDump`], a JSON export of the vendor tables together
//! with decoded per-sub-scan peak lists, and applies linear calibrations.
//!
//! Implementations must be `Send + Sync`: with the `parallel` feature several
//! windows are extracted concurrently against one shared provider.

mod calibration;
mod error;
mod memory;
mod records;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;

pub use calibration::{one_over_k0_to_ccs, Calibration};
pub use error::ProviderError;
pub use memory::{AcquisitionDump, FramePeaks, InMemoryAcquisition, ProfileTrace};
pub use records::{
    BafStepRecord, BafVariable, BafVariableRecord, DiaFrameRecord, DiaWindowRecord,
    FrameMsMsInfoRecord, FrameRecord, GlobalMetadata, MaldiFrameRecord, PasefWindowRecord,
    PolarityCode, PrecursorRecord, PrmFrameRecord, PrmTargetRecord,
};

use serde::{Deserialize, Serialize};

/// Half-open range `[begin, end)` of mobility sub-scan numbers within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRange {
    /// First sub-scan (inclusive)
    pub begin: u32,
    /// Last sub-scan (exclusive)
    pub end: u32,
}

impl ScanRange {
    /// Create a range.
    pub fn new(begin: u32, end: u32) -> Self {
        Self { begin, end }
    }

    /// Whether `scan` falls inside the range.
    pub fn contains(&self, scan: u32) -> bool {
        scan >= self.begin && scan < self.end
    }

    /// Whether the range holds no sub-scan.
    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

/// Peaks of one mobility sub-scan as stored by the instrument.
///
/// `positions` are TOF indices for TDF raw data. Lengths of the two vectors
/// are not guaranteed to agree; the extractor drops mismatched sub-scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScan {
    /// Absolute sub-scan number within the frame
    pub scan: u32,
    /// Peak positions (TOF index)
    pub positions: Vec<f64>,
    /// Peak intensities
    pub intensities: Vec<f64>,
}

impl SubScan {
    /// Whether the sub-scan carries usable peaks.
    pub fn is_usable(&self) -> bool {
        !self.positions.is_empty() && self.positions.len() == self.intensities.len()
    }
}

/// Which vendor trace to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// Line spectrum
    Centroid,
    /// Continuum spectrum
    Profile,
}

/// Unit of the position axis returned by [`AcquisitionSource::read_trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAxis {
    /// TOF index, still to be calibrated
    Index,
    /// Already calibrated m/z
    Mz,
}

/// A centroid or profile trace of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrace {
    /// Unit of `positions`
    pub axis: TraceAxis,
    /// Positions on `axis`
    pub positions: Vec<f64>,
    /// Intensities
    pub intensities: Vec<f64>,
}

impl DecodedTrace {
    /// Trace with no points.
    pub fn empty(axis: TraceAxis) -> Self {
        Self {
            axis,
            positions: Vec::new(),
            intensities: Vec::new(),
        }
    }
}

/// Read-only provider of acquisition metadata and decoded arrays.
///
/// Lookups return empty collections or `None` when the table simply has no row
/// for the key; `Err` is reserved for faults (I/O, decoder failures, dangling
/// references that the caller cannot skip).
pub trait AcquisitionSource: Send + Sync {
    /// File-level metadata.
    fn metadata(&self) -> &GlobalMetadata;

    /// All frame ids in ascending order.
    fn frame_ids(&self) -> Vec<u32>;

    /// Frame table row.
    fn frame(&self, id: u32) -> Result<FrameRecord, ProviderError>;

    /// ddaPASEF precursors picked from MS1 frame `parent`, in id order.
    fn precursors(&self, parent: u32) -> Vec<PrecursorRecord>;

    /// Fragment-frame isolations of one precursor, in frame order.
    fn pasef_windows(&self, precursor: u32) -> Vec<PasefWindowRecord>;

    /// diaPASEF isolation windows of a frame's window group.
    fn dia_windows(&self, frame: u32) -> Vec<DiaWindowRecord>;

    /// prmPASEF isolation of a frame.
    fn prm_frame(&self, frame: u32) -> Option<PrmFrameRecord>;

    /// prmPASEF target row.
    fn prm_target(&self, id: u32) -> Option<PrmTargetRecord>;

    /// `FrameMsMsInfo` row of a frame.
    fn frame_msms_info(&self, frame: u32) -> Option<FrameMsMsInfoRecord>;

    /// MALDI spot row of a frame.
    fn maldi_frame(&self, frame: u32) -> Option<MaldiFrameRecord>;

    /// Value of a BAF acquisition variable for a spectrum.
    fn baf_variable(&self, spectrum: u32, variable: BafVariable) -> Option<f64>;

    /// BAF step (selected precursor mass) targeting a spectrum.
    fn baf_step(&self, spectrum: u32) -> Option<BafStepRecord>;

    /// Decode the sub-scans of `frame` that fall in `range`, in scan order.
    fn read_scans(&self, frame: u32, range: ScanRange) -> Result<Vec<SubScan>, ProviderError>;

    /// Read the centroid or profile trace of a frame, optionally restricted to a sub-scan range.
    fn read_trace(
        &self,
        frame: u32,
        range: Option<ScanRange>,
        kind: TraceKind,
    ) -> Result<DecodedTrace, ProviderError>;

    /// Convert TOF indices to m/z with the frame's calibration.
    fn index_to_mz(&self, frame: u32, indices: &[f64]) -> Result<Vec<f64>, ProviderError>;

    /// Convert (possibly fractional) sub-scan numbers to inverse reduced mobility.
    fn scan_to_mobility(&self, frame: u32, scans: &[f64]) -> Result<Vec<f64>, ProviderError>;

    /// Collision cross section in Å² for an ion of the given mobility, charge and m/z.
    fn mobility_to_ccs(&self, one_over_k0: f64, charge: i32, mz: f64) -> f64;
}
