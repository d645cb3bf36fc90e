//! Rows of the vendor metadata tables, one struct per table.
//!
//! Field names follow the vendor column names in snake case. Charges are kept
//! as `Option<f64>` because the vendor stores them as nullable reals; a missing
//! or NaN charge is a normal occurrence, not an error.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use crate::acquisition::{Layout, MaldiApplication, Schema};
use crate::spectrum::Polarity;

/// File-level metadata (`GlobalMetadata` table plus schema detection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetadata {
    /// Storage schema
    pub schema: Schema,
    /// MALDI application type, absent for LC-MS
    #[serde(default)]
    pub maldi_application: Option<MaldiApplication>,
    /// Lower bound of the acquired m/z range
    pub mz_acq_range_lower: f64,
    /// Upper bound of the acquired m/z range
    pub mz_acq_range_upper: f64,
    /// Acquisition software name
    #[serde(default)]
    pub acquisition_software: Option<String>,
    /// Acquisition software version
    #[serde(default)]
    pub acquisition_software_version: Option<String>,
    /// Instrument model name
    #[serde(default)]
    pub instrument_name: Option<String>,
    /// Instrument serial number
    #[serde(default)]
    pub instrument_serial_number: Option<String>,
    /// Vendor ion source code
    #[serde(default)]
    pub instrument_source_type: Option<i32>,
    /// Acquisition start, RFC 3339 or `YYYY-MM-DDTHH:MM:SS`
    #[serde(default)]
    pub acquisition_date_time: Option<String>,
    /// Sample name entered at acquisition time
    #[serde(default)]
    pub sample_name: Option<String>,
}

impl Default for GlobalMetadata {
    fn default() -> Self {
        Self {
            schema: Schema::Tdf,
            maldi_application: None,
            mz_acq_range_lower: 100.0,
            mz_acq_range_upper: 1700.0,
            acquisition_software: None,
            acquisition_software_version: None,
            instrument_name: None,
            instrument_serial_number: None,
            instrument_source_type: None,
            acquisition_date_time: None,
            sample_name: None,
        }
    }
}

impl GlobalMetadata {
    /// Acquisition layout derived from the MALDI application type.
    pub fn layout(&self) -> Layout {
        match self.maldi_application {
            Some(application) => Layout::Maldi(application),
            None => Layout::LcMs,
        }
    }

    /// Parse the acquisition start time.
    ///
    /// Timestamps without an offset are taken as UTC. Unparseable values yield `None`.
    pub fn acquisition_start(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.acquisition_date_time.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed);
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
    }
}

/// Polarity as stored by the vendor.
///
/// TDF and TSF store a `+`/`-` symbol; BAF stores an integer code whose sign
/// convention is resolved through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolarityCode {
    /// `+` or `-`
    Symbol(String),
    /// BAF acquisition-key code
    Code(i64),
}

impl PolarityCode {
    /// Resolve to a polarity. Integer code 0 maps to `code_zero` and 1 to its opposite.
    pub fn resolve(&self, code_zero: Polarity) -> Result<Polarity, ProviderError> {
        match self {
            PolarityCode::Symbol(symbol) => match symbol.trim() {
                "+" => Ok(Polarity::Positive),
                "-" => Ok(Polarity::Negative),
                other => Err(ProviderError::invalid("Polarity", other)),
            },
            PolarityCode::Code(0) => Ok(code_zero),
            PolarityCode::Code(1) => Ok(code_zero.opposite()),
            PolarityCode::Code(other) => Err(ProviderError::invalid("Polarity", other)),
        }
    }
}

/// One row of the `Frames` (TDF/TSF) or `Spectra` (BAF) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Frame id, 1-based in vendor files
    pub id: u32,
    /// Retention time in seconds
    pub time: f64,
    /// Scan mode code of the acquisition method
    pub scan_mode: i32,
    /// MS/MS type code (always 0 for BAF)
    #[serde(default)]
    pub msms_type: i32,
    /// Polarity code
    pub polarity: PolarityCode,
    /// Number of mobility sub-scans (TDF only)
    #[serde(default)]
    pub num_scans: u32,
    /// Parent spectrum (BAF only)
    #[serde(default)]
    pub parent: Option<u32>,
}

/// One row of the ddaPASEF `Precursors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecursorRecord {
    /// Precursor id
    pub id: u32,
    /// MS1 frame the precursor was picked from
    pub parent: u32,
    /// Mobility sub-scan of the precursor apex (fractional)
    pub scan_number: f64,
    /// Intensity-weighted m/z of the isotope envelope
    pub average_mz: f64,
    /// m/z of the most intense isotope peak
    pub largest_peak_mz: f64,
    /// Monoisotopic m/z when the charge could be determined
    #[serde(default)]
    pub monoisotopic_mz: Option<f64>,
    /// Apex intensity
    pub intensity: f64,
    /// Charge state, absent when undetermined
    #[serde(default)]
    pub charge: Option<f64>,
}

/// One row of `PasefFrameMsMsInfo`: a precursor isolated in one fragment frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasefWindowRecord {
    /// Fragment frame
    pub frame: u32,
    /// First sub-scan of the isolation (inclusive)
    pub scan_num_begin: u32,
    /// Last sub-scan of the isolation (exclusive)
    pub scan_num_end: u32,
    /// Isolation center
    pub isolation_mz: f64,
    /// Full isolation width
    pub isolation_width: f64,
    /// Collision energy in eV
    #[serde(default)]
    pub collision_energy: Option<f64>,
    /// Precursor id
    pub precursor: u32,
}

/// One row of `DiaFrameMsMsInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaFrameRecord {
    /// Frame id
    pub frame: u32,
    /// Window group the frame cycles through
    pub window_group: u32,
}

/// One row of `DiaFrameMsMsWindows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaWindowRecord {
    /// Window group
    pub window_group: u32,
    /// First sub-scan (inclusive)
    pub scan_num_begin: u32,
    /// Last sub-scan (exclusive)
    pub scan_num_end: u32,
    /// Isolation center
    pub isolation_mz: f64,
    /// Full isolation width
    pub isolation_width: f64,
    /// Collision energy in eV
    #[serde(default)]
    pub collision_energy: Option<f64>,
}

/// One row of `PrmFrameMsMsInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrmFrameRecord {
    /// Frame id
    pub frame: u32,
    /// First sub-scan (inclusive)
    pub scan_num_begin: u32,
    /// Last sub-scan (exclusive)
    pub scan_num_end: u32,
    /// Isolation center
    pub isolation_mz: f64,
    /// Full isolation width
    pub isolation_width: f64,
    /// Collision energy in eV
    #[serde(default)]
    pub collision_energy: Option<f64>,
    /// `PrmTargets` id
    pub target: u32,
}

/// One row of `PrmTargets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrmTargetRecord {
    /// Target id
    pub id: u32,
    /// Expected inverse reduced mobility
    pub one_over_k0: f64,
    /// Charge state, absent when unknown
    #[serde(default)]
    pub charge: Option<f64>,
}

/// One row of `FrameMsMsInfo` (bbCID, MRM, TSF auto MS/MS, MALDI MS/MS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMsMsInfoRecord {
    /// Frame id
    pub frame: u32,
    /// Parent MS1 frame, when the method records one
    #[serde(default)]
    pub parent: Option<u32>,
    /// Trigger (isolation) m/z
    #[serde(default)]
    pub trigger_mass: Option<f64>,
    /// Full isolation width
    #[serde(default)]
    pub isolation_width: Option<f64>,
    /// Precursor charge
    #[serde(default)]
    pub precursor_charge: Option<f64>,
    /// Collision energy in eV
    #[serde(default)]
    pub collision_energy: Option<f64>,
}

/// One row of `MaldiFrameInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaldiFrameRecord {
    /// Frame id
    pub frame: u32,
    /// Target plate spot, e.g. `B7`
    #[serde(default)]
    pub spot_name: String,
    /// Pixel column
    #[serde(default)]
    pub x_index_pos: i64,
    /// Pixel row
    #[serde(default)]
    pub y_index_pos: i64,
    /// Pixel layer, present only for 3-D imaging runs
    #[serde(default)]
    pub z_index_pos: Option<i64>,
}

/// Variables of the BAF `Variables` table that the converter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BafVariable {
    /// Collision energy (variable 5)
    CollisionEnergy,
    /// Precursor charge (variable 6)
    PrecursorCharge,
    /// Isolation target m/z (variable 7)
    IsolationTarget,
    /// Isolation width (variable 8)
    IsolationWidth,
}

impl BafVariable {
    /// Numeric variable id in the `Variables` table.
    pub fn id(&self) -> u32 {
        match self {
            BafVariable::CollisionEnergy => 5,
            BafVariable::PrecursorCharge => 6,
            BafVariable::IsolationTarget => 7,
            BafVariable::IsolationWidth => 8,
        }
    }
}

/// One row of the BAF `Variables` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BafVariableRecord {
    /// Spectrum id
    pub spectrum: u32,
    /// Variable id
    pub variable: u32,
    /// Value
    pub value: f64,
}

/// One row of the BAF `Steps` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BafStepRecord {
    /// Product spectrum the step targets
    pub target_spectrum: u32,
    /// Selected precursor mass
    pub mass: f64,
}
