//! # Acquisition classification
//!
//! Every frame stored by the instrument carries a pair of integer codes: the
//! scan mode the method was running and the MS/MS type of the frame. Together
//! with the schema of the file (TDF, TSF or BAF) and the acquisition layout
//! (LC-MS or MALDI) they determine how a frame becomes spectra.
//!
//! [`AcquisitionClassifier`] maps those codes to an [`AcquisitionMode`] through
//! a single static route table (see [`routes`]). Frames whose codes match no
//! route are administrative or calibration frames and produce no spectrum.
//!
//! ```
//! use timsconvert::acquisition::{AcquisitionClassifier, AcquisitionMode, Layout, Schema};
//!
//! let classifier = AcquisitionClassifier::new(Schema::Tdf, Layout::LcMs);
//! assert_eq!(classifier.classify(9, 9), Some(AcquisitionMode::DiaPasef));
//! assert_eq!(classifier.classify(8, 8), None);
//! ```

mod routes;

#[cfg(test)]
mod tests;

pub use routes::{CodePattern, LayoutKind, Route, ROUTES};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::source::FrameRecord;

/// MS/MS type codes that denote fragment spectra in TDF and TSF frame tables.
pub const MS2_MSMS_TYPES: &[i32] = &[2, 8, 9, 10];

/// Storage schema of the acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Mobility-resolved timsTOF data (`analysis.tdf`)
    Tdf,
    /// Mobility-collapsed timsTOF data (`analysis.tsf`)
    Tsf,
    /// otofControl data exported through Baf2Sql (`analysis.baf`)
    Baf,
}

impl Schema {
    /// Whether frames of this schema are split into mobility sub-scans.
    pub fn is_mobility_resolved(&self) -> bool {
        matches!(self, Schema::Tdf)
    }

    /// Whether the vendor stores a raw trace separate from the centroided one.
    ///
    /// Only TDF has one; raw extraction on the other schemas means centroid.
    pub fn has_raw_trace(&self) -> bool {
        matches!(self, Schema::Tdf)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Tdf => write!(f, "TDF"),
            Schema::Tsf => write!(f, "TSF"),
            Schema::Baf => write!(f, "BAF"),
        }
    }
}

/// How MALDI spots were acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaldiApplication {
    /// Dried-droplet spots on a target plate, addressed by spot name
    SingleSpectra,
    /// Rastered imaging run, addressed by pixel indices
    Imaging,
}

/// Acquisition layout: liquid chromatography or MALDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Time-resolved LC-MS(/MS)
    LcMs,
    /// Spatially-resolved MALDI
    Maldi(MaldiApplication),
}

impl Layout {
    /// Collapse the MALDI application into the layout kind used for routing.
    pub fn kind(&self) -> LayoutKind {
        match self {
            Layout::LcMs => LayoutKind::LcMs,
            Layout::Maldi(_) => LayoutKind::Maldi,
        }
    }

    /// Whether spectra of this layout carry a spatial coordinate instead of a retention time.
    pub fn is_maldi(&self) -> bool {
        matches!(self, Layout::Maldi(_))
    }
}

/// The closed set of acquisition modes a frame can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Survey scan without fragmentation
    Ms1,
    /// ddaPASEF survey frame that owns PASEF precursors
    DdaPasefPrecursor,
    /// Data-dependent product spectrum linked to a parent frame
    DdaPasefProduct,
    /// diaPASEF frame split into isolation windows
    DiaPasef,
    /// Targeted prm-PASEF frame
    PrmPasef,
    /// Broadband collision-induced dissociation
    BbCid,
    /// In-source collision-induced dissociation
    IsCid,
    /// Multiple-reaction monitoring
    Mrm,
    /// MALDI survey spectrum
    MaldiMs1,
    /// MALDI fragment spectrum
    MaldiMs2,
}

impl AcquisitionMode {
    /// All variants in table order.
    pub const ALL: [AcquisitionMode; 10] = [
        AcquisitionMode::Ms1,
        AcquisitionMode::DdaPasefPrecursor,
        AcquisitionMode::DdaPasefProduct,
        AcquisitionMode::DiaPasef,
        AcquisitionMode::PrmPasef,
        AcquisitionMode::BbCid,
        AcquisitionMode::IsCid,
        AcquisitionMode::Mrm,
        AcquisitionMode::MaldiMs1,
        AcquisitionMode::MaldiMs2,
    ];

    /// MS level of the spectra the frame itself yields.
    ///
    /// A ddaPASEF precursor frame is an MS1 frame; its PASEF products are
    /// built alongside it but are MS2.
    pub fn ms_level(&self) -> u8 {
        match self {
            AcquisitionMode::Ms1 | AcquisitionMode::DdaPasefPrecursor | AcquisitionMode::MaldiMs1 => 1,
            _ => 2,
        }
    }

    /// Whether the mode produces fragment spectra without a resolvable precursor ion.
    pub fn lacks_precursor(&self) -> bool {
        matches!(self, AcquisitionMode::BbCid | AcquisitionMode::IsCid)
    }

    /// Whether the frame marks an MS1 boundary for window planning.
    pub fn is_survey(&self) -> bool {
        self.ms_level() == 1
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionMode::Ms1 => "MS1",
            AcquisitionMode::DdaPasefPrecursor => "ddaPASEF precursor",
            AcquisitionMode::DdaPasefProduct => "ddaPASEF product",
            AcquisitionMode::DiaPasef => "diaPASEF",
            AcquisitionMode::PrmPasef => "prmPASEF",
            AcquisitionMode::BbCid => "bbCID",
            AcquisitionMode::IsCid => "isCID",
            AcquisitionMode::Mrm => "MRM",
            AcquisitionMode::MaldiMs1 => "MALDI MS1",
            AcquisitionMode::MaldiMs2 => "MALDI MS2",
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps frame code pairs to acquisition modes for one file.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionClassifier {
    schema: Schema,
    layout: Layout,
}

impl AcquisitionClassifier {
    /// Create a classifier for a file of the given schema and layout.
    pub fn new(schema: Schema, layout: Layout) -> Self {
        Self { schema, layout }
    }

    /// Schema this classifier routes for.
    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Layout this classifier routes for.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Classify a `(scan_mode, msms_type)` pair.
    ///
    /// Returns `None` for pairs no route covers; callers skip such frames.
    pub fn classify(&self, scan_mode: i32, msms_type: i32) -> Option<AcquisitionMode> {
        let kind = self.layout.kind();
        ROUTES
            .iter()
            .find(|route| route.matches(self.schema, kind, scan_mode, msms_type))
            .map(|route| route.mode)
    }

    /// Classify a frame record.
    pub fn classify_frame(&self, frame: &FrameRecord) -> Option<AcquisitionMode> {
        self.classify(frame.scan_mode, frame.msms_type)
    }
}
