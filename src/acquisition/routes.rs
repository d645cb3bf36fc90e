//! The route table behind [`AcquisitionClassifier`](super::AcquisitionClassifier).
//!
//! Routes are tried in order and the first match wins, so specific code pairs
//! must precede the wildcard entries of the same schema. Adding an acquisition
//! mode means adding a row here and a strategy in the builder.

use super::{AcquisitionMode, Schema, MS2_MSMS_TYPES};

/// Layout component of a route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// LC-MS acquisitions
    LcMs,
    /// MALDI acquisitions of either application type
    Maldi,
}

/// Pattern over one integer code of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePattern {
    /// Matches every code
    Any,
    /// Matches exactly this code
    Is(i32),
    /// Matches any code of the set
    OneOf(&'static [i32]),
}

impl CodePattern {
    /// Whether `code` satisfies the pattern.
    pub fn matches(&self, code: i32) -> bool {
        match self {
            CodePattern::Any => true,
            CodePattern::Is(expected) => *expected == code,
            CodePattern::OneOf(set) => set.contains(&code),
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    /// Schema the row applies to
    pub schema: Schema,
    /// Layout the row applies to
    pub layout: LayoutKind,
    /// Scan mode pattern
    pub scan_mode: CodePattern,
    /// MS/MS type pattern
    pub msms_type: CodePattern,
    /// Resulting mode
    pub mode: AcquisitionMode,
}

impl Route {
    const fn new(
        schema: Schema,
        layout: LayoutKind,
        scan_mode: CodePattern,
        msms_type: CodePattern,
        mode: AcquisitionMode,
    ) -> Self {
        Self {
            schema,
            layout,
            scan_mode,
            msms_type,
            mode,
        }
    }

    /// Whether the row covers the given key.
    pub fn matches(&self, schema: Schema, layout: LayoutKind, scan_mode: i32, msms_type: i32) -> bool {
        self.schema == schema
            && self.layout == layout
            && self.scan_mode.matches(scan_mode)
            && self.msms_type.matches(msms_type)
    }
}

use AcquisitionMode as M;
use CodePattern::{Any, Is, OneOf};
use LayoutKind::{LcMs, Maldi};
use Schema::{Baf, Tdf, Tsf};

const MS2: CodePattern = OneOf(MS2_MSMS_TYPES);

/// Classification table. BAF frames carry no MS/MS type, so only their scan mode is keyed.
pub static ROUTES: &[Route] = &[
    // timsTOF, mobility-resolved
    Route::new(Tdf, LcMs, Is(8), Is(0), M::DdaPasefPrecursor),
    Route::new(Tdf, LcMs, Is(9), Is(9), M::DiaPasef),
    Route::new(Tdf, LcMs, Is(4), Is(2), M::BbCid),
    Route::new(Tdf, LcMs, Is(2), Is(2), M::Mrm),
    Route::new(Tdf, LcMs, Is(10), Is(10), M::PrmPasef),
    Route::new(Tdf, LcMs, Any, Is(0), M::Ms1),
    // timsTOF, mobility-collapsed
    Route::new(Tsf, LcMs, Any, Is(0), M::Ms1),
    Route::new(Tsf, LcMs, Is(1), MS2, M::DdaPasefProduct),
    Route::new(Tsf, LcMs, Is(4), MS2, M::BbCid),
    Route::new(Tsf, LcMs, Is(2), MS2, M::Mrm),
    // otofControl
    Route::new(Baf, LcMs, Is(0), Any, M::Ms1),
    Route::new(Baf, LcMs, Is(2), Any, M::DdaPasefProduct),
    Route::new(Baf, LcMs, Is(4), Any, M::IsCid),
    Route::new(Baf, LcMs, Is(5), Any, M::BbCid),
    // MALDI
    Route::new(Tdf, Maldi, Any, Is(0), M::MaldiMs1),
    Route::new(Tdf, Maldi, Any, MS2, M::MaldiMs2),
    Route::new(Tsf, Maldi, Any, Is(0), M::MaldiMs1),
    Route::new(Tsf, Maldi, Any, MS2, M::MaldiMs2),
];
