//! # timsconvert - Bruker acquisitions to mzML and imzML
//!
//! `timsconvert` streams the spectra of Bruker timsTOF (TDF, TSF) and
//! otofControl (BAF) acquisitions into HUPO-PSI mzML, or into imzML for
//! MALDI imaging runs.
//!
//! ## Key Features
//!
//! - **One classification table**: every frame is routed by its schema,
//!   layout and vendor code pair to one acquisition mode (MS1, ddaPASEF,
//!   diaPASEF, prm-PASEF, bbCID, isCID, MRM, MALDI MS1/MS2).
//!
//! - **Bounded memory**: frames are processed in windows bounded by survey
//!   frames, and spectra leave for the output as soon as their window is done.
//!
//! - **Linked fragments**: ddaPASEF product spectra are written directly
//!   after their survey spectrum and reference it by scan number.
//!
//! - **Honest counts**: the spectrum count is declared from metadata and
//!   corrected when empty spectra were dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use timsconvert::mzml::MzMLSink;
//! use timsconvert::pipeline::{ConversionConfig, Converter};
//! use timsconvert::serializer::RunMetadata;
//! use timsconvert::source::{AcquisitionSource, InMemoryAcquisition};
//!
//! let input = Path::new("sample.d.json");
//! let source = InMemoryAcquisition::from_path(input)?;
//! let config = ConversionConfig::default();
//! let run = RunMetadata::new(source.metadata(), input, "sample", config.mode, false, false);
//!
//! let converter = Converter::new(&source, config)?;
//! let stats = converter.convert(MzMLSink::create("out", "sample")?, &run)?;
//! println!("{stats}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`acquisition`]: frame classification route table
//! - [`source`]: the acquisition access interface and an in-memory implementation
//! - [`extract`]: peak array extraction and binning
//! - [`builder`]: per-mode spectrum record construction
//! - [`pipeline`]: window planning, precursor linking and the converter
//! - [`serializer`]: scan numbering and count reconciliation over a sink
//! - [`mzml`] / [`imzml`]: output documents
//! - [`imaging`]: MALDI plate maps and output grouping
//! - [`controlled_vocabulary`]: PSI-MS, UO and IMS terms

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod acquisition;
pub mod builder;
pub mod controlled_vocabulary;
pub mod extract;
pub mod imaging;
#[cfg(feature = "mzml")]
pub mod imzml;
#[cfg(feature = "mzml")]
pub mod mzml;
pub mod pipeline;
pub mod serializer;
pub mod source;
pub mod spectrum;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::acquisition::{AcquisitionClassifier, AcquisitionMode, Layout, MaldiApplication, Schema};
    pub use crate::controlled_vocabulary::{ims_terms, ms_terms, unit_terms, CvParamList, CvTerm};
    pub use crate::extract::{ArrayExtractor, ExtractionMode, ExtractionSettings};
    pub use crate::imaging::{plan_groups, OutputGroup, PlateMap, PlateMapError};
    #[cfg(feature = "mzml")]
    pub use crate::imzml::ImzmlSink;
    #[cfg(feature = "mzml")]
    pub use crate::mzml::MzMLSink;
    pub use crate::pipeline::{
        AcquisitionSummary, CancellationToken, Compression, ConversionConfig, ConversionError,
        ConversionStats, Converter, FloatWidth, GroupingMode, ImzmlMode,
    };
    pub use crate::serializer::{
        MemorySink, RunMetadata, SinkError, SpectrumSink, StreamingSerializer, WriteOptions,
    };
    pub use crate::source::{AcquisitionSource, InMemoryAcquisition, ProviderError};
    pub use crate::spectrum::{CanonicalSpectrum, Coordinate, Polarity, PrecursorInfo};
}
