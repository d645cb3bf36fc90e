//! # Conversion pipeline
//!
//! The [`Converter`] plans frame windows, builds each window with the
//! [`ScanRecordBuilder`](crate::builder::ScanRecordBuilder), orders the
//! records with [`link`] and streams them through a
//! [`StreamingSerializer`](crate::serializer::StreamingSerializer).
//!
//! ```text
//! frames ─plan─▶ windows ─build─▶ records ─link─▶ linked records ─emit─▶ sink
//! ```
//!
//! The spectrum count is declared up front from metadata
//! ([`expected_spectrum_count`]) and reconciled when the run finishes.

mod config;
mod converter;
mod count;
mod error;
mod linker;
mod stats;
mod summary;
mod window;


pub use config::{
    Compression, ConfigError, ConversionConfig, FloatWidth, GroupingMode, ImzmlMode, MAX_PASEF_MZ_SPAN,
};
pub use converter::{CancellationToken, ConversionPlan, Converter, ProcessedWindow};
pub use count::{expected_for_mode, expected_spectrum_count};
pub use error::ConversionError;
pub use linker::{link, LinkedRecord};
pub use stats::ConversionStats;
pub use summary::AcquisitionSummary;
pub use window::{plan_windows, FrameWindow};
