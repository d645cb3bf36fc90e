use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::{BinEdges, ExtractionMode, MAX_BIN_EDGES};
use crate::serializer::WriteOptions;
use crate::spectrum::Polarity;

/// Errors raised while validating a [`ConversionConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `chunk_size` must be at least 1
    #[error("chunk_size must be at least 1")]
    ZeroChunkSize,

    /// PASEF bin width must be positive and finite
    #[error("PASEF bin width must be positive, got {0}")]
    InvalidBinWidth(f64),

    /// PASEF bin width would need more bins than allowed over the widest m/z range
    #[error("PASEF bin width {width} needs {bins} bins over {span} m/z, more than {max}", max = MAX_BIN_EDGES)]
    BinWidthTooSmall {
        /// Requested width
        width: f64,
        /// m/z span checked against
        span: f64,
        /// Bins the width would need
        bins: usize,
    },

    /// At least one worker is required
    #[error("workers must be at least 1")]
    ZeroWorkers,

    /// Unsupported float width
    #[error("encoding must be 32 or 64, got {0}")]
    InvalidEncoding(u32),
}

/// Widest m/z acquisition range a PASEF merge is validated against.
pub const MAX_PASEF_MZ_SPAN: f64 = 4000.0;

/// Float width of encoded binary arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FloatWidth {
    /// 32-bit floats
    Bits32,
    /// 64-bit floats
    #[default]
    Bits64,
}

impl FloatWidth {
    /// Bytes per value.
    pub fn byte_size(&self) -> usize {
        match self {
            FloatWidth::Bits32 => 4,
            FloatWidth::Bits64 => 8,
        }
    }
}

impl TryFrom<u32> for FloatWidth {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(FloatWidth::Bits32),
            64 => Ok(FloatWidth::Bits64),
            other => Err(ConfigError::InvalidEncoding(other)),
        }
    }
}

impl From<FloatWidth> for u32 {
    fn from(width: FloatWidth) -> Self {
        match width {
            FloatWidth::Bits32 => 32,
            FloatWidth::Bits64 => 64,
        }
    }
}

impl fmt::Display for FloatWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", u32::from(*self))
    }
}

/// Compression of encoded binary arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Uncompressed
    None,
    /// zlib
    #[default]
    Zlib,
}

/// How MALDI spectra are distributed over output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// Everything in one file
    #[default]
    Combined,
    /// One file per spot
    Individual,
    /// One file per plate-map sample label
    Sample,
}

/// imzML binary layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImzmlMode {
    /// Every pixel stores its own m/z array
    #[default]
    Processed,
    /// All pixels share one m/z array
    Continuous,
}

fn default_chunk_size() -> usize {
    10
}

fn default_pasef_bin_width() -> f64 {
    0.005
}

fn default_workers() -> usize {
    1
}

fn default_polarity_code_zero() -> Polarity {
    Polarity::Positive
}

/// Settings of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Spectrum resolution
    #[serde(default)]
    pub mode: ExtractionMode,
    /// Drop MS1 spectra
    #[serde(default)]
    pub ms2_only: bool,
    /// Never emit mobility arrays
    #[serde(default)]
    pub exclude_mobility: bool,
    /// Profile re-binning bin count, 0 to disable
    #[serde(default)]
    pub profile_bins: usize,
    /// Float width of binary arrays
    #[serde(default)]
    pub encoding: FloatWidth,
    /// Compression of binary arrays
    #[serde(default)]
    pub compression: Compression,
    /// Number of survey-bounded intervals per frame window
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// MALDI output grouping
    #[serde(default)]
    pub maldi_output: GroupingMode,
    /// imzML binary layout
    #[serde(default)]
    pub imzml_mode: ImzmlMode,
    /// Polarity of BAF polarity code 0
    #[serde(default = "default_polarity_code_zero")]
    pub polarity_code_zero: Polarity,
    /// Bin width of the PASEF precursor merge
    #[serde(default = "default_pasef_bin_width")]
    pub pasef_bin_width: f64,
    /// Omit acquisition software and instrument details from output metadata
    #[serde(default)]
    pub barebones_metadata: bool,
    /// Parallel extraction workers (effective with the `parallel` feature)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Raw,
            ms2_only: false,
            exclude_mobility: false,
            profile_bins: 0,
            encoding: FloatWidth::Bits64,
            compression: Compression::Zlib,
            chunk_size: default_chunk_size(),
            maldi_output: GroupingMode::Combined,
            imzml_mode: ImzmlMode::Processed,
            polarity_code_zero: default_polarity_code_zero(),
            pasef_bin_width: default_pasef_bin_width(),
            barebones_metadata: false,
            workers: default_workers(),
        }
    }
}

impl ConversionConfig {
    /// Check the settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if !(self.pasef_bin_width > 0.0 && self.pasef_bin_width.is_finite()) {
            return Err(ConfigError::InvalidBinWidth(self.pasef_bin_width));
        }
        let bins = BinEdges::fixed_width_count(0.0, MAX_PASEF_MZ_SPAN, self.pasef_bin_width);
        if bins > MAX_BIN_EDGES {
            return Err(ConfigError::BinWidthTooSmall {
                width: self.pasef_bin_width,
                span: MAX_PASEF_MZ_SPAN,
                bins,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Binary array options for sinks.
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            encoding: self.encoding,
            compression: self.compression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert_eq!(config.mode, ExtractionMode::Raw);
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.encoding, FloatWidth::Bits64);
        assert_eq!(config.compression, Compression::Zlib);
        assert_eq!(config.pasef_bin_width, 0.005);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = ConversionConfig {
            chunk_size: 0,
            ..ConversionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
        config.chunk_size = 5;
        config.pasef_bin_width = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBinWidth(0.0)));
        config.pasef_bin_width = 1e-9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BinWidthTooSmall { bins, .. }) if bins > MAX_BIN_EDGES
        ));
        config.pasef_bin_width = 0.001;
        assert!(config.validate().is_ok());
        config.workers = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ConversionConfig =
            serde_json::from_str(r#"{"mode": "centroid", "encoding": 32, "maldi_output": "sample"}"#).unwrap();
        assert_eq!(config.mode, ExtractionMode::Centroid);
        assert_eq!(config.encoding, FloatWidth::Bits32);
        assert_eq!(config.maldi_output, GroupingMode::Sample);
        assert_eq!(config.chunk_size, 10);

        assert!(serde_json::from_str::<ConversionConfig>(r#"{"encoding": 16}"#).is_err());
    }
}
