//! TOML configuration file support.
//!
//! Settings of the convert command can be kept in a file instead of flags;
//! flags given on the command line win over file values:
//!
//! ```toml
//! # timsconvert.toml
//! [conversion]
//! mode = "centroid"
//! encoding = 32
//! compression = "zlib"
//! chunk_size = 20
//! maldi_output = "sample"
//! workers = 4
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use timsconvert::extract::ExtractionMode;
use timsconvert::pipeline::{Compression, ConversionConfig, FloatWidth, GroupingMode, ImzmlMode};
use timsconvert::spectrum::Polarity;

use super::ConvertArgs;

/// Root configuration structure for timsconvert.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionOverrides,
}

/// Optional overrides of [`ConversionConfig`] fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionOverrides {
    pub mode: Option<ExtractionMode>,
    pub ms2_only: Option<bool>,
    pub exclude_mobility: Option<bool>,
    pub profile_bins: Option<usize>,
    pub encoding: Option<FloatWidth>,
    pub compression: Option<Compression>,
    pub chunk_size: Option<usize>,
    pub maldi_output: Option<GroupingMode>,
    pub imzml_mode: Option<ImzmlMode>,
    pub polarity_code_zero: Option<Polarity>,
    pub pasef_bin_width: Option<f64>,
    pub barebones_metadata: Option<bool>,
    pub workers: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl ConversionOverrides {
    /// Overrides given as command-line flags. Boolean flags can only switch a setting on.
    pub fn from_args(args: &ConvertArgs) -> Result<Self> {
        let encoding = args
            .encoding
            .as_deref()
            .map(|bits| -> Result<FloatWidth> {
                let bits: u32 = bits.parse().context("Invalid encoding")?;
                Ok(FloatWidth::try_from(bits)?)
            })
            .transpose()?;

        Ok(Self {
            mode: args.mode.map(Into::into),
            ms2_only: args.ms2_only.then_some(true),
            exclude_mobility: args.exclude_mobility.then_some(true),
            profile_bins: args.profile_bins,
            encoding,
            compression: args.compression.map(Into::into),
            chunk_size: args.chunk_size,
            maldi_output: args.maldi_output.map(Into::into),
            imzml_mode: args.imzml_mode.map(Into::into),
            polarity_code_zero: args.polarity_code_zero.map(Into::into),
            pasef_bin_width: args.pasef_bin_width,
            barebones_metadata: args.barebones_metadata.then_some(true),
            workers: args.workers,
        })
    }

    /// Write every present value into `config`.
    pub fn apply(&self, config: &mut ConversionConfig) {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut config.mode, self.mode);
        set(&mut config.ms2_only, self.ms2_only);
        set(&mut config.exclude_mobility, self.exclude_mobility);
        set(&mut config.profile_bins, self.profile_bins);
        set(&mut config.encoding, self.encoding);
        set(&mut config.compression, self.compression);
        set(&mut config.chunk_size, self.chunk_size);
        set(&mut config.maldi_output, self.maldi_output);
        set(&mut config.imzml_mode, self.imzml_mode);
        set(&mut config.polarity_code_zero, self.polarity_code_zero);
        set(&mut config.pasef_bin_width, self.pasef_bin_width);
        set(&mut config.barebones_metadata, self.barebones_metadata);
        set(&mut config.workers, self.workers);
    }
}

/// Defaults, then the config file, then command-line flags.
pub fn resolve(args: &ConvertArgs) -> Result<ConversionConfig> {
    let mut config = ConversionConfig::default();
    if let Some(path) = &args.config {
        Config::from_file(path)?.conversion.apply(&mut config);
    }
    ConversionOverrides::from_args(args)?.apply(&mut config);
    config.validate().context("Invalid conversion settings")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            mode = "centroid"
            encoding = 32
            compression = "none"
            chunk_size = 20
            maldi_output = "sample"
            polarity_code_zero = "negative"
            workers = 4
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.mode, Some(ExtractionMode::Centroid));
        assert_eq!(config.conversion.encoding, Some(FloatWidth::Bits32));
        assert_eq!(config.conversion.compression, Some(Compression::None));
        assert_eq!(config.conversion.maldi_output, Some(GroupingMode::Sample));
        assert_eq!(config.conversion.polarity_code_zero, Some(Polarity::Negative));
        assert_eq!(config.conversion.workers, Some(4));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml = r#"
            [conversion]
            ms2_only = true
        "#;

        let mut config = ConversionConfig::default();
        Config::from_str(toml).unwrap().conversion.apply(&mut config);
        assert!(config.ms2_only);
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.compression, Compression::Zlib);
    }

    #[test]
    fn test_invalid_encoding_is_rejected() {
        let toml = r#"
            [conversion]
            encoding = 16
        "#;
        assert!(Config::from_str(toml).is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_str("[conversion]\nbatch_size = 5\n").is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.conversion.mode, None);
    }
}
