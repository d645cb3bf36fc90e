use super::ConfigError;
use crate::builder::BuildError;
use crate::imaging::PlateMapError;
use crate::serializer::SerializerError;
use crate::source::ProviderError;

/// Errors that can occur during conversion
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Rejected configuration, raised before anything is written
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] ConfigError),

    /// Error reading the acquisition
    #[error("Acquisition error: {0}")]
    ProviderError(#[from] ProviderError),

    /// Error building spectrum records
    #[error("Record error: {0}")]
    BuildError(#[from] BuildError),

    /// Error writing the output document
    #[error("Output error: {0}")]
    SerializerError(#[from] SerializerError),

    /// Unusable plate map or grouping request
    #[error("Plate map error: {0}")]
    PlateMapError(#[from] PlateMapError),

    /// The run was cancelled between windows
    #[error("Conversion cancelled after {windows} window(s)")]
    Cancelled {
        /// Windows fully written before cancellation
        windows: usize,
    },
}
