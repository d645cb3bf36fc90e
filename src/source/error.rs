use std::fmt::Display;

/// Errors raised by an acquisition source.
///
/// Every variant is fatal for the run: a lookup that cannot be answered or a
/// decode call that fails leaves no well-defined spectrum to emit.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// I/O error while opening or reading the acquisition
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON acquisition export
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A foreign-key lookup found no row
    #[error("No {table} row for {key}")]
    MissingRecord {
        /// Vendor table name
        table: &'static str,
        /// Key that was looked up
        key: String,
    },

    /// A metadata field holds a value that cannot be interpreted
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// The vendor decoder failed for a frame
    #[error("Failed to decode frame {frame}: {message}")]
    DecodeError {
        /// Frame id
        frame: u32,
        /// Decoder message
        message: String,
    },
}

impl ProviderError {
    /// Shorthand for [`ProviderError::MissingRecord`].
    pub fn missing(table: &'static str, key: impl Display) -> Self {
        ProviderError::MissingRecord {
            table,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`ProviderError::InvalidValue`].
    pub fn invalid(field: &'static str, value: impl Display) -> Self {
        ProviderError::InvalidValue {
            field,
            value: value.to_string(),
        }
    }
}
