use super::SerializerState;

/// Errors raised by an output sink.
///
/// Sink faults are fatal; the run stops without retrying.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O error while writing output files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the XML writer
    #[cfg(feature = "mzml")]
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// The count-corrected document could not replace the final file
    #[error("Failed to persist output: {0}")]
    PersistError(#[from] tempfile::PersistError),

    /// The declared spectrum count was not found where it had to be corrected
    #[error("Spectrum count {declared} not found in {path}")]
    CountNotFound {
        /// Document being corrected
        path: std::path::PathBuf,
        /// Count that was looked for
        declared: usize,
    },

    /// A spectrum cannot be represented in the output format
    #[error("Unsupported spectrum {scan_number}: {reason}")]
    Unsupported {
        /// Scan number of the spectrum
        scan_number: u64,
        /// What is missing or inconsistent
        reason: String,
    },

    /// The sink was driven out of order
    #[error("Sink is {0}")]
    Closed(&'static str),
}

/// Errors raised by [`StreamingSerializer`](super::StreamingSerializer).
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// An operation was called in a state that does not allow it
    #[error("Cannot {operation} in state {state:?}")]
    InvalidState {
        /// Current state
        state: SerializerState,
        /// Attempted operation
        operation: &'static str,
    },

    /// A product referenced a parent position that was not emitted before it
    #[error("Record {index} references parent {parent} which has not been emitted")]
    UnresolvedParent {
        /// Position of the product in its window
        index: usize,
        /// Referenced position
        parent: usize,
    },

    /// Sink fault
    #[error(transparent)]
    Sink(#[from] SinkError),
}
