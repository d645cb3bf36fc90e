/// Reasons a set of arrays cannot become a [`CanonicalSpectrum`](super::CanonicalSpectrum).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrumError {
    /// No peaks
    #[error("Spectrum of frame {frame} has no peaks")]
    Empty {
        /// Frame id
        frame: u32,
    },

    /// m/z and intensity arrays differ in length
    #[error("Frame {frame}: {mz} m/z values but {intensity} intensities")]
    LengthMismatch {
        /// Frame id
        frame: u32,
        /// m/z array length
        mz: usize,
        /// Intensity array length
        intensity: usize,
    },

    /// Mobility array differs in length from the m/z array
    #[error("Frame {frame}: {mz} m/z values but {mobility} mobility values")]
    MobilityLengthMismatch {
        /// Frame id
        frame: u32,
        /// m/z array length
        mz: usize,
        /// Mobility array length
        mobility: usize,
    },

    /// m/z value that is NaN or infinite
    #[error("Frame {frame}: non-finite m/z {value} at index {index}")]
    NonFiniteMz {
        /// Frame id
        frame: u32,
        /// First offending index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// m/z array out of order at the given index
    #[error("Frame {frame}: m/z not ascending at index {index}")]
    NotAscending {
        /// Frame id
        frame: u32,
        /// First offending index
        index: usize,
    },
}
