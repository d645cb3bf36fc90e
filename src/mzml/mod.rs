//! # mzML output
//!
//! Streaming writer for mzML 1.1, the XML-based community standard for mass
//! spectrometry data defined by HUPO-PSI.
//!
//! ## Document structure
//!
//! ```text
//! mzML
//! ├── cvList
//! ├── fileDescription
//! │   ├── fileContent
//! │   └── sourceFileList
//! ├── softwareList
//! ├── instrumentConfigurationList
//! ├── dataProcessingList
//! └── run
//!     └── spectrumList count=N
//!         └── spectrum* (id="scan=1", "scan=2", ...)
//!             ├── cvParam*
//!             ├── scanList
//!             ├── precursorList (fragment spectra, spectrumRef="scan=P")
//!             └── binaryDataArrayList
//!                 └── binaryDataArray* (m/z, intensity, mobility)
//! ```
//!
//! The header is written as soon as the run starts and spectra are appended
//! one at a time, so memory use does not grow with the run length.

mod binary;
mod document;
mod writer;
mod xml;

#[cfg(test)]
mod tests;

pub use binary::{BinaryDecodeError, BinaryEncoder};
pub use document::{
    spectrum_list_tag, spectrum_params, ACQUISITION_SOFTWARE_ID, DATA_PROCESSING_ID,
    INSTRUMENT_CONFIGURATION_ID, SOFTWARE_ID, SOURCE_FILE_ID,
};
pub use writer::{MzMLSink, OutputPaths};
pub use xml::XmlWriter;

pub(crate) use document::{
    open_root, open_run, write_cv_list, write_data_processing, write_file_description,
    write_instrument_configuration, write_software_list, write_spectrum_head,
};
