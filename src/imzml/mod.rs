//! # imzML output
//!
//! imzML splits an imaging run in two files sharing a UUID:
//!
//! - `<stem>.imzML`: an mzML document whose binary arrays are references
//!   (offset, value count and byte length) into the binary file
//! - `<stem>.ibd`: a 16-byte UUID followed by the raw little-endian arrays
//!
//! The `.imzML` also carries the SHA-1 of the whole `.ibd`, the pixel grid
//! size and each spectrum's pixel position.
//!
//! In processed mode every pixel stores its own m/z array. In continuous
//! mode all pixels share the m/z array written for the first one.

mod writer;

#[cfg(test)]
mod tests;

pub use writer::{ExternalArray, ImzmlSink};
