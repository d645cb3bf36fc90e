//! Binary data encoding for mzML
//!
//! mzML stores numerical arrays (m/z, intensity, mobility) as Base64-encoded
//! binary data, optionally compressed with zlib:
//!
//! 1. Write the values as little-endian float32 or float64
//! 2. Compress if requested (zlib)
//! 3. Base64 encode the bytes
//!
//! imzML keeps only step 1 and writes the bytes to the `.ibd` file.

use std::io::{Read, Write};

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::controlled_vocabulary::{ms_terms, CvTerm};
use crate::pipeline::{Compression, FloatWidth};
use crate::serializer::WriteOptions;

impl FloatWidth {
    /// CV term of the width
    pub fn cv_term(&self) -> CvTerm {
        match self {
            FloatWidth::Bits32 => ms_terms::float_32(),
            FloatWidth::Bits64 => ms_terms::float_64(),
        }
    }
}

impl Compression {
    /// CV term of the compression
    pub fn cv_term(&self) -> CvTerm {
        match self {
            Compression::None => ms_terms::no_compression(),
            Compression::Zlib => ms_terms::zlib_compression(),
        }
    }
}

/// Errors that can occur while reading back an encoded array
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// Invalid Base64 text
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Corrupt zlib stream
    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    /// Byte count is not a multiple of the value width
    #[error("Invalid data length: expected a multiple of {width}, got {actual}")]
    InvalidLength {
        /// Bytes per value
        width: usize,
        /// Bytes found
        actual: usize,
    },
}

/// Encoder for mzML binary data arrays
pub struct BinaryEncoder;

impl BinaryEncoder {
    /// Little-endian bytes of `values` at the given width.
    pub fn to_bytes(values: &[f64], width: FloatWidth) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(values.len() * width.byte_size());
        for &value in values {
            // Writing into a Vec cannot fail
            let _ = match width {
                FloatWidth::Bits32 => bytes.write_f32::<LittleEndian>(value as f32),
                FloatWidth::Bits64 => bytes.write_f64::<LittleEndian>(value),
            };
        }
        bytes
    }

    /// Apply the requested compression.
    pub fn compress(bytes: Vec<u8>, compression: Compression) -> std::io::Result<Vec<u8>> {
        match compression {
            Compression::None => Ok(bytes),
            Compression::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(&bytes)?;
                encoder.finish()
            }
        }
    }

    /// Encode an array as the text of a `<binary>` element.
    pub fn encode(values: &[f64], options: WriteOptions) -> std::io::Result<String> {
        let bytes = Self::compress(Self::to_bytes(values, options.encoding), options.compression)?;
        Ok(BASE64_STANDARD.encode(bytes))
    }

    /// Decode the text of a `<binary>` element back to values.
    pub fn decode(base64_data: &str, options: WriteOptions) -> Result<Vec<f64>, BinaryDecodeError> {
        let trimmed = base64_data.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let decoded = BASE64_STANDARD.decode(trimmed)?;
        let bytes = match options.compression {
            Compression::None => decoded,
            Compression::Zlib => {
                let mut decoder = ZlibDecoder::new(&decoded[..]);
                let mut uncompressed = Vec::new();
                decoder.read_to_end(&mut uncompressed)?;
                uncompressed
            }
        };
        Self::from_bytes(&bytes, options.encoding)
    }

    /// Read little-endian values of the given width.
    pub fn from_bytes(bytes: &[u8], width: FloatWidth) -> Result<Vec<f64>, BinaryDecodeError> {
        let byte_size = width.byte_size();
        if bytes.len() % byte_size != 0 {
            return Err(BinaryDecodeError::InvalidLength {
                width: byte_size,
                actual: bytes.len(),
            });
        }

        let count = bytes.len() / byte_size;
        let mut values = Vec::with_capacity(count);
        let mut cursor = std::io::Cursor::new(bytes);
        for _ in 0..count {
            values.push(match width {
                FloatWidth::Bits32 => f64::from(cursor.read_f32::<LittleEndian>()?),
                FloatWidth::Bits64 => cursor.read_f64::<LittleEndian>()?,
            });
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(encoding: FloatWidth, compression: Compression) -> WriteOptions {
        WriteOptions { encoding, compression }
    }

    #[test]
    fn test_float64_bytes_are_little_endian() {
        let bytes = BinaryEncoder::to_bytes(&[100.0, 200.0], FloatWidth::Bits64);
        assert_eq!(
            bytes,
            vec![
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x59, 0x40, // 100.0
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x69, 0x40, // 200.0
            ]
        );
    }

    #[test]
    fn test_float32_bytes() {
        let bytes = BinaryEncoder::to_bytes(&[100.0, 200.0], FloatWidth::Bits32);
        assert_eq!(bytes, vec![0x00, 0x00, 0xc8, 0x42, 0x00, 0x00, 0x48, 0x43]);
    }

    #[test]
    fn test_uncompressed_base64() {
        let text = BinaryEncoder::encode(&[100.0, 200.0], options(FloatWidth::Bits64, Compression::None)).unwrap();
        assert_eq!(text, "AAAAAAAAWUAAAAAAAABpQA==");
    }

    #[test]
    fn test_zlib_is_readable() {
        let values: Vec<f64> = (0..500).map(|i| 100.0 + f64::from(i) * 0.25).collect();
        let opts = options(FloatWidth::Bits64, Compression::Zlib);
        let text = BinaryEncoder::encode(&values, opts).unwrap();
        assert!(text.len() < BASE64_STANDARD.encode(BinaryEncoder::to_bytes(&values, FloatWidth::Bits64)).len());
        assert_eq!(BinaryEncoder::decode(&text, opts).unwrap(), values);
    }

    #[test]
    fn test_float32_loses_precision() {
        let opts = options(FloatWidth::Bits32, Compression::None);
        let text = BinaryEncoder::encode(&[500.123456789], opts).unwrap();
        let back = BinaryEncoder::decode(&text, opts).unwrap();
        assert!((back[0] - 500.123456789).abs() < 1e-4);
        assert_ne!(back[0], 500.123456789);
    }

    #[test]
    fn test_invalid_length() {
        let result = BinaryEncoder::from_bytes(&[0, 1, 2], FloatWidth::Bits32);
        assert!(matches!(result, Err(BinaryDecodeError::InvalidLength { width: 4, actual: 3 })));
    }

    #[test]
    fn test_cv_terms() {
        assert_eq!(FloatWidth::Bits32.cv_term().accession, "MS:1000521");
        assert_eq!(Compression::Zlib.cv_term().accession, "MS:1000574");
    }
}
