//! # Streaming serialization
//!
//! [`StreamingSerializer`] owns a [`SpectrumSink`] and drives it through a
//! fixed sequence:
//!
//! ```text
//! Init ──write_metadata──▶ MetadataWritten ──begin──▶ Streaming ──finalize──▶ Finalized
//!                                                       │  ▲
//!                                                       └──┘ write_window / emit
//! ```
//!
//! Scan numbers are assigned here, at emission time: they start at 1 and grow
//! by one per emitted spectrum over the whole run. The number of spectra is
//! declared when the spectrum list opens; when the run emits a different
//! number, the sink is asked to correct the declaration before it finishes.

mod error;
mod memory;
mod run;

#[cfg(test)]
mod tests;

pub use error::{SerializerError, SinkError};
pub use memory::{MemorySink, SinkRecord};
pub use run::{RunMetadata, OTOF_CONTROL};

use log::{debug, warn};
use serde::Serialize;

use crate::pipeline::{Compression, FloatWidth, LinkedRecord};
use crate::spectrum::CanonicalSpectrum;

/// Binary array options passed with every spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WriteOptions {
    /// Float width
    pub encoding: FloatWidth,
    /// Compression
    pub compression: Compression,
}

/// A record with the scan numbers assigned at emission.
#[derive(Debug, Clone, Copy)]
pub struct EmittedSpectrum<'a> {
    /// 1-based position in the output
    pub scan_number: u64,
    /// Scan number of the parent spectrum, for linked products
    pub parent_scan_number: Option<u64>,
    /// The record
    pub spectrum: &'a CanonicalSpectrum,
}

impl EmittedSpectrum<'_> {
    /// Native spectrum id, `scan=N`.
    pub fn native_id(&self) -> String {
        format!("scan={}", self.scan_number)
    }

    /// Native id of the parent spectrum.
    pub fn parent_native_id(&self) -> Option<String> {
        self.parent_scan_number.map(|scan| format!("scan={scan}"))
    }
}

/// Output container receiving spectra in emission order.
pub trait SpectrumSink {
    /// Write everything that precedes the spectrum list.
    fn write_run_header(&mut self, run: &RunMetadata) -> Result<(), SinkError>;

    /// Open the spectrum list with the declared number of spectra.
    fn begin_spectrum_list(&mut self, declared: usize) -> Result<(), SinkError>;

    /// Write one spectrum.
    fn write_spectrum(&mut self, spectrum: &EmittedSpectrum<'_>, options: WriteOptions) -> Result<(), SinkError>;

    /// Replace the declared count by the emitted one.
    ///
    /// Called only when the two differ, before [`finish`](SpectrumSink::finish).
    fn correct_declared_count(&mut self, declared: usize, emitted: usize) -> Result<(), SinkError>;

    /// Close the document and move it to its final name.
    fn finish(&mut self) -> Result<(), SinkError>;
}

impl<S: SpectrumSink + ?Sized> SpectrumSink for Box<S> {
    fn write_run_header(&mut self, run: &RunMetadata) -> Result<(), SinkError> {
        (**self).write_run_header(run)
    }

    fn begin_spectrum_list(&mut self, declared: usize) -> Result<(), SinkError> {
        (**self).begin_spectrum_list(declared)
    }

    fn write_spectrum(&mut self, spectrum: &EmittedSpectrum<'_>, options: WriteOptions) -> Result<(), SinkError> {
        (**self).write_spectrum(spectrum, options)
    }

    fn correct_declared_count(&mut self, declared: usize, emitted: usize) -> Result<(), SinkError> {
        (**self).correct_declared_count(declared, emitted)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Lifecycle state of a [`StreamingSerializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SerializerState {
    /// Nothing written yet
    Init,
    /// Run header written
    MetadataWritten,
    /// Spectrum list open
    Streaming,
    /// Document closed
    Finalized,
}

/// Counts reported by [`StreamingSerializer::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SerializationSummary {
    /// Count declared when the spectrum list opened
    pub declared: usize,
    /// Spectra actually written
    pub emitted: usize,
    /// Whether the sink was asked to correct the declaration
    pub corrected: bool,
}

/// Assigns scan numbers and streams records into a sink.
#[derive(Debug)]
pub struct StreamingSerializer<S: SpectrumSink> {
    sink: S,
    options: WriteOptions,
    state: SerializerState,
    declared: usize,
    emitted: usize,
}

impl<S: SpectrumSink> StreamingSerializer<S> {
    /// Wrap a sink.
    pub fn new(sink: S, options: WriteOptions) -> Self {
        Self {
            sink,
            options,
            state: SerializerState::Init,
            declared: 0,
            emitted: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SerializerState {
        self.state
    }

    /// Spectra written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Declared spectrum count.
    pub fn declared(&self) -> usize {
        self.declared
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn expect_state(&self, expected: SerializerState, operation: &'static str) -> Result<(), SerializerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SerializerError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }

    /// Write the run header. `Init → MetadataWritten`.
    pub fn write_metadata(&mut self, run: &RunMetadata) -> Result<(), SerializerError> {
        self.expect_state(SerializerState::Init, "write metadata")?;
        self.sink.write_run_header(run)?;
        self.state = SerializerState::MetadataWritten;
        Ok(())
    }

    /// Open the spectrum list. `MetadataWritten → Streaming`.
    pub fn begin(&mut self, declared: usize) -> Result<(), SerializerError> {
        self.expect_state(SerializerState::MetadataWritten, "begin the spectrum list")?;
        self.sink.begin_spectrum_list(declared)?;
        self.declared = declared;
        self.state = SerializerState::Streaming;
        debug!("Spectrum list opened, {declared} spectra declared");
        Ok(())
    }

    /// Emit a single record and return its scan number.
    pub fn emit(
        &mut self,
        spectrum: &CanonicalSpectrum,
        parent_scan_number: Option<u64>,
    ) -> Result<u64, SerializerError> {
        self.expect_state(SerializerState::Streaming, "emit a spectrum")?;
        let scan_number = self.emitted as u64 + 1;
        let emitted = EmittedSpectrum {
            scan_number,
            parent_scan_number,
            spectrum,
        };
        self.sink.write_spectrum(&emitted, self.options)?;
        self.emitted += 1;
        Ok(scan_number)
    }

    /// Emit one linked window in order, resolving parent positions to scan numbers.
    pub fn write_window(&mut self, records: &[LinkedRecord]) -> Result<(), SerializerError> {
        self.expect_state(SerializerState::Streaming, "write a window")?;
        let mut assigned: Vec<u64> = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let parent = match record.parent {
                Some(parent) => Some(
                    *assigned
                        .get(parent)
                        .ok_or(SerializerError::UnresolvedParent { index, parent })?,
                ),
                None => None,
            };
            assigned.push(self.emit(&record.spectrum, parent)?);
        }
        Ok(())
    }

    /// Reconcile the count and close the sink. `Streaming → Finalized`.
    pub fn finalize(&mut self) -> Result<SerializationSummary, SerializerError> {
        self.expect_state(SerializerState::Streaming, "finalize")?;
        let (declared, emitted) = (self.declared, self.emitted);
        if emitted > declared {
            warn!("Emitted {emitted} spectra but only {declared} were declared");
        }
        let corrected = emitted != declared;
        if corrected {
            debug!("Correcting declared spectrum count {declared} -> {emitted}");
            self.sink.correct_declared_count(declared, emitted)?;
        }
        self.sink.finish()?;
        self.state = SerializerState::Finalized;
        Ok(SerializationSummary {
            declared,
            emitted,
            corrected,
        })
    }
}
