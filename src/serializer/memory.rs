use super::{EmittedSpectrum, RunMetadata, SinkError, SpectrumSink, WriteOptions};
use crate::acquisition::AcquisitionMode;

/// What [`MemorySink`] keeps of each spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    /// Assigned scan number
    pub scan_number: u64,
    /// Parent scan number
    pub parent_scan_number: Option<u64>,
    /// Source frame
    pub frame: u32,
    /// Acquisition mode
    pub mode: AcquisitionMode,
    /// Number of peaks
    pub peaks: usize,
    /// Whether a mobility array was present
    pub has_mobility: bool,
}

/// Sink that records calls instead of writing a file.
///
/// Used for dry runs and to check conversion logic without touching disk.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Run header, once written
    pub run: Option<RunMetadata>,
    /// Count passed to `begin_spectrum_list`
    pub declared: Option<usize>,
    /// Written spectra
    pub records: Vec<SinkRecord>,
    /// Every `correct_declared_count` call
    pub corrections: Vec<(usize, usize)>,
    /// Whether `finish` ran
    pub finished: bool,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the document would carry after finishing.
    pub fn final_count(&self) -> Option<usize> {
        self.corrections.last().map(|(_, emitted)| *emitted).or(self.declared)
    }
}

impl SpectrumSink for MemorySink {
    fn write_run_header(&mut self, run: &RunMetadata) -> Result<(), SinkError> {
        self.run = Some(run.clone());
        Ok(())
    }

    fn begin_spectrum_list(&mut self, declared: usize) -> Result<(), SinkError> {
        self.declared = Some(declared);
        Ok(())
    }

    fn write_spectrum(&mut self, spectrum: &EmittedSpectrum<'_>, _options: WriteOptions) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Closed("finished"));
        }
        let record = spectrum.spectrum;
        self.records.push(SinkRecord {
            scan_number: spectrum.scan_number,
            parent_scan_number: spectrum.parent_scan_number,
            frame: record.frame(),
            mode: record.mode(),
            peaks: record.len(),
            has_mobility: record.mobility().is_some(),
        });
        Ok(())
    }

    fn correct_declared_count(&mut self, declared: usize, emitted: usize) -> Result<(), SinkError> {
        self.corrections.push((declared, emitted));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
