use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::binary::BinaryEncoder;
use super::document::{self, DATA_PROCESSING_ID};
use super::xml::XmlWriter;
use crate::controlled_vocabulary::{ms_terms, CvParamList, CvTerm};
use crate::serializer::{EmittedSpectrum, RunMetadata, SinkError, SpectrumSink, WriteOptions};

/// Output paths of a document written under a temporary name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Name the document gets once finished
    pub final_path: PathBuf,
    /// Name used while writing
    pub temporary_path: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem>.<extension>` and `<dir>/<stem>_tmp.<extension>`.
    pub fn new(dir: &Path, stem: &str, extension: &str) -> Self {
        Self {
            final_path: dir.join(format!("{stem}.{extension}")),
            temporary_path: dir.join(format!("{stem}_tmp.{extension}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Created,
    Header,
    SpectrumList,
    Finished,
}

/// Streaming mzML writer.
///
/// Spectra go to `<stem>_tmp.mzML`; [`finish`](SpectrumSink::finish) closes
/// the document and moves it to `<stem>.mzML`, rewriting the
/// `spectrumList` count on the way when it was corrected.
pub struct MzMLSink {
    paths: OutputPaths,
    xml: Option<XmlWriter<BufWriter<File>>>,
    run_id: String,
    state: SinkState,
    declared: usize,
    corrected: Option<usize>,
}

impl MzMLSink {
    /// Create `<dir>/<stem>_tmp.mzML`.
    pub fn create<P: AsRef<Path>>(dir: P, stem: &str) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let paths = OutputPaths::new(dir, stem, "mzML");
        let file = File::create(&paths.temporary_path)?;
        debug!("Writing {}", paths.temporary_path.display());
        Ok(Self {
            paths,
            xml: Some(XmlWriter::new(BufWriter::new(file))),
            run_id: stem.to_string(),
            state: SinkState::Created,
            declared: 0,
            corrected: None,
        })
    }

    /// Output paths.
    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    fn xml(&mut self) -> Result<&mut XmlWriter<BufWriter<File>>, SinkError> {
        self.xml.as_mut().ok_or(SinkError::Closed("finished"))
    }

    fn expect(&self, state: SinkState, what: &'static str) -> Result<(), SinkError> {
        if self.state == state {
            Ok(())
        } else {
            Err(SinkError::Closed(what))
        }
    }

    fn write_array(
        xml: &mut XmlWriter<BufWriter<File>>,
        values: &[f64],
        array_type: CvTerm,
        options: WriteOptions,
    ) -> Result<(), SinkError> {
        let encoded = BinaryEncoder::encode(values, options)?;
        let length = encoded.len().to_string();
        xml.start("binaryDataArray", &[("encodedLength", length.as_str())])?;
        xml.cv_param(&options.encoding.cv_term())?;
        xml.cv_param(&options.compression.cv_term())?;
        xml.cv_param(&array_type)?;
        xml.text_element("binary", &[], &encoded)?;
        xml.end("binaryDataArray")
    }

    /// Copy the temporary document to its final name with the spectrum count replaced.
    fn rewrite_count(&self, declared: usize, emitted: usize) -> Result<(), SinkError> {
        let dir = self
            .paths
            .final_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let declared_tag = document::spectrum_list_tag(declared);
        let emitted_tag = document::spectrum_list_tag(emitted);

        let mut reader = BufReader::new(File::open(&self.paths.temporary_path)?);
        let mut output = tempfile::NamedTempFile::new_in(&dir)?;
        let replaced = {
            let mut out = BufWriter::new(output.as_file_mut());
            let replaced = replace_first(&mut reader, &mut out, &declared_tag, &emitted_tag)?;
            out.flush()?;
            replaced
        };
        if !replaced {
            return Err(SinkError::CountNotFound {
                path: self.paths.temporary_path.clone(),
                declared,
            });
        }
        output.persist(&self.paths.final_path)?;
        fs::remove_file(&self.paths.temporary_path)?;
        Ok(())
    }
}

/// Copy `reader` to `out`, replacing the first occurrence of `from` on a line with `to`.
///
/// Returns whether a replacement was made.
pub(crate) fn replace_first<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    from: &str,
    to: &str,
) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        if line.contains(from) {
            out.write_all(line.replacen(from, to, 1).as_bytes())?;
            io::copy(reader, out)?;
            return Ok(true);
        }
        out.write_all(line.as_bytes())?;
    }
}

impl SpectrumSink for MzMLSink {
    fn write_run_header(&mut self, run: &RunMetadata) -> Result<(), SinkError> {
        self.expect(SinkState::Created, "not accepting a run header")?;
        self.run_id = run.run_id.clone();
        let xml = self.xml()?;
        document::open_root(xml, run)?;
        document::write_cv_list(xml, false)?;
        document::write_file_description(xml, run, &CvParamList::new())?;
        document::write_software_list(xml, run)?;
        document::write_instrument_configuration(xml, run)?;
        document::write_data_processing(xml)?;
        document::open_run(xml, run)?;
        self.state = SinkState::Header;
        Ok(())
    }

    fn begin_spectrum_list(&mut self, declared: usize) -> Result<(), SinkError> {
        self.expect(SinkState::Header, "not ready for a spectrum list")?;
        let count = declared.to_string();
        self.xml()?.start(
            "spectrumList",
            &[("count", count.as_str()), ("defaultDataProcessingRef", DATA_PROCESSING_ID)],
        )?;
        self.declared = declared;
        self.state = SinkState::SpectrumList;
        Ok(())
    }

    fn write_spectrum(&mut self, emitted: &EmittedSpectrum<'_>, options: WriteOptions) -> Result<(), SinkError> {
        self.expect(SinkState::SpectrumList, "not streaming spectra")?;
        let run_id = self.run_id.clone();
        let spectrum = emitted.spectrum;
        let xml = self.xml()?;
        document::write_spectrum_head(xml, emitted, &run_id, &CvParamList::new())?;

        let count = if spectrum.mobility().is_some() { "3" } else { "2" };
        xml.start("binaryDataArrayList", &[("count", count)])?;
        Self::write_array(xml, spectrum.mz(), ms_terms::mz_array(), options)?;
        Self::write_array(xml, spectrum.intensity(), ms_terms::intensity_array(), options)?;
        if let Some(mobility) = spectrum.mobility() {
            Self::write_array(
                xml,
                mobility,
                ms_terms::mean_inverse_reduced_ion_mobility_array(),
                options,
            )?;
        }
        xml.end("binaryDataArrayList")?;
        xml.end("spectrum")
    }

    fn correct_declared_count(&mut self, declared: usize, emitted: usize) -> Result<(), SinkError> {
        self.expect(SinkState::SpectrumList, "not streaming spectra")?;
        debug!("{}: spectrum count {declared} will be rewritten to {emitted}", self.run_id);
        self.corrected = Some(emitted);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.expect(SinkState::SpectrumList, "not streaming spectra")?;
        let mut xml = self.xml.take().ok_or(SinkError::Closed("finished"))?;
        xml.end("spectrumList")?;
        xml.end("run")?;
        xml.end("mzML")?;
        let mut inner = xml.into_inner();
        inner.write_all(b"\n")?;
        inner.flush()?;
        drop(inner);
        self.state = SinkState::Finished;

        match self.corrected {
            Some(emitted) if emitted != self.declared => {
                info!("Updating spectrum count {} -> {}", self.declared, emitted);
                self.rewrite_count(self.declared, emitted)?;
            }
            _ => fs::rename(&self.paths.temporary_path, &self.paths.final_path)?,
        }
        info!("Finished writing {}", self.paths.final_path.display());
        Ok(())
    }
}
