use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::controlled_vocabulary::{ims_terms, ms_terms, CvParamList, CvTerm};
use crate::mzml::{self, BinaryEncoder, OutputPaths, XmlWriter, DATA_PROCESSING_ID};
use crate::pipeline::{Compression, ImzmlMode};
use crate::serializer::{EmittedSpectrum, RunMetadata, SinkError, SpectrumSink, WriteOptions};
use crate::spectrum::Coordinate;

const MZ_GROUP: &str = "mzArray";
const INTENSITY_GROUP: &str = "intensityArray";
const MOBILITY_GROUP: &str = "mobilityArray";

/// Location of one array in the `.ibd` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalArray {
    /// Byte offset
    pub offset: u64,
    /// Number of values
    pub length: usize,
    /// Number of bytes
    pub encoded_length: u64,
}

/// imzML writer: pixel arrays stream into `<stem>_tmp.ibd`, the XML is
/// assembled when the run finishes.
///
/// In [`ImzmlMode::Continuous`] every pixel must carry the m/z array of the
/// first one, which is stored once.
pub struct ImzmlSink {
    mode: ImzmlMode,
    imzml_path: PathBuf,
    ibd_paths: OutputPaths,
    ibd: Option<BufWriter<File>>,
    body: Option<XmlWriter<BufWriter<File>>>,
    hasher: Sha1,
    offset: u64,
    uuid: Uuid,
    run: Option<RunMetadata>,
    options: Option<WriteOptions>,
    shared_mz: Option<(Vec<f64>, ExternalArray)>,
    has_mobility: bool,
    max_x: i64,
    max_y: i64,
    declared: usize,
    corrected: Option<usize>,
    list_open: bool,
}

impl ImzmlSink {
    /// Create `<dir>/<stem>_tmp.ibd` and write its UUID header.
    pub fn create<P: AsRef<Path>>(dir: P, stem: &str, mode: ImzmlMode) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let ibd_paths = OutputPaths::new(dir, stem, "ibd");
        let uuid = Uuid::new_v4();

        let mut sink = Self {
            mode,
            imzml_path: dir.join(format!("{stem}.imzML")),
            ibd: Some(BufWriter::new(File::create(&ibd_paths.temporary_path)?)),
            ibd_paths,
            body: Some(XmlWriter::new(BufWriter::new(tempfile::tempfile()?))),
            hasher: Sha1::new(),
            offset: 0,
            uuid,
            run: None,
            options: None,
            shared_mz: None,
            has_mobility: false,
            max_x: 0,
            max_y: 0,
            declared: 0,
            corrected: None,
            list_open: false,
        };
        sink.append(uuid.as_bytes())?;
        debug!("Writing {} ({:?} mode, UUID {})", sink.ibd_paths.temporary_path.display(), mode, uuid);
        Ok(sink)
    }

    /// UUID shared by the `.imzML` and `.ibd` files.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Path of the finished `.imzML`.
    pub fn imzml_path(&self) -> &Path {
        &self.imzml_path
    }

    /// Path of the finished `.ibd`.
    pub fn ibd_path(&self) -> &Path {
        &self.ibd_paths.final_path
    }

    fn append(&mut self, bytes: &[u8]) -> Result<u64, SinkError> {
        let ibd = self.ibd.as_mut().ok_or(SinkError::Closed("finished"))?;
        ibd.write_all(bytes)?;
        self.hasher.update(bytes);
        let offset = self.offset;
        self.offset += bytes.len() as u64;
        Ok(offset)
    }

    fn append_array(&mut self, values: &[f64], options: WriteOptions) -> Result<ExternalArray, SinkError> {
        let bytes = BinaryEncoder::to_bytes(values, options.encoding);
        let offset = self.append(&bytes)?;
        Ok(ExternalArray {
            offset,
            length: values.len(),
            encoded_length: bytes.len() as u64,
        })
    }

    fn mz_array(&mut self, emitted: &EmittedSpectrum<'_>, options: WriteOptions) -> Result<ExternalArray, SinkError> {
        let mz = emitted.spectrum.mz();
        if self.mode == ImzmlMode::Processed {
            return self.append_array(mz, options);
        }
        if let Some((shared, array)) = &self.shared_mz {
            return if shared.as_slice() == mz {
                Ok(*array)
            } else {
                Err(SinkError::Unsupported {
                    scan_number: emitted.scan_number,
                    reason: "m/z array differs from the shared continuous-mode array".to_string(),
                })
            };
        }
        let array = self.append_array(mz, options)?;
        self.shared_mz = Some((mz.to_vec(), array));
        Ok(array)
    }

    fn write_external<W: Write>(xml: &mut XmlWriter<W>, group: &str, array: ExternalArray) -> Result<(), SinkError> {
        xml.start("binaryDataArray", &[("encodedLength", "0")])?;
        xml.empty("referenceableParamGroupRef", &[("ref", group)])?;
        xml.cv_param(&ims_terms::external_array_length(array.length))?;
        xml.cv_param(&ims_terms::external_encoded_length(array.encoded_length))?;
        xml.cv_param(&ims_terms::external_offset(array.offset))?;
        xml.empty("binary", &[])?;
        xml.end("binaryDataArray")
    }

    fn write_param_groups<W: Write>(&self, xml: &mut XmlWriter<W>, options: WriteOptions) -> Result<(), SinkError> {
        let mut groups: Vec<(&str, CvTerm)> = vec![
            (MZ_GROUP, ms_terms::mz_array()),
            (INTENSITY_GROUP, ms_terms::intensity_array()),
        ];
        if self.has_mobility {
            groups.push((MOBILITY_GROUP, ms_terms::mean_inverse_reduced_ion_mobility_array()));
        }
        let count = groups.len().to_string();
        xml.start("referenceableParamGroupList", &[("count", count.as_str())])?;
        for (id, array_type) in groups {
            let params = CvParamList::new()
                .with(array_type)
                .with(options.encoding.cv_term())
                .with(Compression::None.cv_term())
                .with(ims_terms::external_data());
            xml.start("referenceableParamGroup", &[("id", id)])?;
            xml.cv_params(&params)?;
            xml.end("referenceableParamGroup")?;
        }
        xml.end("referenceableParamGroupList")
    }

    fn write_scan_settings<W: Write>(&self, xml: &mut XmlWriter<W>) -> Result<(), SinkError> {
        xml.start("scanSettingsList", &[("count", "1")])?;
        xml.start("scanSettings", &[("id", "scansettings1")])?;
        xml.cv_param(&ims_terms::max_count_of_pixels_x(self.max_x))?;
        xml.cv_param(&ims_terms::max_count_of_pixels_y(self.max_y))?;
        xml.end("scanSettings")?;
        xml.end("scanSettingsList")
    }

    fn sha1_hex(&self) -> String {
        self.hasher
            .clone()
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect()
    }

    fn write_document(&self, run: &RunMetadata, count: usize, mut body: File) -> Result<(), SinkError> {
        let options = self.options.unwrap_or_default();
        let dir = self.imzml_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut output = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut xml = XmlWriter::new(BufWriter::new(output.as_file_mut()));
            mzml::open_root(&mut xml, run)?;
            mzml::write_cv_list(&mut xml, true)?;

            let storage = match self.mode {
                ImzmlMode::Continuous => ims_terms::continuous(),
                ImzmlMode::Processed => ims_terms::processed(),
            };
            let content = CvParamList::new()
                .with(storage)
                .with(ims_terms::uuid(&self.uuid.braced().to_string()))
                .with(ims_terms::ibd_sha1(&self.sha1_hex()));
            mzml::write_file_description(&mut xml, run, &content)?;
            self.write_param_groups(&mut xml, options)?;
            mzml::write_software_list(&mut xml, run)?;
            self.write_scan_settings(&mut xml)?;
            mzml::write_instrument_configuration(&mut xml, run)?;
            mzml::write_data_processing(&mut xml)?;
            mzml::open_run(&mut xml, run)?;

            let count = count.to_string();
            xml.start(
                "spectrumList",
                &[("count", count.as_str()), ("defaultDataProcessingRef", DATA_PROCESSING_ID)],
            )?;
            body.seek(SeekFrom::Start(0))?;
            let inner = xml.get_mut();
            inner.write_all(b"\n")?;
            io::copy(&mut body, inner)?;
            xml.end("spectrumList")?;
            xml.end("run")?;
            xml.end("mzML")?;
            let mut inner = xml.into_inner();
            inner.write_all(b"\n")?;
            inner.flush()?;
        }
        output.persist(&self.imzml_path)?;
        Ok(())
    }
}

impl SpectrumSink for ImzmlSink {
    fn write_run_header(&mut self, run: &RunMetadata) -> Result<(), SinkError> {
        if self.run.is_some() {
            return Err(SinkError::Closed("already holding a run header"));
        }
        self.run = Some(run.clone());
        Ok(())
    }

    fn begin_spectrum_list(&mut self, declared: usize) -> Result<(), SinkError> {
        if self.run.is_none() || self.list_open {
            return Err(SinkError::Closed("not ready for a spectrum list"));
        }
        self.declared = declared;
        self.list_open = true;
        Ok(())
    }

    fn write_spectrum(&mut self, emitted: &EmittedSpectrum<'_>, options: WriteOptions) -> Result<(), SinkError> {
        if !self.list_open {
            return Err(SinkError::Closed("not streaming spectra"));
        }
        let spectrum = emitted.spectrum;
        let Some(Coordinate::Pixel { x, y, z }) = spectrum.coordinate() else {
            return Err(SinkError::Unsupported {
                scan_number: emitted.scan_number,
                reason: "imzML spectra need a pixel coordinate".to_string(),
            });
        };
        let (x, y, z) = (*x, *y, *z);
        if self.options.is_none() {
            if options.compression != Compression::None {
                warn!("imzML binary data is written uncompressed");
            }
            self.options = Some(options);
        }

        let mz = self.mz_array(emitted, options)?;
        let intensity = self.append_array(spectrum.intensity(), options)?;
        let mobility = match spectrum.mobility() {
            Some(values) => Some(self.append_array(values, options)?),
            None => None,
        };
        self.has_mobility |= mobility.is_some();
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);

        let mut position = CvParamList::new()
            .with(ims_terms::position_x(x))
            .with(ims_terms::position_y(y));
        position.add_opt(z.map(ims_terms::position_z));

        let run_id = self.run.as_ref().map(|run| run.run_id.clone()).unwrap_or_default();
        let body = self.body.as_mut().ok_or(SinkError::Closed("finished"))?;
        mzml::write_spectrum_head(body, emitted, &run_id, &position)?;
        let count = if mobility.is_some() { "3" } else { "2" };
        body.start("binaryDataArrayList", &[("count", count)])?;
        Self::write_external(body, MZ_GROUP, mz)?;
        Self::write_external(body, INTENSITY_GROUP, intensity)?;
        if let Some(mobility) = mobility {
            Self::write_external(body, MOBILITY_GROUP, mobility)?;
        }
        body.end("binaryDataArrayList")?;
        body.end("spectrum")
    }

    fn correct_declared_count(&mut self, declared: usize, emitted: usize) -> Result<(), SinkError> {
        if !self.list_open {
            return Err(SinkError::Closed("not streaming spectra"));
        }
        debug!("imzML spectrum count {declared} -> {emitted}");
        self.corrected = Some(emitted);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if !self.list_open {
            return Err(SinkError::Closed("not streaming spectra"));
        }
        let run = self.run.clone().ok_or(SinkError::Closed("missing run header"))?;
        let mut ibd = self.ibd.take().ok_or(SinkError::Closed("finished"))?;
        ibd.flush()?;
        drop(ibd);
        let body = self
            .body
            .take()
            .ok_or(SinkError::Closed("finished"))?
            .into_inner()
            .into_inner()
            .map_err(|err| err.into_error())?;
        self.list_open = false;

        let count = self.corrected.unwrap_or(self.declared);
        self.write_document(&run, count, body)?;
        fs::rename(&self.ibd_paths.temporary_path, &self.ibd_paths.final_path)?;
        info!(
            "Finished writing {} ({} bytes of binary data)",
            self.imzml_path.display(),
            self.offset
        );
        Ok(())
    }
}
