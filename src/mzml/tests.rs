use super::*;
use crate::acquisition::{AcquisitionMode, Schema};
use crate::extract::ExtractionMode;
use crate::pipeline::{link, Compression, FloatWidth};
use crate::serializer::{RunMetadata, SpectrumSink, StreamingSerializer, WriteOptions};
use crate::source::fixtures::metadata;
use crate::spectrum::{
    CanonicalSpectrum, Coordinate, Polarity, PrecursorInfo, SpectrumArrays, SpectrumHeader,
};
use std::fs;
use std::path::Path;

fn run(barebones: bool) -> RunMetadata {
    RunMetadata::new(
        &metadata(Schema::Tdf),
        Path::new("/data/sample.d"),
        "sample",
        ExtractionMode::Centroid,
        false,
        barebones,
    )
}

fn ms1(frame: u32) -> CanonicalSpectrum {
    let mut header = SpectrumHeader::new(frame, AcquisitionMode::Ms1, Polarity::Positive, true);
    header.retention_time = 1.5;
    CanonicalSpectrum::new(
        header,
        SpectrumArrays::with_mobility(vec![100.0, 200.0], vec![5.0, 7.0], vec![1.1, 0.9]),
    )
    .unwrap()
}

fn product(frame: u32, parent: u32) -> CanonicalSpectrum {
    let mut header = SpectrumHeader::new(frame, AcquisitionMode::DdaPasefProduct, Polarity::Positive, true);
    header.parent_frame = Some(parent);
    header.precursor = Some(PrecursorInfo {
        selected_ion_mz: Some(500.25),
        charge_state: Some(2),
        selected_ion_mobility: Some(1.05),
        selected_ion_ccs: Some(412.5),
        collision_energy: Some(25.0),
        ..PrecursorInfo::isolation(Some(500.0), Some(3.0))
    });
    CanonicalSpectrum::new(header, SpectrumArrays::new(vec![150.0, 250.0, 350.0], vec![1.0, 2.0, 3.0])).unwrap()
}

fn options() -> WriteOptions {
    WriteOptions {
        encoding: FloatWidth::Bits64,
        compression: Compression::None,
    }
}

fn write(dir: &Path, run: &RunMetadata, declared: usize, records: Vec<CanonicalSpectrum>) -> String {
    let sink = MzMLSink::create(dir, &run.run_id).unwrap();
    let mut serializer = StreamingSerializer::new(sink, options());
    serializer.write_metadata(run).unwrap();
    serializer.begin(declared).unwrap();
    serializer.write_window(&link(records)).unwrap();
    serializer.finalize().unwrap();
    fs::read_to_string(dir.join(format!("{}.mzML", run.run_id))).unwrap()
}

fn binaries(document: &str) -> Vec<&str> {
    document
        .split("<binary>")
        .skip(1)
        .filter_map(|chunk| chunk.split("</binary>").next())
        .collect()
}

#[test]
fn test_document_structure() {
    let dir = tempfile::tempdir().unwrap();
    let document = write(dir.path(), &run(false), 3, vec![ms1(1), product(2, 1), product(3, 1)]);

    assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(document.contains(&spectrum_list_tag(3)));
    assert!(document.contains("id=\"scan=1\""));
    assert!(document.contains("id=\"scan=3\""));
    assert_eq!(document.matches("spectrumRef=\"scan=1\"").count(), 2);
    assert!(document.contains("accession=\"MS:1002817\""));
    assert!(document.contains("accession=\"MS:1003006\""));
    assert!(document.contains("name=\"electrospray ionization\""));
    assert!(document.contains("startTimeStamp=\"2024-03-01T10:15:00+01:00\""));
    assert!(document.contains("version=\"4.1\""));
    assert!(document.trim_end().ends_with("</mzML>"));
    assert!(!dir.path().join("sample_tmp.mzML").exists());
}

#[test]
fn test_precursor_terms() {
    let dir = tempfile::tempdir().unwrap();
    let document = write(dir.path(), &run(false), 2, vec![ms1(1), product(2, 1)]);

    assert!(document.contains("name=\"isolation window target m/z\" value=\"500\""));
    assert!(document.contains("name=\"isolation window lower offset\" value=\"1.5\""));
    assert!(document.contains("name=\"selected ion m/z\" value=\"500.25\""));
    assert!(document.contains("name=\"charge state\" value=\"2\""));
    assert!(document.contains("name=\"collisional cross sectional area\" value=\"412.5\""));
    assert!(document.contains("name=\"collision energy\" value=\"25\""));
}

#[test]
fn test_arrays_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let document = write(dir.path(), &run(false), 1, vec![ms1(1)]);

    let arrays = binaries(&document);
    assert_eq!(arrays.len(), 3);
    assert_eq!(BinaryEncoder::decode(arrays[0], options()).unwrap(), vec![100.0, 200.0]);
    assert_eq!(BinaryEncoder::decode(arrays[1], options()).unwrap(), vec![5.0, 7.0]);
    assert_eq!(BinaryEncoder::decode(arrays[2], options()).unwrap(), vec![1.1, 0.9]);
}

#[test]
fn test_declared_count_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let document = write(dir.path(), &run(false), 3, vec![ms1(1), ms1(3)]);

    assert!(document.contains(&spectrum_list_tag(2)));
    assert!(!document.contains(&spectrum_list_tag(3)));
    assert!(!dir.path().join("sample_tmp.mzML").exists());
}

#[test]
fn test_count_replacement_reports_missing_tag() {
    let from = spectrum_list_tag(3);
    let to = spectrum_list_tag(2);

    let mut out = Vec::new();
    let input = format!("<run>\n  {from}\n{from}\n</run>\n");
    assert!(super::writer::replace_first(&mut input.as_bytes(), &mut out, &from, &to).unwrap());
    let rewritten = String::from_utf8(out).unwrap();
    assert_eq!(rewritten, format!("<run>\n  {to}\n{from}\n</run>\n"));

    let mut out = Vec::new();
    let input = "<run>\n<spectrumList count=\"7\">\n</run>\n";
    assert!(!super::writer::replace_first(&mut input.as_bytes(), &mut out, &from, &to).unwrap());
    assert_eq!(out, input.as_bytes());
}

#[test]
fn test_barebones_omits_acquisition_software() {
    let dir = tempfile::tempdir().unwrap();
    let document = write(dir.path(), &run(true), 1, vec![ms1(1)]);

    assert!(document.contains("<softwareList count=\"1\">"));
    assert!(!document.contains("timsControl"));
    assert!(!document.contains(ACQUISITION_SOFTWARE_ID));
}

#[test]
fn test_maldi_spot_is_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let mut header = SpectrumHeader::new(1, AcquisitionMode::MaldiMs1, Polarity::Negative, true);
    header.coordinate = Some(Coordinate::Spot("B7".to_string()));
    let spectrum = CanonicalSpectrum::new(header, SpectrumArrays::new(vec![700.0], vec![1.0])).unwrap();
    let document = write(dir.path(), &run(false), 1, vec![spectrum]);

    assert!(document.contains("name=\"MALDI spot identifier\" value=\"B7\""));
    assert!(document.contains("name=\"negative scan\""));
}

#[test]
fn test_unfinished_run_keeps_temporary_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = MzMLSink::create(dir.path(), "partial").unwrap();
    sink.write_run_header(&run(false)).unwrap();
    sink.begin_spectrum_list(4).unwrap();
    drop(sink);

    assert!(dir.path().join("partial_tmp.mzML").exists());
    assert!(!dir.path().join("partial.mzML").exists());
}

#[test]
fn test_sink_rejects_out_of_order_calls() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = MzMLSink::create(dir.path(), "order").unwrap();
    assert!(sink.begin_spectrum_list(1).is_err());
    sink.write_run_header(&run(false)).unwrap();
    sink.begin_spectrum_list(0).unwrap();
    sink.finish().unwrap();
    assert!(sink.finish().is_err());
}
