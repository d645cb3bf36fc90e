use super::*;
use crate::acquisition::{AcquisitionMode, Schema};
use crate::extract::ExtractionMode;
use crate::pipeline::link;
use crate::source::GlobalMetadata;
use crate::spectrum::{Polarity, SpectrumArrays, SpectrumHeader};
use std::path::Path;

fn record(frame: u32, mode: AcquisitionMode, parent: Option<u32>) -> CanonicalSpectrum {
    let mut header = SpectrumHeader::new(frame, mode, Polarity::Positive, true);
    header.parent_frame = parent;
    CanonicalSpectrum::new(header, SpectrumArrays::new(vec![100.0, 101.0], vec![1.0, 2.0])).unwrap()
}

fn run() -> RunMetadata {
    let metadata = GlobalMetadata {
        schema: Schema::Tdf,
        acquisition_software: Some("timsControl".to_string()),
        ..GlobalMetadata::default()
    };
    RunMetadata::new(
        &metadata,
        Path::new("/data/sample.d"),
        "sample",
        ExtractionMode::Raw,
        false,
        false,
    )
}

fn streaming(declared: usize) -> StreamingSerializer<MemorySink> {
    let mut serializer = StreamingSerializer::new(MemorySink::new(), WriteOptions::default());
    serializer.write_metadata(&run()).unwrap();
    serializer.begin(declared).unwrap();
    serializer
}

#[test]
fn test_state_order_is_enforced() {
    let mut serializer = StreamingSerializer::new(MemorySink::new(), WriteOptions::default());
    let spectrum = record(1, AcquisitionMode::Ms1, None);

    assert!(matches!(
        serializer.begin(1),
        Err(SerializerError::InvalidState {
            state: SerializerState::Init,
            ..
        })
    ));
    assert!(serializer.emit(&spectrum, None).is_err());
    assert!(serializer.finalize().is_err());

    serializer.write_metadata(&run()).unwrap();
    assert!(serializer.write_metadata(&run()).is_err());
    assert_eq!(serializer.state(), SerializerState::MetadataWritten);

    serializer.begin(1).unwrap();
    serializer.emit(&spectrum, None).unwrap();
    serializer.finalize().unwrap();
    assert_eq!(serializer.state(), SerializerState::Finalized);
    assert!(serializer.emit(&spectrum, None).is_err());
    assert!(serializer.finalize().is_err());
}

#[test]
fn test_scan_numbers_are_contiguous_across_windows() {
    let mut serializer = streaming(5);
    let first = link(vec![
        record(1, AcquisitionMode::Ms1, None),
        record(2, AcquisitionMode::DdaPasefProduct, Some(1)),
    ]);
    let second = link(vec![
        record(3, AcquisitionMode::Ms1, None),
        record(4, AcquisitionMode::DdaPasefProduct, Some(3)),
        record(5, AcquisitionMode::DdaPasefProduct, Some(3)),
    ]);
    serializer.write_window(&first).unwrap();
    serializer.write_window(&second).unwrap();

    let sink = serializer.sink();
    let numbers: Vec<u64> = sink.records.iter().map(|r| r.scan_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    let parents: Vec<Option<u64>> = sink.records.iter().map(|r| r.parent_scan_number).collect();
    assert_eq!(parents, vec![None, Some(1), None, Some(3), Some(3)]);
}

#[test]
fn test_count_corrected_only_when_unequal() {
    let mut serializer = streaming(3);
    serializer.emit(&record(1, AcquisitionMode::Ms1, None), None).unwrap();
    serializer.emit(&record(3, AcquisitionMode::Ms1, None), None).unwrap();
    let summary = serializer.finalize().unwrap();
    assert_eq!(
        summary,
        SerializationSummary {
            declared: 3,
            emitted: 2,
            corrected: true
        }
    );
    let sink = serializer.into_sink();
    assert_eq!(sink.corrections, vec![(3, 2)]);
    assert_eq!(sink.final_count(), Some(2));
    assert!(sink.finished);

    let mut serializer = streaming(1);
    serializer.emit(&record(1, AcquisitionMode::Ms1, None), None).unwrap();
    let summary = serializer.finalize().unwrap();
    assert!(!summary.corrected);
    assert!(serializer.sink().corrections.is_empty());
}

#[test]
fn test_overshoot_is_corrected_upwards() {
    let mut serializer = streaming(0);
    serializer.emit(&record(1, AcquisitionMode::Ms1, None), None).unwrap();
    let summary = serializer.finalize().unwrap();
    assert!(summary.corrected);
    assert_eq!(serializer.sink().final_count(), Some(1));
}

#[test]
fn test_unresolved_parent_is_rejected() {
    let mut serializer = streaming(1);
    let records = vec![LinkedRecord {
        spectrum: record(2, AcquisitionMode::DdaPasefProduct, Some(1)),
        parent: Some(4),
    }];
    assert!(matches!(
        serializer.write_window(&records),
        Err(SerializerError::UnresolvedParent { index: 0, parent: 4 })
    ));
}

#[test]
fn test_run_metadata_barebones_drops_details() {
    let metadata = GlobalMetadata {
        acquisition_software: Some("timsControl".to_string()),
        instrument_name: Some("timsTOF fleX".to_string()),
        ..GlobalMetadata::default()
    };
    let full = RunMetadata::new(&metadata, Path::new("/d/a.d"), "a", ExtractionMode::Raw, false, false);
    assert_eq!(full.software.as_deref(), Some("timsControl"));
    assert_eq!(full.source_name, "a.d");
    assert_eq!(full.source_location, "/d");

    let bare = RunMetadata::new(&metadata, Path::new("/d/a.d"), "a", ExtractionMode::Raw, false, true);
    assert_eq!(bare.software, None);
    assert_eq!(bare.instrument_name, None);
    assert_eq!(bare.renamed("b").run_id, "b");
}
