use super::*;
use crate::acquisition::{AcquisitionMode, MaldiApplication, Schema};
use crate::extract::ExtractionMode;
use crate::mzml::BinaryEncoder;
use crate::pipeline::{link, Compression, FloatWidth, ImzmlMode};
use crate::serializer::{RunMetadata, SerializerError, SinkError, StreamingSerializer, WriteOptions};
use crate::source::fixtures::metadata;
use crate::spectrum::{CanonicalSpectrum, Coordinate, Polarity, SpectrumArrays, SpectrumHeader};
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;

fn run() -> RunMetadata {
    let mut global = metadata(Schema::Tdf);
    global.maldi_application = Some(MaldiApplication::Imaging);
    RunMetadata::new(&global, Path::new("/data/tissue.d"), "tissue", ExtractionMode::Centroid, false, false)
}

fn pixel(frame: u32, x: i64, y: i64, mz: Vec<f64>) -> CanonicalSpectrum {
    let mut header = SpectrumHeader::new(frame, AcquisitionMode::MaldiMs1, Polarity::Positive, true);
    header.coordinate = Some(Coordinate::Pixel { x, y, z: None });
    let intensity = (1..=mz.len()).map(|i| i as f64 * 10.0).collect();
    CanonicalSpectrum::new(header, SpectrumArrays::new(mz, intensity)).unwrap()
}

fn options() -> WriteOptions {
    WriteOptions {
        encoding: FloatWidth::Bits64,
        compression: Compression::None,
    }
}

fn write(
    dir: &Path,
    mode: ImzmlMode,
    declared: usize,
    records: Vec<CanonicalSpectrum>,
) -> Result<(String, Vec<u8>), SerializerError> {
    let sink = ImzmlSink::create(dir, "tissue", mode)?;
    let mut serializer = StreamingSerializer::new(sink, options());
    serializer.write_metadata(&run())?;
    serializer.begin(declared)?;
    serializer.write_window(&link(records))?;
    serializer.finalize()?;
    let document = fs::read_to_string(dir.join("tissue.imzML")).unwrap();
    let ibd = fs::read(dir.join("tissue.ibd")).unwrap();
    Ok((document, ibd))
}

/// Integer value of the first `cvParam` named `name` after `from`.
fn param_after(document: &str, from: usize, name: &str) -> u64 {
    let marker = format!("name=\"{name}\" value=\"");
    let start = document[from..].find(&marker).unwrap() + from + marker.len();
    let end = document[start..].find('"').unwrap() + start;
    document[start..end].parse().unwrap()
}

#[test]
fn test_processed_layout() {
    let dir = tempfile::tempdir().unwrap();
    let (document, ibd) = write(
        dir.path(),
        ImzmlMode::Processed,
        2,
        vec![pixel(1, 1, 1, vec![100.0, 200.0]), pixel(2, 2, 1, vec![150.0])],
    )
    .unwrap();

    // UUID, then m/z and intensity per pixel
    assert_eq!(ibd.len(), 16 + (2 + 2 + 1 + 1) * 8);
    assert!(document.contains("name=\"processed\""));
    assert!(document.contains("name=\"max count of pixels x\" value=\"2\""));
    assert!(document.contains("name=\"max count of pixels y\" value=\"1\""));
    assert!(document.contains("name=\"position x\" value=\"2\""));
    assert!(document.contains("<spectrumList count=\"2\""));
    assert!(document.contains("<referenceableParamGroup id=\"mzArray\">"));
    assert!(!document.contains("mobilityArray"));

    let second = document.find("id=\"scan=2\"").unwrap();
    let offset = param_after(&document, second, "external offset") as usize;
    let length = param_after(&document, second, "external encoded length") as usize;
    assert_eq!(offset, 16 + 4 * 8);
    let mz = BinaryEncoder::from_bytes(&ibd[offset..offset + length], FloatWidth::Bits64).unwrap();
    assert_eq!(mz, vec![150.0]);
}

#[test]
fn test_uuid_and_checksum_match_ibd() {
    let dir = tempfile::tempdir().unwrap();
    let (document, ibd) = write(dir.path(), ImzmlMode::Processed, 1, vec![pixel(1, 3, 4, vec![500.0])]).unwrap();

    let uuid = uuid::Uuid::from_slice(&ibd[..16]).unwrap();
    assert!(document.contains(&format!("value=\"{}\"", uuid.braced())));

    let digest: String = Sha1::digest(&ibd).iter().map(|byte| format!("{byte:02X}")).collect();
    assert!(document.contains(&format!("name=\"ibd SHA-1\" value=\"{digest}\"")));
    assert!(!dir.path().join("tissue_tmp.ibd").exists());
}

#[test]
fn test_continuous_mode_shares_mz() {
    let dir = tempfile::tempdir().unwrap();
    let mz = vec![100.0, 200.0, 300.0];
    let (document, ibd) = write(
        dir.path(),
        ImzmlMode::Continuous,
        2,
        vec![pixel(1, 1, 1, mz.clone()), pixel(2, 1, 2, mz)],
    )
    .unwrap();

    assert_eq!(ibd.len(), 16 + (3 + 3 + 3) * 8);
    assert!(document.contains("name=\"continuous\""));
    assert_eq!(document.matches("name=\"external offset\" value=\"16\"").count(), 2);
}

#[test]
fn test_continuous_mode_rejects_different_mz() {
    let dir = tempfile::tempdir().unwrap();
    let result = write(
        dir.path(),
        ImzmlMode::Continuous,
        2,
        vec![pixel(1, 1, 1, vec![100.0]), pixel(2, 1, 2, vec![101.0])],
    );

    assert!(matches!(
        result,
        Err(SerializerError::Sink(SinkError::Unsupported { scan_number: 2, .. }))
    ));
}

#[test]
fn test_spot_coordinates_are_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let mut header = SpectrumHeader::new(1, AcquisitionMode::MaldiMs1, Polarity::Positive, true);
    header.coordinate = Some(Coordinate::Spot("A1".to_string()));
    let spot = CanonicalSpectrum::new(header, SpectrumArrays::new(vec![100.0], vec![1.0])).unwrap();

    let result = write(dir.path(), ImzmlMode::Processed, 1, vec![spot]);
    assert!(matches!(result, Err(SerializerError::Sink(SinkError::Unsupported { .. }))));
}

#[test]
fn test_corrected_count_and_mobility_group() {
    let dir = tempfile::tempdir().unwrap();
    let mut header = SpectrumHeader::new(1, AcquisitionMode::MaldiMs1, Polarity::Positive, true);
    header.coordinate = Some(Coordinate::Pixel { x: 5, y: 6, z: Some(1) });
    let spectrum = CanonicalSpectrum::new(
        header,
        SpectrumArrays::with_mobility(vec![100.0], vec![1.0], vec![1.2]),
    )
    .unwrap();

    let (document, _) = write(dir.path(), ImzmlMode::Processed, 4, vec![spectrum]).unwrap();
    assert!(document.contains("<spectrumList count=\"1\""));
    assert!(document.contains("<referenceableParamGroup id=\"mobilityArray\">"));
    assert!(document.contains("name=\"position z\" value=\"1\""));
    assert!(document.trim_end().ends_with("</mzML>"));
}
