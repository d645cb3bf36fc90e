use super::fixtures::*;
use super::*;
use crate::acquisition::{Layout, MaldiApplication, Schema};

fn tdf_source() -> InMemoryAcquisition {
    let frames = vec![frame(2, 1.0, 8, 0), frame(1, 0.5, 0, 0)];
    let peaks = vec![peaks(
        1,
        vec![
            scan(5, &[200.0, 100.0], &[2.0, 1.0]),
            scan(3, &[100.0], &[4.0]),
            scan(7, &[300.0], &[1.0, 9.0]),
        ],
    )];
    source(dump(Schema::Tdf, frames, peaks))
}

#[test]
fn test_frame_ids_are_sorted() {
    assert_eq!(tdf_source().frame_ids(), vec![1, 2]);
}

#[test]
fn test_duplicate_frames_rejected() {
    let frames = vec![frame(1, 0.0, 0, 0), frame(1, 1.0, 0, 0)];
    let err = InMemoryAcquisition::new(dump(Schema::Tdf, frames, vec![])).unwrap_err();
    assert!(matches!(err, ProviderError::InvalidValue { .. }));
}

#[test]
fn test_missing_frame_is_an_error() {
    let src = tdf_source();
    assert!(matches!(src.frame(99), Err(ProviderError::MissingRecord { .. })));
    assert!(src.read_scans(99, ScanRange::new(0, 10)).is_err());
}

#[test]
fn test_read_scans_filters_and_orders() {
    let scans = tdf_source().read_scans(1, ScanRange::new(3, 6)).unwrap();
    let numbers: Vec<u32> = scans.iter().map(|s| s.scan).collect();
    assert_eq!(numbers, vec![3, 5]);
}

#[test]
fn test_frame_without_peaks_reads_empty() {
    let src = tdf_source();
    assert!(src.read_scans(2, ScanRange::new(0, 10)).unwrap().is_empty());
    let trace = src.read_trace(2, None, TraceKind::Centroid).unwrap();
    assert!(trace.positions.is_empty());
}

#[test]
fn test_tdf_centroid_sums_equal_indices() {
    let trace = tdf_source().read_trace(1, None, TraceKind::Centroid).unwrap();
    assert_eq!(trace.axis, TraceAxis::Mz);
    // mismatched sub-scan 7 is ignored
    assert_eq!(trace.positions, vec![100.0, 200.0]);
    assert_eq!(trace.intensities, vec![5.0, 2.0]);
}

#[test]
fn test_tsf_centroid_is_index_axis() {
    let frames = vec![frame(1, 0.0, 1, 0)];
    let peaks = vec![peaks(1, vec![scan(0, &[10.0, 20.0], &[1.0, 2.0])])];
    let src = source(dump(Schema::Tsf, frames, peaks));
    let trace = src.read_trace(1, None, TraceKind::Centroid).unwrap();
    assert_eq!(trace.axis, TraceAxis::Index);
    assert_eq!(trace.positions, vec![10.0, 20.0]);
}

#[test]
fn test_stored_profile_preferred() {
    let frames = vec![frame(1, 0.0, 0, 0)];
    let mut entry = peaks(1, vec![scan(0, &[10.0], &[1.0])]);
    entry.profile = Some(ProfileTrace {
        positions: vec![9.0, 10.0, 11.0],
        intensities: vec![0.5, 1.0, 0.5],
    });
    let src = source(dump(Schema::Tsf, frames, vec![entry]));
    let trace = src.read_trace(1, None, TraceKind::Profile).unwrap();
    assert_eq!(trace.positions.len(), 3);
    assert_eq!(trace.axis, TraceAxis::Index);
}

#[test]
fn test_linear_calibration() {
    let mut d = dump(Schema::Tdf, vec![frame(1, 0.0, 0, 0)], vec![]);
    d.calibration.mz_intercept = 50.0;
    d.calibration.mz_slope = 0.5;
    let src = source(d);
    assert_eq!(src.index_to_mz(1, &[0.0, 100.0]).unwrap(), vec![50.0, 100.0]);
    let mobility = src.scan_to_mobility(1, &[100.0]).unwrap();
    assert!((mobility[0] - 1.5).abs() < 1e-12);
}

#[test]
fn test_ccs_scales_with_charge_and_mobility() {
    let single = one_over_k0_to_ccs(1.0, 1, 500.0, 28.013, 31.85);
    let double = one_over_k0_to_ccs(1.0, 2, 500.0, 28.013, 31.85);
    let negative = one_over_k0_to_ccs(1.0, -2, 500.0, 28.013, 31.85);
    assert!(single > 150.0 && single < 300.0, "ccs = {single}");
    assert!(double > single);
    assert_eq!(double, negative);
    let half = one_over_k0_to_ccs(0.5, 1, 500.0, 28.013, 31.85);
    assert!((half * 2.0 - single).abs() < 1e-9);
}

#[test]
fn test_foreign_key_lookups() {
    let mut d = dump(Schema::Tdf, vec![frame(1, 0.0, 9, 9)], vec![]);
    d.dia_frames.push(DiaFrameRecord { frame: 1, window_group: 3 });
    d.dia_windows.push(DiaWindowRecord {
        window_group: 3,
        scan_num_begin: 0,
        scan_num_end: 5,
        isolation_mz: 500.0,
        isolation_width: 25.0,
        collision_energy: Some(30.0),
    });
    d.baf_variables.push(BafVariableRecord { spectrum: 1, variable: 7, value: 512.3 });
    let src = source(d);
    assert_eq!(src.dia_windows(1).len(), 1);
    assert!(src.dia_windows(2).is_empty());
    assert_eq!(src.baf_variable(1, BafVariable::IsolationTarget), Some(512.3));
    assert_eq!(src.baf_variable(1, BafVariable::IsolationWidth), None);
}

#[test]
fn test_metadata_layout_and_start_time() {
    let mut meta = metadata(Schema::Tdf);
    assert_eq!(meta.layout(), Layout::LcMs);
    let start = meta.acquisition_start().unwrap();
    assert_eq!(start.to_rfc3339(), "2024-03-01T10:15:00+01:00");

    meta.maldi_application = Some(MaldiApplication::Imaging);
    meta.acquisition_date_time = Some("2024-03-01 08:00:00".to_string());
    assert!(meta.layout().is_maldi());
    assert!(meta.acquisition_start().is_some());

    meta.acquisition_date_time = Some("yesterday".to_string());
    assert!(meta.acquisition_start().is_none());
}

#[test]
fn test_dump_json_defaults() {
    let json = r#"{
        "metadata": {"schema": "baf", "mz_acq_range_lower": 50.0, "mz_acq_range_upper": 3000.0},
        "frames": [{"id": 1, "time": 2.0, "scan_mode": 0, "polarity": 0}]
    }"#;
    let dump: AcquisitionDump = serde_json::from_str(json).unwrap();
    assert_eq!(dump.metadata.schema, Schema::Baf);
    assert_eq!(dump.frames[0].polarity, PolarityCode::Code(0));
    assert_eq!(dump.frames[0].msms_type, 0);
    assert_eq!(dump.calibration, Calibration::default());
}

#[test]
fn test_polarity_resolution() {
    use crate::spectrum::Polarity;
    let plus = PolarityCode::Symbol("+".to_string());
    assert_eq!(plus.resolve(Polarity::Negative).unwrap(), Polarity::Positive);
    assert_eq!(PolarityCode::Code(0).resolve(Polarity::Positive).unwrap(), Polarity::Positive);
    assert_eq!(PolarityCode::Code(1).resolve(Polarity::Positive).unwrap(), Polarity::Negative);
    assert_eq!(PolarityCode::Code(0).resolve(Polarity::Negative).unwrap(), Polarity::Negative);
    assert!(PolarityCode::Code(4).resolve(Polarity::Positive).is_err());
    assert!(PolarityCode::Symbol("?".to_string()).resolve(Polarity::Positive).is_err());
}
