use super::*;
use crate::source::fixtures::*;
use crate::source::{
    BafStepRecord, BafVariable, DiaWindowRecord, FrameMsMsInfoRecord, FrameRecord, GlobalMetadata,
    InMemoryAcquisition, MaldiFrameRecord, PrecursorRecord, PrmFrameRecord, PrmTargetRecord,
    ProfileTrace, SubScan,
};

fn settings(mode: ExtractionMode, schema: Schema) -> ExtractionSettings {
    let config = ConversionConfig {
        mode,
        ..ConversionConfig::default()
    };
    ExtractionSettings::resolve(&config, schema)
}

fn tdf() -> InMemoryAcquisition {
    let frames = vec![frame(1, 0.0, 0, 0), frame(2, 1.0, 8, 8), frame(3, 2.0, 0, 0)];
    let peaks = vec![
        peaks(
            1,
            vec![
                scan(2, &[300.0, 100.0], &[1.0, 2.0]),
                scan(4, &[100.0, 200.0], &[2.0, 5.0]),
                scan(6, &[], &[]),
                scan(8, &[400.0], &[1.0, 1.0]),
            ],
        ),
        peaks(
            2,
            vec![
                scan(1, &[150.001], &[1.0]),
                scan(5, &[150.003, 150.5], &[2.0, 3.0]),
            ],
        ),
    ];
    source(dump(Schema::Tdf, frames, peaks))
}

#[test]
fn test_settings_resolution() {
    let s = settings(ExtractionMode::Profile, Schema::Tdf);
    assert!(s.exclude_mobility);
    assert_eq!(s.mode, ExtractionMode::Profile);

    let s = settings(ExtractionMode::Raw, Schema::Tsf);
    assert_eq!(s.mode, ExtractionMode::Centroid);
    let s = settings(ExtractionMode::Raw, Schema::Baf);
    assert_eq!(s.mode, ExtractionMode::Centroid);

    let s = settings(ExtractionMode::Raw, Schema::Tdf);
    assert_eq!(s.mode, ExtractionMode::Raw);
    assert!(!s.exclude_mobility);
}

#[test]
fn test_raw_2d_drops_bad_scans_and_collapses_duplicates() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));
    let arrays = extractor.extract_2d(1, None).unwrap().into_arrays().unwrap();
    // (100, 2) appears twice: exact duplicate dropped before summing
    assert_eq!(arrays.mz, vec![100.0, 200.0, 300.0]);
    assert_eq!(arrays.intensity, vec![2.0, 5.0, 1.0]);
    assert!(arrays.mobility.is_none());
}

#[test]
fn test_3d_uses_absolute_scan_numbers() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));
    let arrays = extractor
        .extract(1, Some(ScanRange::new(4, 10)), true)
        .unwrap()
        .into_arrays()
        .unwrap();
    assert_eq!(arrays.mz, vec![100.0, 200.0]);
    let mobility = arrays.mobility.unwrap();
    let expected = src.calibration().scan_to_mobility(4.0);
    assert!(mobility.iter().all(|k| (*k - expected).abs() < 1e-12));
}

#[test]
fn test_3d_keeps_equal_mz_at_distinct_mobility() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));
    let arrays = extractor.extract(1, None, true).unwrap().into_arrays().unwrap();
    assert_eq!(arrays.mz, vec![100.0, 100.0, 200.0, 300.0]);
    let mobility = arrays.mobility.unwrap();
    assert!(mobility[0] < mobility[1]);
}

#[test]
fn test_mobility_not_allowed_collapses() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));
    let arrays = extractor.extract(1, None, false).unwrap().into_arrays().unwrap();
    assert!(arrays.mobility.is_none());
}

#[test]
fn test_empty_frame_is_not_an_error() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Centroid, Schema::Tdf));
    assert!(extractor.extract(3, None, false).unwrap().is_empty());
    assert!(extractor.extract(3, None, true).unwrap().is_empty());
}

#[test]
fn test_provider_fault_propagates() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Centroid, Schema::Tdf));
    assert!(extractor.extract(42, None, false).is_err());
}

#[test]
fn test_pasef_merge_bins_at_fixed_width() {
    let src = tdf();
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));
    // 0.005 over the default [100, 1700) range
    assert_eq!(extractor.pasef_edges().len(), 320_000);
    let windows = vec![
        PasefWindowRecord {
            frame: 2,
            scan_num_begin: 0,
            scan_num_end: 3,
            isolation_mz: 150.0,
            isolation_width: 2.0,
            collision_energy: Some(20.0),
            precursor: 1,
        },
        PasefWindowRecord {
            frame: 2,
            scan_num_begin: 3,
            scan_num_end: 6,
            isolation_mz: 150.0,
            isolation_width: 2.0,
            collision_energy: Some(20.0),
            precursor: 1,
        },
    ];
    let arrays = extractor
        .extract_pasef_precursor(&windows)
        .unwrap()
        .into_arrays()
        .unwrap();
    // 150.001 and 150.003 share a 0.005 bin
    assert_eq!(arrays.mz.len(), 2);
    assert_eq!(arrays.intensity, vec![3.0, 3.0]);
    assert!(arrays.mz[0] > 150.001 && arrays.mz[0] < 150.003);
    assert!(arrays.mobility.is_none());
}

#[test]
fn test_profile_binning() {
    let mut entry = peaks(1, vec![]);
    entry.profile = Some(ProfileTrace {
        positions: vec![100.0, 100.1, 100.2, 200.0],
        intensities: vec![1.0, 2.0, 1.0, 4.0],
    });
    let src = source(dump(Schema::Tsf, vec![frame(1, 0.0, 0, 0)], vec![entry]));
    let config = ConversionConfig {
        mode: ExtractionMode::Profile,
        profile_bins: 2,
        ..ConversionConfig::default()
    };
    let extractor = ArrayExtractor::new(&src, ExtractionSettings::resolve(&config, Schema::Tsf));
    let arrays = extractor.extract(1, None, true).unwrap().into_arrays().unwrap();
    assert_eq!(arrays.mz.len(), 2);
    assert!((arrays.mz[0] - 100.1).abs() < 1e-9);
    assert_eq!(arrays.intensity, vec![4.0, 4.0]);
}

#[test]
fn test_normalize_2d() {
    let (mz, intensity) = normalize_2d(vec![2.0, 1.0, 2.0, 2.0], vec![1.0, 5.0, 1.0, 3.0]);
    assert_eq!(mz, vec![1.0, 2.0]);
    assert_eq!(intensity, vec![5.0, 4.0]);
}

#[test]
fn test_normalize_2d_drops_non_finite_points() {
    let (mz, intensity) = normalize_2d(vec![2.0, f64::NAN, 1.0, 3.0], vec![1.0, 5.0, 2.0, f64::INFINITY]);
    assert_eq!(mz, vec![1.0, 2.0]);
    assert_eq!(intensity, vec![2.0, 1.0]);
}

/// Delegates to an in-memory acquisition but loses the last calibrated m/z value.
struct LossyCalibration(InMemoryAcquisition);

impl AcquisitionSource for LossyCalibration {
    fn metadata(&self) -> &GlobalMetadata {
        self.0.metadata()
    }
    fn frame_ids(&self) -> Vec<u32> {
        self.0.frame_ids()
    }
    fn frame(&self, id: u32) -> Result<FrameRecord, ProviderError> {
        self.0.frame(id)
    }
    fn precursors(&self, parent: u32) -> Vec<PrecursorRecord> {
        self.0.precursors(parent)
    }
    fn pasef_windows(&self, precursor: u32) -> Vec<PasefWindowRecord> {
        self.0.pasef_windows(precursor)
    }
    fn dia_windows(&self, frame: u32) -> Vec<DiaWindowRecord> {
        self.0.dia_windows(frame)
    }
    fn prm_frame(&self, frame: u32) -> Option<PrmFrameRecord> {
        self.0.prm_frame(frame)
    }
    fn prm_target(&self, id: u32) -> Option<PrmTargetRecord> {
        self.0.prm_target(id)
    }
    fn frame_msms_info(&self, frame: u32) -> Option<FrameMsMsInfoRecord> {
        self.0.frame_msms_info(frame)
    }
    fn maldi_frame(&self, frame: u32) -> Option<MaldiFrameRecord> {
        self.0.maldi_frame(frame)
    }
    fn baf_variable(&self, spectrum: u32, variable: BafVariable) -> Option<f64> {
        self.0.baf_variable(spectrum, variable)
    }
    fn baf_step(&self, spectrum: u32) -> Option<BafStepRecord> {
        self.0.baf_step(spectrum)
    }
    fn read_scans(&self, frame: u32, range: ScanRange) -> Result<Vec<SubScan>, ProviderError> {
        self.0.read_scans(frame, range)
    }
    fn read_trace(
        &self,
        frame: u32,
        range: Option<ScanRange>,
        kind: TraceKind,
    ) -> Result<crate::source::DecodedTrace, ProviderError> {
        self.0.read_trace(frame, range, kind)
    }
    fn index_to_mz(&self, frame: u32, indices: &[f64]) -> Result<Vec<f64>, ProviderError> {
        let mut mz = self.0.index_to_mz(frame, indices)?;
        mz.pop();
        Ok(mz)
    }
    fn scan_to_mobility(&self, frame: u32, scans: &[f64]) -> Result<Vec<f64>, ProviderError> {
        self.0.scan_to_mobility(frame, scans)
    }
    fn mobility_to_ccs(&self, one_over_k0: f64, charge: i32, mz: f64) -> f64 {
        self.0.mobility_to_ccs(one_over_k0, charge, mz)
    }
}

#[test]
fn test_short_calibration_is_a_decode_error() {
    let src = LossyCalibration(tdf());
    let extractor = ArrayExtractor::new(&src, settings(ExtractionMode::Raw, Schema::Tdf));

    let err = extractor.extract_2d(1, None).unwrap_err();
    assert!(matches!(err, ProviderError::DecodeError { frame: 1, .. }));
    let err = extractor.extract(1, None, true).unwrap_err();
    assert!(matches!(err, ProviderError::DecodeError { frame: 1, .. }));
}
