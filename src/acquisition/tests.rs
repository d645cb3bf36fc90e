use super::*;

fn tdf() -> AcquisitionClassifier {
    AcquisitionClassifier::new(Schema::Tdf, Layout::LcMs)
}

#[test]
fn test_tdf_routes() {
    let c = tdf();
    assert_eq!(c.classify(8, 0), Some(AcquisitionMode::DdaPasefPrecursor));
    assert_eq!(c.classify(9, 9), Some(AcquisitionMode::DiaPasef));
    assert_eq!(c.classify(4, 2), Some(AcquisitionMode::BbCid));
    assert_eq!(c.classify(2, 2), Some(AcquisitionMode::Mrm));
    assert_eq!(c.classify(10, 10), Some(AcquisitionMode::PrmPasef));
    assert_eq!(c.classify(0, 0), Some(AcquisitionMode::Ms1));
    assert_eq!(c.classify(9, 0), Some(AcquisitionMode::Ms1));
}

#[test]
fn test_pasef_fragment_frames_are_skipped() {
    // (8, 8) frames are merged into precursor spectra, never emitted on their own
    assert_eq!(tdf().classify(8, 8), None);
    assert_eq!(tdf().classify(3, 7), None);
}

#[test]
fn test_tsf_routes() {
    let c = AcquisitionClassifier::new(Schema::Tsf, Layout::LcMs);
    assert_eq!(c.classify(1, 0), Some(AcquisitionMode::Ms1));
    assert_eq!(c.classify(1, 2), Some(AcquisitionMode::DdaPasefProduct));
    assert_eq!(c.classify(1, 8), Some(AcquisitionMode::DdaPasefProduct));
    assert_eq!(c.classify(4, 2), Some(AcquisitionMode::BbCid));
    assert_eq!(c.classify(2, 10), Some(AcquisitionMode::Mrm));
    assert_eq!(c.classify(1, 5), None);
}

#[test]
fn test_baf_routes_ignore_msms_type() {
    let c = AcquisitionClassifier::new(Schema::Baf, Layout::LcMs);
    assert_eq!(c.classify(0, 42), Some(AcquisitionMode::Ms1));
    assert_eq!(c.classify(2, 0), Some(AcquisitionMode::DdaPasefProduct));
    assert_eq!(c.classify(4, 0), Some(AcquisitionMode::IsCid));
    assert_eq!(c.classify(5, 0), Some(AcquisitionMode::BbCid));
    assert_eq!(c.classify(1, 0), None);
}

#[test]
fn test_maldi_routes() {
    for schema in [Schema::Tdf, Schema::Tsf] {
        let c = AcquisitionClassifier::new(schema, Layout::Maldi(MaldiApplication::Imaging));
        assert_eq!(c.classify(0, 0), Some(AcquisitionMode::MaldiMs1));
        assert_eq!(c.classify(6, 2), Some(AcquisitionMode::MaldiMs2));
        assert_eq!(c.classify(6, 3), None);
    }
    let baf = AcquisitionClassifier::new(Schema::Baf, Layout::Maldi(MaldiApplication::SingleSpectra));
    assert_eq!(baf.classify(0, 0), None);
}

#[test]
fn test_every_mode_is_reachable() {
    for mode in AcquisitionMode::ALL {
        assert!(
            ROUTES.iter().any(|route| route.mode == mode),
            "no route produces {mode}"
        );
    }
}

#[test]
fn test_mode_levels() {
    assert_eq!(AcquisitionMode::DdaPasefPrecursor.ms_level(), 1);
    assert_eq!(AcquisitionMode::MaldiMs1.ms_level(), 1);
    assert_eq!(AcquisitionMode::DiaPasef.ms_level(), 2);
    assert!(AcquisitionMode::BbCid.lacks_precursor());
    assert!(AcquisitionMode::IsCid.lacks_precursor());
    assert!(!AcquisitionMode::Mrm.lacks_precursor());
}
