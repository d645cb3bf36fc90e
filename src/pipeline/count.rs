use crate::acquisition::{AcquisitionClassifier, AcquisitionMode};
use crate::source::{AcquisitionSource, ProviderError};

/// Number of spectra a frame is expected to yield, from metadata alone.
///
/// Emptiness of the arrays is unknown at this point, so the estimate is an
/// upper bound: a ddaPASEF survey frame counts all of its precursors, even
/// those never isolated in a fragment frame.
pub fn expected_for_mode(
    source: &dyn AcquisitionSource,
    mode: AcquisitionMode,
    frame: u32,
    ms2_only: bool,
) -> usize {
    let survey = usize::from(!ms2_only);
    match mode {
        AcquisitionMode::Ms1 | AcquisitionMode::MaldiMs1 => survey,
        AcquisitionMode::DdaPasefPrecursor => survey + source.precursors(frame).len(),
        AcquisitionMode::DiaPasef => source.dia_windows(frame).len(),
        _ => 1,
    }
}

/// Expected spectrum count over `frame_ids`. Unclassified frames count zero.
pub fn expected_spectrum_count(
    source: &dyn AcquisitionSource,
    classifier: &AcquisitionClassifier,
    ms2_only: bool,
    frame_ids: &[u32],
) -> Result<usize, ProviderError> {
    let mut total = 0;
    for &id in frame_ids {
        let frame = source.frame(id)?;
        if let Some(mode) = classifier.classify_frame(&frame) {
            total += expected_for_mode(source, mode, id, ms2_only);
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::Schema;
    use crate::source::fixtures::*;
    use crate::source::*;

    fn dia_window(group: u32, begin: u32) -> DiaWindowRecord {
        DiaWindowRecord {
            window_group: group,
            scan_num_begin: begin,
            scan_num_end: begin + 5,
            isolation_mz: 600.0,
            isolation_width: 25.0,
            collision_energy: None,
        }
    }

    fn precursor(id: u32, parent: u32) -> PrecursorRecord {
        PrecursorRecord {
            id,
            parent,
            scan_number: 3.0,
            average_mz: 450.0,
            largest_peak_mz: 450.0,
            monoisotopic_mz: None,
            intensity: 100.0,
            charge: Some(2.0),
        }
    }

    fn mixed_source() -> InMemoryAcquisition {
        let frames = vec![
            frame(1, 0.0, 8, 0),
            frame(2, 0.1, 8, 8),
            frame(3, 0.2, 0, 0),
            frame(4, 0.3, 9, 9),
            frame(5, 0.4, 77, 77),
        ];
        let mut dump = dump(Schema::Tdf, frames, Vec::new());
        dump.precursors = vec![precursor(1, 1), precursor(2, 1), precursor(3, 1)];
        dump.dia_frames = vec![DiaFrameRecord {
            frame: 4,
            window_group: 1,
        }];
        dump.dia_windows = vec![dia_window(1, 0), dia_window(1, 5)];
        source(dump)
    }

    #[test]
    fn test_expected_count_per_mode() {
        let src = mixed_source();
        let classifier = AcquisitionClassifier::new(Schema::Tdf, src.metadata().layout());
        let ids = src.frame_ids();

        // 1 + 3 precursors, frame 2 unclassified, 1 MS1, 2 DIA windows, frame 5 unclassified
        assert_eq!(expected_spectrum_count(&src, &classifier, false, &ids).unwrap(), 7);
        assert_eq!(expected_spectrum_count(&src, &classifier, true, &ids).unwrap(), 5);
        assert_eq!(expected_spectrum_count(&src, &classifier, false, &[3, 4]).unwrap(), 3);
    }

    #[test]
    fn test_unknown_frame_is_an_error() {
        let src = mixed_source();
        let classifier = AcquisitionClassifier::new(Schema::Tdf, src.metadata().layout());
        assert!(expected_spectrum_count(&src, &classifier, false, &[42]).is_err());
    }
}
