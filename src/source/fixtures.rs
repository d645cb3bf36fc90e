//! Builders for small in-memory acquisitions used by unit tests across the crate.

use super::*;
use crate::acquisition::Schema;

pub(crate) fn metadata(schema: Schema) -> GlobalMetadata {
    GlobalMetadata {
        schema,
        acquisition_software: Some("timsControl".to_string()),
        acquisition_software_version: Some("4.1".to_string()),
        instrument_name: Some("timsTOF Pro".to_string()),
        acquisition_date_time: Some("2024-03-01T10:15:00+01:00".to_string()),
        ..GlobalMetadata::default()
    }
}

pub(crate) fn frame(id: u32, time: f64, scan_mode: i32, msms_type: i32) -> FrameRecord {
    FrameRecord {
        id,
        time,
        scan_mode,
        msms_type,
        polarity: PolarityCode::Symbol("+".to_string()),
        num_scans: 10,
        parent: None,
    }
}

pub(crate) fn scan(scan: u32, positions: &[f64], intensities: &[f64]) -> SubScan {
    SubScan {
        scan,
        positions: positions.to_vec(),
        intensities: intensities.to_vec(),
    }
}

pub(crate) fn peaks(frame: u32, scans: Vec<SubScan>) -> FramePeaks {
    FramePeaks {
        frame,
        scans,
        profile: None,
    }
}

pub(crate) fn dump(schema: Schema, frames: Vec<FrameRecord>, peaks: Vec<FramePeaks>) -> AcquisitionDump {
    AcquisitionDump {
        metadata: metadata(schema),
        frames,
        peaks,
        ..AcquisitionDump::default()
    }
}

pub(crate) fn source(dump: AcquisitionDump) -> InMemoryAcquisition {
    InMemoryAcquisition::new(dump).expect("fixture indexes")
}
