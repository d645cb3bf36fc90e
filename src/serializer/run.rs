use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::Path;

use crate::acquisition::{Layout, Schema};
use crate::extract::ExtractionMode;
use crate::source::GlobalMetadata;

/// otofControl reports itself under this name; it maps to the micrOTOFcontrol CV term.
pub const OTOF_CONTROL: &str = "Bruker otofControl";

/// Run-level description written before any spectrum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    /// Run identifier, the output stem
    pub run_id: String,
    /// Acquisition directory name
    pub source_name: String,
    /// Directory holding the acquisition
    pub source_location: String,
    /// Storage schema
    pub schema: Schema,
    /// LC or MALDI
    pub layout: Layout,
    /// Extraction mode after resolution
    pub mode: ExtractionMode,
    /// Whether MS1 spectra are omitted
    pub ms2_only: bool,
    /// Acquisition software name, omitted in barebones mode
    pub software: Option<String>,
    /// Acquisition software version
    pub software_version: Option<String>,
    /// Instrument model, omitted in barebones mode
    pub instrument_name: Option<String>,
    /// Instrument serial number, omitted in barebones mode
    pub instrument_serial: Option<String>,
    /// Acquisition start
    pub start_time: Option<DateTime<FixedOffset>>,
    /// Sample name
    pub sample_name: Option<String>,
    /// Whether software and processing details are omitted
    pub barebones: bool,
}

impl RunMetadata {
    /// Describe a run from the acquisition metadata.
    pub fn new(
        metadata: &GlobalMetadata,
        input: &Path,
        run_id: impl Into<String>,
        mode: ExtractionMode,
        ms2_only: bool,
        barebones: bool,
    ) -> Self {
        let source_name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_location = input
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        let detail = |value: &Option<String>| if barebones { None } else { value.clone() };

        Self {
            run_id: run_id.into(),
            source_name,
            source_location,
            schema: metadata.schema,
            layout: metadata.layout(),
            mode,
            ms2_only,
            software: detail(&metadata.acquisition_software),
            software_version: detail(&metadata.acquisition_software_version),
            instrument_name: detail(&metadata.instrument_name),
            instrument_serial: detail(&metadata.instrument_serial_number),
            start_time: metadata.acquisition_start(),
            sample_name: metadata.sample_name.clone(),
            barebones,
        }
    }

    /// Whether spectra carry profile data.
    pub fn is_profile(&self) -> bool {
        self.mode == ExtractionMode::Profile
    }

    /// Same run under a different identifier, for grouped outputs.
    pub fn renamed(&self, run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..self.clone()
        }
    }
}
