//! Document sections shared by the mzML and imzML writers.

use std::io::Write;

use super::xml::XmlWriter;
use crate::acquisition::Schema;
use crate::controlled_vocabulary::{
    ms_terms, ControlledVocabulary, CvParamList, IMAGING_MS, PSI_MS, UNIT_ONTOLOGY,
};
use crate::serializer::{EmittedSpectrum, RunMetadata, SinkError, OTOF_CONTROL};
use crate::spectrum::{CanonicalSpectrum, Coordinate, Polarity, PrecursorInfo, ScanType};

/// Id of this converter in `softwareList`
pub const SOFTWARE_ID: &str = "timsconvert";
/// Id of the acquisition software in `softwareList`
pub const ACQUISITION_SOFTWARE_ID: &str = "acquisition_software";
/// Id of the single instrument configuration
pub const INSTRUMENT_CONFIGURATION_ID: &str = "IC1";
/// Id of the source file
pub const SOURCE_FILE_ID: &str = "RAW1";
/// Id of the data processing applied to every spectrum
pub const DATA_PROCESSING_ID: &str = "exportation";

const MZML_NAMESPACE: &str = "http://psi.hupo.org/ms/mzml";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const MZML_SCHEMA_LOCATION: &str = "http://psi.hupo.org/ms/mzml http://psidev.info/files/ms/mzML/xsd/mzML1.1.0.xsd";

/// Open the `<mzML>` root.
pub fn open_root<W: Write>(xml: &mut XmlWriter<W>, run: &RunMetadata) -> Result<(), SinkError> {
    xml.declaration()?;
    xml.start(
        "mzML",
        &[
            ("xmlns", MZML_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", MZML_SCHEMA_LOCATION),
            ("id", run.run_id.as_str()),
            ("version", "1.1.0"),
        ],
    )
}

/// Write `<cvList>`, adding the imaging vocabulary for imzML.
pub fn write_cv_list<W: Write>(xml: &mut XmlWriter<W>, imaging: bool) -> Result<(), SinkError> {
    let mut cvs: Vec<ControlledVocabulary> = vec![PSI_MS, UNIT_ONTOLOGY];
    if imaging {
        cvs.push(IMAGING_MS);
    }
    let count = cvs.len().to_string();
    xml.start("cvList", &[("count", count.as_str())])?;
    for cv in cvs {
        xml.empty(
            "cv",
            &[
                ("id", cv.id),
                ("fullName", cv.full_name),
                ("version", cv.version),
                ("URI", cv.uri),
            ],
        )?;
    }
    xml.end("cvList")
}

/// Write `<fileDescription>` with the source acquisition and any extra file content terms.
pub fn write_file_description<W: Write>(
    xml: &mut XmlWriter<W>,
    run: &RunMetadata,
    extra_content: &CvParamList,
) -> Result<(), SinkError> {
    xml.start("fileDescription", &[])?;
    xml.start("fileContent", &[])?;
    if !run.ms2_only {
        xml.cv_param(&ms_terms::ms1_spectrum())?;
    }
    xml.cv_param(&ms_terms::msn_spectrum())?;
    xml.cv_params(extra_content)?;
    xml.end("fileContent")?;

    xml.start("sourceFileList", &[("count", "1")])?;
    let location = format!("file://{}", run.source_location);
    xml.start(
        "sourceFile",
        &[
            ("id", SOURCE_FILE_ID),
            ("name", run.source_name.as_str()),
            ("location", location.as_str()),
        ],
    )?;
    let (native_id, format) = match run.schema {
        Schema::Tdf => (ms_terms::bruker_tdf_native_id(), ms_terms::bruker_tdf_format()),
        Schema::Tsf => (ms_terms::bruker_tdf_native_id(), ms_terms::bruker_tsf_format()),
        Schema::Baf => (ms_terms::bruker_baf_native_id(), ms_terms::bruker_baf_format()),
    };
    xml.cv_param(&native_id)?;
    xml.cv_param(&format)?;
    xml.end("sourceFile")?;
    xml.end("sourceFileList")?;
    xml.end("fileDescription")
}

/// Write `<softwareList>`: this converter, plus the acquisition software unless barebones.
pub fn write_software_list<W: Write>(xml: &mut XmlWriter<W>, run: &RunMetadata) -> Result<(), SinkError> {
    let acquisition = run.software.as_deref().filter(|_| !run.barebones);
    let count = (1 + usize::from(acquisition.is_some())).to_string();
    xml.start("softwareList", &[("count", count.as_str())])?;

    xml.start(
        "software",
        &[("id", SOFTWARE_ID), ("version", env!("CARGO_PKG_VERSION"))],
    )?;
    xml.cv_param(&ms_terms::custom_software(SOFTWARE_ID))?;
    xml.end("software")?;

    if let Some(name) = acquisition {
        let version = run.software_version.as_deref().unwrap_or("unknown");
        xml.start("software", &[("id", ACQUISITION_SOFTWARE_ID), ("version", version)])?;
        if name == OTOF_CONTROL {
            xml.cv_param(&ms_terms::microtof_control())?;
        } else {
            xml.cv_param(&ms_terms::custom_software(name))?;
        }
        xml.end("software")?;
    }
    xml.end("softwareList")
}

/// Write `<instrumentConfigurationList>` with a single quadrupole-TOF configuration.
pub fn write_instrument_configuration<W: Write>(
    xml: &mut XmlWriter<W>,
    run: &RunMetadata,
) -> Result<(), SinkError> {
    xml.start("instrumentConfigurationList", &[("count", "1")])?;
    xml.start("instrumentConfiguration", &[("id", INSTRUMENT_CONFIGURATION_ID)])?;

    let mut params = CvParamList::new().with(ms_terms::bruker_instrument());
    params.add_opt(run.instrument_serial.as_deref().map(ms_terms::instrument_serial_number));
    xml.cv_params(&params)?;
    if let Some(name) = &run.instrument_name {
        xml.user_param("instrument model", name)?;
    }

    xml.start("componentList", &[("count", "4")])?;
    xml.start("source", &[("order", "1")])?;
    if run.layout.is_maldi() {
        xml.cv_param(&ms_terms::maldi())?;
    } else {
        xml.cv_param(&ms_terms::electrospray_ionization())?;
    }
    xml.end("source")?;
    xml.start("analyzer", &[("order", "2")])?;
    xml.cv_param(&ms_terms::quadrupole())?;
    xml.end("analyzer")?;
    xml.start("analyzer", &[("order", "3")])?;
    xml.cv_param(&ms_terms::tof())?;
    xml.end("analyzer")?;
    xml.start("detector", &[("order", "4")])?;
    xml.cv_param(&ms_terms::electron_multiplier())?;
    xml.end("detector")?;
    xml.end("componentList")?;

    if run.software.is_some() && !run.barebones {
        xml.empty("softwareRef", &[("ref", ACQUISITION_SOFTWARE_ID)])?;
    }
    xml.end("instrumentConfiguration")?;
    xml.end("instrumentConfigurationList")
}

/// Write `<dataProcessingList>` with the single conversion step.
pub fn write_data_processing<W: Write>(xml: &mut XmlWriter<W>) -> Result<(), SinkError> {
    xml.start("dataProcessingList", &[("count", "1")])?;
    xml.start("dataProcessing", &[("id", DATA_PROCESSING_ID)])?;
    xml.start("processingMethod", &[("order", "0"), ("softwareRef", SOFTWARE_ID)])?;
    xml.cv_param(&ms_terms::conversion_to_mzml())?;
    xml.end("processingMethod")?;
    xml.end("dataProcessing")?;
    xml.end("dataProcessingList")
}

/// Open `<run>`.
pub fn open_run<W: Write>(xml: &mut XmlWriter<W>, run: &RunMetadata) -> Result<(), SinkError> {
    let start_time = run.start_time.map(|t| t.to_rfc3339());
    let mut attributes = vec![
        ("id", run.run_id.as_str()),
        ("defaultInstrumentConfigurationRef", INSTRUMENT_CONFIGURATION_ID),
        ("defaultSourceFileRef", SOURCE_FILE_ID),
    ];
    if let Some(start_time) = &start_time {
        attributes.push(("startTimeStamp", start_time.as_str()));
    }
    xml.start("run", &attributes)?;
    if let Some(sample) = &run.sample_name {
        xml.user_param("sample name", sample)?;
    }
    Ok(())
}

/// Opening tag of `<spectrumList>`, as written to and searched in the document.
pub fn spectrum_list_tag(count: usize) -> String {
    format!("<spectrumList count=\"{count}\" defaultDataProcessingRef=\"{DATA_PROCESSING_ID}\">")
}

/// Spectrum-level parameters: type, level, representation, polarity and statistics.
pub fn spectrum_params(spectrum: &CanonicalSpectrum) -> CvParamList {
    let stats = spectrum.stats();
    let mut params = CvParamList::new();
    params.add(match spectrum.scan_type() {
        ScanType::Ms1 => ms_terms::ms1_spectrum(),
        ScanType::MsN => ms_terms::msn_spectrum(),
    });
    params.add(ms_terms::ms_level(spectrum.ms_level()));
    params.add(if spectrum.centroided() {
        ms_terms::centroid_spectrum()
    } else {
        ms_terms::profile_spectrum()
    });
    params.add(ms_terms::scan_polarity(spectrum.polarity() == Polarity::Positive));
    params.add(ms_terms::total_ion_current(stats.total_ion_current));
    params.add(ms_terms::base_peak_mz(stats.base_peak_mz));
    params.add(ms_terms::base_peak_intensity(stats.base_peak_intensity));
    params.add(ms_terms::highest_observed_mz(stats.high_mz));
    params.add(ms_terms::lowest_observed_mz(stats.low_mz));
    params
}

/// Open `<spectrum>` and write everything up to the binary arrays.
///
/// `scan_params` is appended inside `<scan>` (imzML pixel positions).
pub fn write_spectrum_head<W: Write>(
    xml: &mut XmlWriter<W>,
    emitted: &EmittedSpectrum<'_>,
    run_id: &str,
    scan_params: &CvParamList,
) -> Result<(), SinkError> {
    let spectrum = emitted.spectrum;
    let index = emitted.scan_number.saturating_sub(1).to_string();
    let id = emitted.native_id();
    let length = spectrum.len().to_string();
    xml.start(
        "spectrum",
        &[
            ("index", index.as_str()),
            ("id", id.as_str()),
            ("defaultArrayLength", length.as_str()),
        ],
    )?;

    let mut params = spectrum_params(spectrum);
    if let Some(Coordinate::Spot(spot)) = spectrum.coordinate() {
        params.add(ms_terms::maldi_spot_identifier(spot));
        params.add(ms_terms::spectrum_title(run_id));
    }
    xml.cv_params(&params)?;

    xml.start("scanList", &[("count", "1")])?;
    xml.cv_param(&ms_terms::no_combination())?;
    xml.start("scan", &[])?;
    xml.cv_param(&ms_terms::scan_start_time(spectrum.retention_time()))?;
    xml.cv_params(scan_params)?;
    xml.end("scan")?;
    xml.end("scanList")?;

    if let Some(precursor) = spectrum.precursor() {
        write_precursor(xml, precursor, emitted.parent_native_id().as_deref())?;
    }
    Ok(())
}

fn write_precursor<W: Write>(
    xml: &mut XmlWriter<W>,
    precursor: &PrecursorInfo,
    spectrum_ref: Option<&str>,
) -> Result<(), SinkError> {
    xml.start("precursorList", &[("count", "1")])?;
    match spectrum_ref {
        Some(reference) => xml.start("precursor", &[("spectrumRef", reference)])?,
        None => xml.start("precursor", &[])?,
    }

    if precursor.has_isolation_window() {
        let mut window = CvParamList::new();
        window.add_opt(precursor.target_mz.map(ms_terms::isolation_window_target));
        window.add_opt(precursor.isolation_lower_offset.map(ms_terms::isolation_window_lower_offset));
        window.add_opt(precursor.isolation_upper_offset.map(ms_terms::isolation_window_upper_offset));
        xml.start("isolationWindow", &[])?;
        xml.cv_params(&window)?;
        xml.end("isolationWindow")?;
    }

    if precursor.has_selected_ion() {
        let mut ion = CvParamList::new();
        ion.add_opt(precursor.selected_ion_mz.map(ms_terms::selected_ion_mz));
        ion.add_opt(precursor.selected_ion_intensity.map(ms_terms::peak_intensity));
        ion.add_opt(precursor.charge_state.map(ms_terms::charge_state));
        ion.add_opt(precursor.selected_ion_mobility.map(ms_terms::inverse_reduced_ion_mobility));
        ion.add_opt(precursor.selected_ion_ccs.map(ms_terms::collisional_cross_section));
        xml.start("selectedIonList", &[("count", "1")])?;
        xml.start("selectedIon", &[])?;
        xml.cv_params(&ion)?;
        xml.end("selectedIon")?;
        xml.end("selectedIonList")?;
    }

    let mut activation = CvParamList::new().with(ms_terms::cid());
    activation.add_opt(precursor.collision_energy.map(ms_terms::collision_energy));
    xml.start("activation", &[])?;
    xml.cv_params(&activation)?;
    xml.end("activation")?;

    xml.end("precursor")?;
    xml.end("precursorList")
}
