//! # Controlled vocabulary terms
//!
//! CV terms written into mzML and imzML documents: the HUPO-PSI MS vocabulary,
//! the Unit Ontology and the imzML (IMS) vocabulary.
//!
//! ## Reference
//! - PSI-MS: https://github.com/HUPO-PSI/psi-ms-CV
//! - imzML: https://ms-imaging.org/imzml/

use serde::{Deserialize, Serialize};
use std::fmt;

/// A controlled vocabulary term with its accession and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CvTerm {
    /// CV accession (e.g., "MS:1000511")
    pub accession: String,
    /// Human-readable name
    pub name: String,
    /// Optional value associated with the term
    pub value: Option<String>,
    /// Optional unit accession for the value
    pub unit_accession: Option<String>,
    /// Optional unit name
    pub unit_name: Option<String>,
}

impl CvTerm {
    /// Create a new CV term with accession and name
    pub fn new(accession: &str, name: &str) -> Self {
        Self {
            accession: accession.to_string(),
            name: name.to_string(),
            value: None,
            unit_accession: None,
            unit_name: None,
        }
    }

    /// Add a value to the CV term
    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Add a unit to the CV term value
    pub fn with_unit(mut self, unit_accession: &str, unit_name: &str) -> Self {
        self.unit_accession = Some(unit_accession.to_string());
        self.unit_name = Some(unit_name.to_string());
        self
    }

    /// Vocabulary prefix of an accession (`MS`, `UO`, `IMS`).
    pub fn cv_ref(&self) -> &str {
        cv_prefix(&self.accession)
    }

    /// Vocabulary prefix of the unit accession.
    pub fn unit_cv_ref(&self) -> Option<&str> {
        self.unit_accession.as_deref().map(cv_prefix)
    }
}

fn cv_prefix(accession: &str) -> &str {
    accession.split_once(':').map_or(accession, |(prefix, _)| prefix)
}

impl fmt::Display for CvTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "[{}: {}={}]", self.accession, self.name, v),
            None => write!(f, "[{}: {}]", self.accession, self.name),
        }
    }
}

/// A vocabulary referenced from the `cvList` of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlledVocabulary {
    /// Prefix used in `cvRef`
    pub id: &'static str,
    /// Full name
    pub full_name: &'static str,
    /// Version
    pub version: &'static str,
    /// Location of the OBO file
    pub uri: &'static str,
}

/// PSI-MS
pub const PSI_MS: ControlledVocabulary = ControlledVocabulary {
    id: "MS",
    full_name: "Proteomics Standards Initiative Mass Spectrometry Ontology",
    version: "4.1.79",
    uri: "https://raw.githubusercontent.com/HUPO-PSI/psi-ms-CV/master/psi-ms.obo",
};

/// Unit Ontology
pub const UNIT_ONTOLOGY: ControlledVocabulary = ControlledVocabulary {
    id: "UO",
    full_name: "Unit Ontology",
    version: "09:04:2014",
    uri: "https://raw.githubusercontent.com/bio-ontology-research-group/unit-ontology/master/unit.obo",
};

/// imzML imaging vocabulary
pub const IMAGING_MS: ControlledVocabulary = ControlledVocabulary {
    id: "IMS",
    full_name: "Imaging MS Ontology",
    version: "1.1.0",
    uri: "https://raw.githubusercontent.com/imzML/imzML/master/imagingMS.obo",
};

/// MS CV terms used in mzML output
pub mod ms_terms {
    use super::{unit_terms, CvTerm};

    // =========================================================================
    // Spectrum-level terms
    // =========================================================================

    /// MS:1000579 - MS1 spectrum
    pub fn ms1_spectrum() -> CvTerm {
        CvTerm::new("MS:1000579", "MS1 spectrum")
    }

    /// MS:1000580 - MSn spectrum
    pub fn msn_spectrum() -> CvTerm {
        CvTerm::new("MS:1000580", "MSn spectrum")
    }

    /// MS:1000511 - ms level
    pub fn ms_level(level: u8) -> CvTerm {
        CvTerm::new("MS:1000511", "ms level").with_value(level)
    }

    /// MS:1000127 - centroid spectrum
    pub fn centroid_spectrum() -> CvTerm {
        CvTerm::new("MS:1000127", "centroid spectrum")
    }

    /// MS:1000128 - profile spectrum
    pub fn profile_spectrum() -> CvTerm {
        CvTerm::new("MS:1000128", "profile spectrum")
    }

    /// MS:1000832 - MALDI spot identifier
    pub fn maldi_spot_identifier(spot: &str) -> CvTerm {
        CvTerm::new("MS:1000832", "MALDI spot identifier").with_value(spot)
    }

    /// MS:1000796 - spectrum title
    pub fn spectrum_title(title: &str) -> CvTerm {
        CvTerm::new("MS:1000796", "spectrum title").with_value(title)
    }

    // =========================================================================
    // Polarity terms
    // =========================================================================

    /// MS:1000130 - positive scan
    pub fn positive_scan() -> CvTerm {
        CvTerm::new("MS:1000130", "positive scan")
    }

    /// MS:1000129 - negative scan
    pub fn negative_scan() -> CvTerm {
        CvTerm::new("MS:1000129", "negative scan")
    }

    /// MS:1000465 - scan polarity
    pub fn scan_polarity(is_positive: bool) -> CvTerm {
        if is_positive {
            positive_scan()
        } else {
            negative_scan()
        }
    }

    // =========================================================================
    // Spectrum statistics
    // =========================================================================

    /// MS:1000285 - total ion current
    pub fn total_ion_current(tic: f64) -> CvTerm {
        CvTerm::new("MS:1000285", "total ion current").with_value(tic)
    }

    /// MS:1000504 - base peak m/z
    pub fn base_peak_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000504", "base peak m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000505 - base peak intensity
    pub fn base_peak_intensity(intensity: f64) -> CvTerm {
        CvTerm::new("MS:1000505", "base peak intensity")
            .with_value(intensity)
            .with_unit("MS:1000131", "number of detector counts")
    }

    /// MS:1000527 - highest observed m/z
    pub fn highest_observed_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000527", "highest observed m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000528 - lowest observed m/z
    pub fn lowest_observed_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000528", "lowest observed m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    // =========================================================================
    // Scan terms
    // =========================================================================

    /// MS:1000795 - no combination
    pub fn no_combination() -> CvTerm {
        CvTerm::new("MS:1000795", "no combination")
    }

    /// MS:1000016 - scan start time, in minutes
    pub fn scan_start_time(minutes: f64) -> CvTerm {
        let unit = unit_terms::minute();
        CvTerm::new("MS:1000016", "scan start time")
            .with_value(minutes)
            .with_unit(&unit.accession, &unit.name)
    }

    /// MS:1002815 - inverse reduced ion mobility
    pub fn inverse_reduced_ion_mobility(one_over_k0: f64) -> CvTerm {
        CvTerm::new("MS:1002815", "inverse reduced ion mobility")
            .with_value(one_over_k0)
            .with_unit("MS:1002814", "volt-second per square centimeter")
    }

    // =========================================================================
    // Precursor terms
    // =========================================================================

    /// MS:1000827 - isolation window target m/z
    pub fn isolation_window_target(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000827", "isolation window target m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000828 - isolation window lower offset
    pub fn isolation_window_lower_offset(offset: f64) -> CvTerm {
        CvTerm::new("MS:1000828", "isolation window lower offset")
            .with_value(offset)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000829 - isolation window upper offset
    pub fn isolation_window_upper_offset(offset: f64) -> CvTerm {
        CvTerm::new("MS:1000829", "isolation window upper offset")
            .with_value(offset)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000744 - selected ion m/z
    pub fn selected_ion_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000744", "selected ion m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    /// MS:1000042 - peak intensity
    pub fn peak_intensity(intensity: f64) -> CvTerm {
        CvTerm::new("MS:1000042", "peak intensity")
            .with_value(intensity)
            .with_unit("MS:1000131", "number of detector counts")
    }

    /// MS:1000041 - charge state
    pub fn charge_state(charge: i32) -> CvTerm {
        CvTerm::new("MS:1000041", "charge state").with_value(charge)
    }

    /// MS:1002954 - collisional cross sectional area
    pub fn collisional_cross_section(ccs: f64) -> CvTerm {
        let unit = unit_terms::square_angstrom();
        CvTerm::new("MS:1002954", "collisional cross sectional area")
            .with_value(ccs)
            .with_unit(&unit.accession, &unit.name)
    }

    // =========================================================================
    // Activation terms
    // =========================================================================

    /// MS:1000045 - collision energy
    pub fn collision_energy(energy: f64) -> CvTerm {
        let unit = unit_terms::electronvolt();
        CvTerm::new("MS:1000045", "collision energy")
            .with_value(energy)
            .with_unit(&unit.accession, &unit.name)
    }

    /// MS:1000133 - collision-induced dissociation
    pub fn cid() -> CvTerm {
        CvTerm::new("MS:1000133", "collision-induced dissociation")
    }

    // =========================================================================
    // Binary data array terms
    // =========================================================================

    /// MS:1000514 - m/z array
    pub fn mz_array() -> CvTerm {
        CvTerm::new("MS:1000514", "m/z array").with_unit("MS:1000040", "m/z")
    }

    /// MS:1000515 - intensity array
    pub fn intensity_array() -> CvTerm {
        CvTerm::new("MS:1000515", "intensity array").with_unit("MS:1000131", "number of detector counts")
    }

    /// MS:1003006 - mean inverse reduced ion mobility array
    pub fn mean_inverse_reduced_ion_mobility_array() -> CvTerm {
        CvTerm::new("MS:1003006", "mean inverse reduced ion mobility array")
            .with_unit("MS:1002814", "volt-second per square centimeter")
    }

    /// MS:1000521 - 32-bit float
    pub fn float_32() -> CvTerm {
        CvTerm::new("MS:1000521", "32-bit float")
    }

    /// MS:1000523 - 64-bit float
    pub fn float_64() -> CvTerm {
        CvTerm::new("MS:1000523", "64-bit float")
    }

    /// MS:1000574 - zlib compression
    pub fn zlib_compression() -> CvTerm {
        CvTerm::new("MS:1000574", "zlib compression")
    }

    /// MS:1000576 - no compression
    pub fn no_compression() -> CvTerm {
        CvTerm::new("MS:1000576", "no compression")
    }

    // =========================================================================
    // Source and instrument terms
    // =========================================================================

    /// MS:1000073 - electrospray ionization
    pub fn electrospray_ionization() -> CvTerm {
        CvTerm::new("MS:1000073", "electrospray ionization")
    }

    /// MS:1000075 - matrix-assisted laser desorption ionization
    pub fn maldi() -> CvTerm {
        CvTerm::new("MS:1000075", "matrix-assisted laser desorption ionization")
    }

    /// MS:1000081 - quadrupole
    pub fn quadrupole() -> CvTerm {
        CvTerm::new("MS:1000081", "quadrupole")
    }

    /// MS:1000084 - time-of-flight
    pub fn tof() -> CvTerm {
        CvTerm::new("MS:1000084", "time-of-flight")
    }

    /// MS:1000253 - electron multiplier
    pub fn electron_multiplier() -> CvTerm {
        CvTerm::new("MS:1000253", "electron multiplier")
    }

    /// MS:1000122 - Bruker Daltonics instrument model
    pub fn bruker_instrument() -> CvTerm {
        CvTerm::new("MS:1000122", "Bruker Daltonics instrument model")
    }

    /// MS:1000529 - instrument serial number
    pub fn instrument_serial_number(serial: &str) -> CvTerm {
        CvTerm::new("MS:1000529", "instrument serial number").with_value(serial)
    }

    // =========================================================================
    // Software and processing terms
    // =========================================================================

    /// MS:1000544 - Conversion to mzML
    pub fn conversion_to_mzml() -> CvTerm {
        CvTerm::new("MS:1000544", "Conversion to mzML")
    }

    /// MS:1000726 - micrOTOFcontrol
    pub fn microtof_control() -> CvTerm {
        CvTerm::new("MS:1000726", "micrOTOFcontrol")
    }

    /// MS:1000799 - custom unreleased software tool
    pub fn custom_software(name: &str) -> CvTerm {
        CvTerm::new("MS:1000799", "custom unreleased software tool").with_value(name)
    }

    // =========================================================================
    // File format terms
    // =========================================================================

    /// MS:1002817 - Bruker TDF format
    pub fn bruker_tdf_format() -> CvTerm {
        CvTerm::new("MS:1002817", "Bruker TDF format")
    }

    /// MS:1003282 - Bruker TSF format
    pub fn bruker_tsf_format() -> CvTerm {
        CvTerm::new("MS:1003282", "Bruker TSF format")
    }

    /// MS:1000815 - Bruker BAF format
    pub fn bruker_baf_format() -> CvTerm {
        CvTerm::new("MS:1000815", "Bruker BAF format")
    }

    /// MS:1002818 - Bruker TDF nativeID format
    pub fn bruker_tdf_native_id() -> CvTerm {
        CvTerm::new("MS:1002818", "Bruker TDF nativeID format")
    }

    /// MS:1000772 - Bruker BAF nativeID format
    pub fn bruker_baf_native_id() -> CvTerm {
        CvTerm::new("MS:1000772", "Bruker BAF nativeID format")
    }
}

/// Unit Ontology terms
pub mod unit_terms {
    use super::CvTerm;

    /// UO:0000031 - minute
    pub fn minute() -> CvTerm {
        CvTerm::new("UO:0000031", "minute")
    }

    /// UO:0000266 - electronvolt
    pub fn electronvolt() -> CvTerm {
        CvTerm::new("UO:0000266", "electronvolt")
    }

    /// UO:0000324 - square angstrom
    pub fn square_angstrom() -> CvTerm {
        CvTerm::new("UO:0000324", "square angstrom")
    }
}

/// imzML (IMS) terms
pub mod ims_terms {
    use super::CvTerm;

    /// IMS:1000080 - universally unique identifier
    pub fn uuid(uuid: &str) -> CvTerm {
        CvTerm::new("IMS:1000080", "universally unique identifier").with_value(uuid)
    }

    /// IMS:1000091 - ibd SHA-1
    pub fn ibd_sha1(digest: &str) -> CvTerm {
        CvTerm::new("IMS:1000091", "ibd SHA-1").with_value(digest)
    }

    /// IMS:1000030 - continuous
    pub fn continuous() -> CvTerm {
        CvTerm::new("IMS:1000030", "continuous")
    }

    /// IMS:1000031 - processed
    pub fn processed() -> CvTerm {
        CvTerm::new("IMS:1000031", "processed")
    }

    /// IMS:1000042 - max count of pixels x
    pub fn max_count_of_pixels_x(count: i64) -> CvTerm {
        CvTerm::new("IMS:1000042", "max count of pixels x").with_value(count)
    }

    /// IMS:1000043 - max count of pixels y
    pub fn max_count_of_pixels_y(count: i64) -> CvTerm {
        CvTerm::new("IMS:1000043", "max count of pixels y").with_value(count)
    }

    /// IMS:1000050 - position x
    pub fn position_x(x: i64) -> CvTerm {
        CvTerm::new("IMS:1000050", "position x").with_value(x)
    }

    /// IMS:1000051 - position y
    pub fn position_y(y: i64) -> CvTerm {
        CvTerm::new("IMS:1000051", "position y").with_value(y)
    }

    /// IMS:1000052 - position z
    pub fn position_z(z: i64) -> CvTerm {
        CvTerm::new("IMS:1000052", "position z").with_value(z)
    }

    /// IMS:1000101 - external data
    pub fn external_data() -> CvTerm {
        CvTerm::new("IMS:1000101", "external data").with_value("true")
    }

    /// IMS:1000102 - external offset
    pub fn external_offset(offset: u64) -> CvTerm {
        CvTerm::new("IMS:1000102", "external offset").with_value(offset)
    }

    /// IMS:1000103 - external array length
    pub fn external_array_length(length: usize) -> CvTerm {
        CvTerm::new("IMS:1000103", "external array length").with_value(length)
    }

    /// IMS:1000104 - external encoded length
    pub fn external_encoded_length(length: u64) -> CvTerm {
        CvTerm::new("IMS:1000104", "external encoded length").with_value(length)
    }
}

/// A parameter list containing multiple CV terms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvParamList {
    params: Vec<CvTerm>,
}

impl CvParamList {
    /// Create a new empty parameter list
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a CV term to the list
    pub fn add(&mut self, term: CvTerm) {
        self.params.push(term);
    }

    /// Add a CV term to the list (builder pattern)
    pub fn with(mut self, term: CvTerm) -> Self {
        self.add(term);
        self
    }

    /// Add a term only when present
    pub fn add_opt(&mut self, term: Option<CvTerm>) {
        if let Some(term) = term {
            self.add(term);
        }
    }

    /// Get a CV term by accession
    pub fn get(&self, accession: &str) -> Option<&CvTerm> {
        self.params.iter().find(|t| t.accession == accession)
    }

    /// Iterate over all CV terms
    pub fn iter(&self) -> impl Iterator<Item = &CvTerm> {
        self.params.iter()
    }

    /// Get the number of CV terms
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<CvTerm> for CvParamList {
    fn from_iter<I: IntoIterator<Item = CvTerm>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_term_creation() {
        let term = ms_terms::ms_level(2);
        assert_eq!(term.accession, "MS:1000511");
        assert_eq!(term.value, Some("2".to_string()));
        assert_eq!(term.cv_ref(), "MS");
    }

    #[test]
    fn test_cv_term_with_unit() {
        let term = ms_terms::scan_start_time(1.5);
        assert_eq!(term.unit_accession, Some("UO:0000031".to_string()));
        assert_eq!(term.unit_name, Some("minute".to_string()));
        assert_eq!(term.unit_cv_ref(), Some("UO"));

        let ccs = ms_terms::collisional_cross_section(412.5);
        assert_eq!(ccs.unit_accession.as_deref(), Some("UO:0000324"));
    }

    #[test]
    fn test_imaging_terms() {
        let term = ims_terms::external_offset(16);
        assert_eq!(term.cv_ref(), "IMS");
        assert_eq!(term.value.as_deref(), Some("16"));
        assert_eq!(term.to_string(), "[IMS:1000102: external offset=16]");
    }

    #[test]
    fn test_cv_param_list() {
        let mut list = CvParamList::new()
            .with(ms_terms::ms_level(2))
            .with(ms_terms::scan_start_time(1.0));
        list.add_opt(None);
        list.add_opt(Some(ms_terms::cid()));

        assert_eq!(list.len(), 3);
        assert!(list.get("MS:1000511").is_some());
        assert!(list.get("MS:1000133").is_some());
    }
}
