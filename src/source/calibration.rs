use serde::{Deserialize, Serialize};

/// Combined physical constants of the Mason-Schamp relation for 1/K0 in V·s/cm²,
/// masses in Da, temperature in K and CCS in Å².
const MASON_SCHAMP_CONSTANT: f64 = 18509.8632163405;

const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Linear calibrations used by [`InMemoryAcquisition`](super::InMemoryAcquisition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// m/z at TOF index 0
    pub mz_intercept: f64,
    /// m/z per TOF index
    pub mz_slope: f64,
    /// 1/K0 at sub-scan 0
    pub mobility_intercept: f64,
    /// 1/K0 per sub-scan
    pub mobility_slope: f64,
    /// Drift gas mass in Da (N2)
    pub gas_mass: f64,
    /// Drift gas temperature in °C
    pub gas_temperature: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            mz_intercept: 0.0,
            mz_slope: 1.0,
            mobility_intercept: 1.6,
            mobility_slope: -0.001,
            gas_mass: 28.013,
            gas_temperature: 31.85,
        }
    }
}

impl Calibration {
    /// TOF index to m/z.
    pub fn index_to_mz(&self, index: f64) -> f64 {
        self.mz_intercept + self.mz_slope * index
    }

    /// Sub-scan number to 1/K0.
    pub fn scan_to_mobility(&self, scan: f64) -> f64 {
        self.mobility_intercept + self.mobility_slope * scan
    }
}

/// Mason-Schamp collision cross section.
///
/// The sign of `charge` is ignored.
pub fn one_over_k0_to_ccs(one_over_k0: f64, charge: i32, mz: f64, gas_mass: f64, gas_temperature: f64) -> f64 {
    let z = f64::from(charge.unsigned_abs());
    let ion_mass = mz * z;
    let reduced_mass = ion_mass * gas_mass / (ion_mass + gas_mass);
    let temperature = gas_temperature + CELSIUS_TO_KELVIN;
    MASON_SCHAMP_CONSTANT * z / (reduced_mass * temperature).sqrt() * one_over_k0
}
