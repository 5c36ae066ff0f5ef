//! QC run configuration.
//!
//! Loaded from a TOML file (see `irradiance_qc.toml` at the repository root).
//! Every section is optional; an empty file yields the Long & Dutton BSRN
//! recommended thresholds, console logging at INFO, and no extra stations.

use serde::Deserialize;
use std::path::Path;

use crate::logging::LogLevel;
use crate::model::{QcError, SOLAR_CONSTANT_NREL_2000_WM2, SOLAR_CONSTANT_WM2};

/// Environment variable naming the config file. Read after `.env` is loaded.
pub const CONFIG_ENV_VAR: &str = "IRRADIANCE_QC_CONFIG";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QcConfig {
    #[serde(default)]
    pub thresholds: QcThresholds,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

impl QcConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QcError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QcError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, QcError> {
        let config: QcConfig =
            toml::from_str(content).map_err(|e| QcError::ConfigError(e.to_string()))?;
        config.thresholds.validate()?;
        config.logging.min_level()?;
        Ok(config)
    }

    /// Loads `.env` (if any), then the file named by `IRRADIANCE_QC_CONFIG`.
    /// Falls back to defaults when the variable is unset.
    pub fn from_env() -> Result<Self, QcError> {
        dotenv::dotenv().ok();
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Every numeric constant used by the physical and ratio tests.
///
/// Defaults are the BSRN recommended values (Long & Dutton, V2.0) with the
/// Gueymard 2018 solar constant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    /// Solar constant at 1 AU, W/m².
    pub solar_constant_wm2: f64,
    /// Shared lower bound of all three physical envelopes, W/m².
    pub physical_lower_bound_wm2: f64,
    /// GHI envelope multiplier on `S_a`.
    pub ghi_envelope_factor: f64,
    /// DHI envelope multiplier on `S_a`.
    pub dhi_envelope_factor: f64,
    /// Exponent applied to `mu0` in the GHI/DHI envelopes.
    pub envelope_mu0_exponent: f64,
    /// Additive offset of the GHI/DHI envelopes, W/m².
    pub envelope_offset_wm2: f64,
    /// GHI ratio is only evaluated when `sum_sw` exceeds this, W/m².
    pub ghi_ratio_min_sum_sw_wm2: f64,
    /// DHI ratio is only evaluated when passed GHI exceeds this, W/m².
    pub dhi_ratio_min_ghi_wm2: f64,
    /// Upper zenith of band A, inclusive, degrees.
    pub band_a_max_zenith_deg: f64,
    /// Upper zenith of band B, exclusive, degrees.
    pub band_b_max_zenith_deg: f64,
    pub ghi_ratio_limit_band_a: f64,
    pub ghi_ratio_limit_band_b: f64,
    pub dhi_ratio_limit_band_a: f64,
    pub dhi_ratio_limit_band_b: f64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            solar_constant_wm2: SOLAR_CONSTANT_WM2,
            physical_lower_bound_wm2: -4.0,
            ghi_envelope_factor: 1.5,
            dhi_envelope_factor: 0.95,
            envelope_mu0_exponent: 1.2,
            envelope_offset_wm2: 100.0,
            ghi_ratio_min_sum_sw_wm2: 50.0,
            dhi_ratio_min_ghi_wm2: 50.0,
            band_a_max_zenith_deg: 75.0,
            band_b_max_zenith_deg: 93.0,
            ghi_ratio_limit_band_a: 1.8,
            ghi_ratio_limit_band_b: 1.15,
            dhi_ratio_limit_band_a: 1.05,
            dhi_ratio_limit_band_b: 1.10,
        }
    }
}

impl QcThresholds {
    /// Defaults with the NREL 2000 solar constant, for reruns comparable
    /// with older QC output.
    pub fn nrel_2000() -> Self {
        Self {
            solar_constant_wm2: SOLAR_CONSTANT_NREL_2000_WM2,
            ..Self::default()
        }
    }

    /// Rejects threshold sets that would make the tests meaningless.
    pub fn validate(&self) -> Result<(), QcError> {
        let named = [
            ("solar_constant_wm2", self.solar_constant_wm2),
            ("physical_lower_bound_wm2", self.physical_lower_bound_wm2),
            ("ghi_envelope_factor", self.ghi_envelope_factor),
            ("dhi_envelope_factor", self.dhi_envelope_factor),
            ("envelope_mu0_exponent", self.envelope_mu0_exponent),
            ("envelope_offset_wm2", self.envelope_offset_wm2),
            ("ghi_ratio_min_sum_sw_wm2", self.ghi_ratio_min_sum_sw_wm2),
            ("dhi_ratio_min_ghi_wm2", self.dhi_ratio_min_ghi_wm2),
            ("band_a_max_zenith_deg", self.band_a_max_zenith_deg),
            ("band_b_max_zenith_deg", self.band_b_max_zenith_deg),
            ("ghi_ratio_limit_band_a", self.ghi_ratio_limit_band_a),
            ("ghi_ratio_limit_band_b", self.ghi_ratio_limit_band_b),
            ("dhi_ratio_limit_band_a", self.dhi_ratio_limit_band_a),
            ("dhi_ratio_limit_band_b", self.dhi_ratio_limit_band_b),
        ];
        if let Some((name, _)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(QcError::ConfigError(format!("threshold {} is not finite", name)));
        }
        if self.solar_constant_wm2 <= 0.0 {
            return Err(QcError::ConfigError(
                "solar_constant_wm2 must be positive".to_string(),
            ));
        }
        if self.envelope_mu0_exponent <= 0.0 {
            return Err(QcError::ConfigError(
                "envelope_mu0_exponent must be positive".to_string(),
            ));
        }
        if !(0.0..180.0).contains(&self.band_a_max_zenith_deg)
            || self.band_a_max_zenith_deg >= self.band_b_max_zenith_deg
        {
            return Err(QcError::ConfigError(format!(
                "zenith bands must satisfy 0 <= band A ({}) < band B ({})",
                self.band_a_max_zenith_deg, self.band_b_max_zenith_deg
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of "debug", "info", "warn", "error".
    pub level: String,
    /// Optional append-only log file.
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, QcError> {
        self.level
            .parse()
            .map_err(|e: String| QcError::ConfigError(e))
    }
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// A station defined (or overridden) in the config file.
///
/// Omitted surface defaults fall back to the registry's standard values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationConfig {
    pub id: String,
    pub name: String,
    pub network: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub timezone: String,
    pub default_pressure_pa: Option<f64>,
    pub default_temperature_c: Option<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
