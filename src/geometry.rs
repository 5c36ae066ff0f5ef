//! Solar geometry seam and per-record derived quantities.
//!
//! Zenith angle and Earth-Sun distance come from an external astronomical
//! routine (SPA or similar) behind `SolarGeometryProvider`. This module only
//! attaches them to observations and derives the quantities every QC test
//! shares: `mu0`, the distance-adjusted solar constant `S_a`, and `sum_sw`.

use chrono::{DateTime, Datelike, Utc};

use crate::config::QcThresholds;
use crate::logging::{self, Stage};
use crate::model::{measured, DerivedGeometry, Observation, QcError, QcInputRecord};
use crate::stations::Station;

// ---------------------------------------------------------------------------
// Provider seam
// ---------------------------------------------------------------------------

/// Solar position for one timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarGeometry {
    pub zenith_deg: f64,
    pub earth_sun_factor: f64,
}

/// Supplies solar geometry for a station and a timestamp series.
///
/// Implementations must return one row per timestamp, in the same order.
/// The station carries the location, altitude, and surface pressure and
/// temperature defaults a refraction-corrected routine needs.
pub trait SolarGeometryProvider {
    fn geometry(
        &self,
        station: &Station,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<SolarGeometry>, QcError>;
}

/// Geometry computed elsewhere and handed over as a column.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedGeometry {
    rows: Vec<SolarGeometry>,
}

impl PrecomputedGeometry {
    pub fn new(rows: Vec<SolarGeometry>) -> Self {
        Self { rows }
    }

    /// Pairs externally computed zenith angles with the Spencer Earth-Sun
    /// distance for each timestamp.
    pub fn with_spencer_distance(timestamps: &[DateTime<Utc>], zenith_deg: &[f64]) -> Self {
        let rows = timestamps
            .iter()
            .zip(zenith_deg)
            .map(|(ts, &zenith_deg)| SolarGeometry {
                zenith_deg,
                earth_sun_factor: earth_sun_distance_spencer(ts.ordinal()),
            })
            .collect();
        Self { rows }
    }
}

impl SolarGeometryProvider for PrecomputedGeometry {
    fn geometry(
        &self,
        _station: &Station,
        _timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<SolarGeometry>, QcError> {
        Ok(self.rows.clone())
    }
}

/// Earth-Sun distance in AU from Spencer's (1971) Fourier series for the
/// eccentricity correction factor `E0 = (1/AU)^2`.
///
/// Accurate to about 1e-4 AU; good enough for the envelope tests when no
/// ephemeris-based distance is available.
pub fn earth_sun_distance_spencer(day_of_year: u32) -> f64 {
    let x = 2.0 * std::f64::consts::PI / 365.0 * (day_of_year.saturating_sub(1)) as f64;
    let e0 = 1.00011 + 0.034221 * x.cos() + 0.00128 * x.sin() + 0.000719 * (2.0 * x).cos()
        + 0.000077 * (2.0 * x).sin();
    1.0 / e0.sqrt()
}

// ---------------------------------------------------------------------------
// Record construction
// ---------------------------------------------------------------------------

/// Attaches provider geometry to each observation.
///
/// Fails if the provider returns a different number of rows than there are
/// observations. Geometry values themselves are checked later, by the
/// pipeline's input validation.
pub fn build_records(
    observations: &[Observation],
    station: &Station,
    provider: &dyn SolarGeometryProvider,
) -> Result<Vec<QcInputRecord>, QcError> {
    let timestamps: Vec<DateTime<Utc>> = observations.iter().map(|o| o.timestamp).collect();
    let rows = provider.geometry(station, &timestamps)?;

    if rows.len() != observations.len() {
        return Err(QcError::GeometryLengthMismatch {
            expected: observations.len(),
            actual: rows.len(),
        });
    }

    logging::debug(
        Stage::Geometry,
        Some(&station.id),
        &format!("attached geometry to {} observations", rows.len()),
    );

    Ok(observations
        .iter()
        .zip(rows)
        .map(|(obs, geo)| QcInputRecord {
            timestamp: obs.timestamp,
            ghi: obs.ghi,
            dni: obs.dni,
            dhi: obs.dhi,
            zenith_deg: geo.zenith_deg,
            earth_sun_factor: geo.earth_sun_factor,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Validation and derived quantities
// ---------------------------------------------------------------------------

/// Rejects geometry the threshold formulas cannot use.
///
/// Zenith must be finite and in [0, 180); the Earth-Sun factor must be
/// finite and positive.
pub fn validate_geometry(record: &QcInputRecord) -> Result<(), QcError> {
    let z = record.zenith_deg;
    if !z.is_finite() || !(0.0..180.0).contains(&z) {
        return Err(QcError::InvalidGeometry {
            timestamp: record.timestamp,
            reason: format!("zenith {} outside [0, 180)", z),
        });
    }
    let au = record.earth_sun_factor;
    if !au.is_finite() || au <= 0.0 {
        return Err(QcError::InvalidGeometry {
            timestamp: record.timestamp,
            reason: format!("Earth-Sun factor {} is not a positive number", au),
        });
    }
    Ok(())
}

/// Cosine of the zenith angle, exactly zero from the horizon down.
pub fn mu0(zenith_deg: f64) -> f64 {
    if zenith_deg >= 90.0 {
        0.0
    } else {
        zenith_deg.to_radians().cos().clamp(0.0, 1.0)
    }
}

/// Solar constant adjusted for the actual Earth-Sun distance (`S_a`).
pub fn extraterrestrial_adjusted(solar_constant_wm2: f64, earth_sun_factor: f64) -> f64 {
    solar_constant_wm2 / (earth_sun_factor * earth_sun_factor)
}

/// Derives `mu0`, `S_a` and `sum_sw` for one validated record.
pub fn derive_record(record: &QcInputRecord, thresholds: &QcThresholds) -> DerivedGeometry {
    let mu0 = mu0(record.zenith_deg);
    let sum_sw = match (measured(record.dhi), measured(record.dni)) {
        (Some(dhi), Some(dni)) => Some(dhi + dni * mu0),
        _ => None,
    };
    DerivedGeometry {
        mu0,
        extraterrestrial_adjusted: extraterrestrial_adjusted(
            thresholds.solar_constant_wm2,
            record.earth_sun_factor,
        ),
        sum_sw,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
