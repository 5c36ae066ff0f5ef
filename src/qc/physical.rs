//! Physical limit tests (Tests 1–3).
//!
//! Each channel is checked against an absolute envelope that depends only on
//! the record's own geometry:
//!
//!   GHI:  lower < GHI < S_a · 1.5  · mu0^1.2 + 100
//!   DHI:  lower < DHI < S_a · 0.95 · mu0^1.2 + 100
//!   DNI:  lower < DNI < S_a
//!
//! with `lower = -4 W/m²`. Both bounds are strict. A missing or non-finite
//! measurement cannot satisfy them and fails without a carried value.

use crate::config::QcThresholds;
use crate::model::{measured, DerivedGeometry, PhysicalFlags, PhysicalOutcome, QcInputRecord};

/// Upper GHI envelope for a record, W/m².
pub fn ghi_upper_bound(derived: &DerivedGeometry, t: &QcThresholds) -> f64 {
    diffuse_style_bound(derived, t.ghi_envelope_factor, t)
}

/// Upper DHI envelope for a record, W/m².
pub fn dhi_upper_bound(derived: &DerivedGeometry, t: &QcThresholds) -> f64 {
    diffuse_style_bound(derived, t.dhi_envelope_factor, t)
}

/// Upper DNI envelope for a record, W/m². This is `S_a` itself.
pub fn dni_upper_bound(derived: &DerivedGeometry) -> f64 {
    derived.extraterrestrial_adjusted
}

fn diffuse_style_bound(derived: &DerivedGeometry, factor: f64, t: &QcThresholds) -> f64 {
    // mu0 is clamped to [0, 1] upstream, so powf never sees a negative base.
    derived.extraterrestrial_adjusted * factor * derived.mu0.powf(t.envelope_mu0_exponent)
        + t.envelope_offset_wm2
}

/// Routes a value to the pass or fail channel of one envelope test.
pub fn check_envelope(value: Option<f64>, lower: f64, upper: f64) -> PhysicalOutcome {
    match measured(value) {
        Some(v) if v > lower && v < upper => PhysicalOutcome::Pass(v),
        Some(v) => PhysicalOutcome::Fail(Some(v)),
        None => PhysicalOutcome::Fail(None),
    }
}

/// Runs Tests 1–3 on a single record.
pub fn check_record(
    record: &QcInputRecord,
    derived: &DerivedGeometry,
    thresholds: &QcThresholds,
) -> PhysicalFlags {
    let lower = thresholds.physical_lower_bound_wm2;
    PhysicalFlags {
        ghi: check_envelope(record.ghi, lower, ghi_upper_bound(derived, thresholds)),
        dhi: check_envelope(record.dhi, lower, dhi_upper_bound(derived, thresholds)),
        dni: check_envelope(record.dni, lower, dni_upper_bound(derived)),
    }
}

/// Runs Tests 1–3 over a series. `derived` must be index-aligned with
/// `records`.
pub fn run(
    records: &[QcInputRecord],
    derived: &[DerivedGeometry],
    thresholds: &QcThresholds,
) -> Vec<PhysicalFlags> {
    records
        .iter()
        .zip(derived)
        .map(|(record, derived)| check_record(record, derived, thresholds))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
