//! Consistency ratio tests (Tests 4–5) and final accepted values.
//!
//! Both tests read the pass channels of the physical stage (`F_G1`, `F_D1`),
//! never the raw measurements, so a value rejected by its envelope cannot
//! be re-admitted here. A ratio flag removes a value from the final output
//! even though it passed its physical test.
//!
//! Zenith bands (defaults):
//!   band A  zenith <= 75°         GHI |ratio| >= 1.8   DHI ratio >= 1.05
//!   band B  75° < zenith < 93°    GHI |ratio| >= 1.15  DHI ratio >= 1.10
//!   zenith >= 93°                 not ratio-tested
//!
//! The GHI test is two-sided and the DHI test one-sided; that asymmetry is
//! part of the BSRN recommendation as published and is kept.

use crate::config::QcThresholds;
use crate::model::{
    DerivedGeometry, PhysicalFlags, QcInputRecord, RatioCheck, RatioFlags, ZenithBand,
};

/// Places a zenith angle in its ratio-test band, if any.
pub fn classify_band(zenith_deg: f64, t: &QcThresholds) -> Option<ZenithBand> {
    if zenith_deg <= t.band_a_max_zenith_deg {
        Some(ZenithBand::HighSun)
    } else if zenith_deg < t.band_b_max_zenith_deg {
        Some(ZenithBand::LowSun)
    } else {
        None
    }
}

/// Test 4: passed GHI against the `dhi + dni·mu0` decomposition.
///
/// Skipped when `sum_sw` is missing or not above its floor, or when GHI
/// failed the physical test.
pub fn check_ghi_ratio(
    zenith_deg: f64,
    passed_ghi: Option<f64>,
    sum_sw: Option<f64>,
    t: &QcThresholds,
) -> RatioCheck {
    let (ghi, sum_sw) = match (passed_ghi, sum_sw) {
        (Some(ghi), Some(sum_sw)) if sum_sw > t.ghi_ratio_min_sum_sw_wm2 => (ghi, sum_sw),
        _ => return RatioCheck::skipped(),
    };

    let ratio = ghi / sum_sw;
    let flagged = classify_band(zenith_deg, t).filter(|band| {
        let limit = match band {
            ZenithBand::HighSun => t.ghi_ratio_limit_band_a,
            ZenithBand::LowSun => t.ghi_ratio_limit_band_b,
        };
        ratio.abs() >= limit
    });

    RatioCheck { ratio: Some(ratio), flagged }
}

/// Test 5: passed DHI as a fraction of passed GHI.
///
/// Skipped when GHI failed or is not above its floor, or when DHI failed.
pub fn check_dhi_ratio(
    zenith_deg: f64,
    passed_ghi: Option<f64>,
    passed_dhi: Option<f64>,
    t: &QcThresholds,
) -> RatioCheck {
    let (ghi, dhi) = match (passed_ghi, passed_dhi) {
        (Some(ghi), Some(dhi)) if ghi > t.dhi_ratio_min_ghi_wm2 => (ghi, dhi),
        _ => return RatioCheck::skipped(),
    };

    let ratio = dhi / ghi;
    let flagged = classify_band(zenith_deg, t).filter(|band| {
        let limit = match band {
            ZenithBand::HighSun => t.dhi_ratio_limit_band_a,
            ZenithBand::LowSun => t.dhi_ratio_limit_band_b,
        };
        ratio >= limit
    });

    RatioCheck { ratio: Some(ratio), flagged }
}

/// Runs Tests 4–5 on one record and derives its final accepted values.
pub fn check_record(
    record: &QcInputRecord,
    derived: &DerivedGeometry,
    physical: &PhysicalFlags,
    t: &QcThresholds,
) -> RatioFlags {
    let passed_ghi = physical.ghi.pass_value();
    let passed_dhi = physical.dhi.pass_value();

    let ghi_ratio = check_ghi_ratio(record.zenith_deg, passed_ghi, derived.sum_sw, t);
    let dhi_ratio = check_dhi_ratio(record.zenith_deg, passed_ghi, passed_dhi, t);

    RatioFlags {
        ghi_ratio,
        dhi_ratio,
        final_ghi: passed_ghi.filter(|_| !ghi_ratio.is_flagged()),
        final_dhi: passed_dhi.filter(|_| !dhi_ratio.is_flagged()),
        final_dni: physical.dni.pass_value(),
    }
}

/// Runs Tests 4–5 over a series. All three slices must be index-aligned.
pub fn run(
    records: &[QcInputRecord],
    derived: &[DerivedGeometry],
    physical: &[PhysicalFlags],
    t: &QcThresholds,
) -> Vec<RatioFlags> {
    records
        .iter()
        .zip(derived)
        .zip(physical)
        .map(|((record, derived), physical)| check_record(record, derived, physical, t))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
