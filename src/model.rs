/// QcInputRecord, per-stage flag structs, FlaggedRecord, QcError
/// core data structures and error handling
///
/// Core data types for the irradiance QC pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no QC logic and no I/O. Each pipeline stage owns one of the
/// flag structs below: the physical stage writes `PhysicalFlags`, the ratio
/// stage reads them and writes `RatioFlags`, the aggregator only reads.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Solar constant at mean Earth-Sun distance, in W/m² (Gueymard 2018).
pub const SOLAR_CONSTANT_WM2: f64 = 1361.1;

/// Solar constant from the NREL 2000 ASTM E-490-00 reference spectrum, in W/m².
/// Kept for comparison runs against older QC output.
pub const SOLAR_CONSTANT_NREL_2000_WM2: f64 = 1366.1;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// A gap-filled minute observation before solar geometry is attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
}

/// One minute of radiometric data, annotated with solar geometry.
///
/// Irradiance values are in W/m² and may be missing. A `Some(NaN)` is
/// treated exactly like `None` by every test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QcInputRecord {
    pub timestamp: DateTime<Utc>,
    pub ghi: Option<f64>,
    pub dni: Option<f64>,
    pub dhi: Option<f64>,
    /// Solar zenith angle in degrees, [0, 180).
    pub zenith_deg: f64,
    /// Earth-Sun distance in astronomical units.
    pub earth_sun_factor: f64,
}

/// Returns the measurement if it is present and finite.
pub fn measured(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Derived geometry
// ---------------------------------------------------------------------------

/// Quantities derived once per record and shared by both test stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedGeometry {
    /// Cosine of the zenith angle, zero when the sun is below the horizon.
    pub mu0: f64,
    /// Solar constant adjusted for Earth-Sun distance (`S_a`), W/m².
    pub extraterrestrial_adjusted: f64,
    /// `dhi + dni * mu0`, absent when either component is missing.
    pub sum_sw: Option<f64>,
}

// ---------------------------------------------------------------------------
// Flag types
// ---------------------------------------------------------------------------

/// Irradiance channel under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Ghi,
    Dni,
    Dhi,
}

impl Channel {
    /// Channels in physical-test order (Tests 1, 2, 3).
    pub const ALL: [Channel; 3] = [Channel::Ghi, Channel::Dhi, Channel::Dni];

    /// Letter used in the flag column names (`F_G1`, `F_D1`, `F_I1`).
    pub fn column_code(&self) -> char {
        match self {
            Channel::Ghi => 'G',
            Channel::Dhi => 'D',
            Channel::Dni => 'I',
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Ghi => write!(f, "GHI"),
            Channel::Dni => write!(f, "DNI"),
            Channel::Dhi => write!(f, "DHI"),
        }
    }
}

/// Result of an absolute-envelope test on one channel.
///
/// A value lands in exactly one of the two channels. A missing measurement
/// cannot be certified, so it fails with no carried value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PhysicalOutcome {
    Pass(f64),
    Fail(Option<f64>),
}

impl PhysicalOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, PhysicalOutcome::Pass(_))
    }

    /// The pass-channel value (`F_G1`, `F_D1`, `F_I1`).
    pub fn pass_value(&self) -> Option<f64> {
        match self {
            PhysicalOutcome::Pass(v) => Some(*v),
            PhysicalOutcome::Fail(_) => None,
        }
    }

    /// The fail-channel value (`F_G1_fail`, ...). `None` for passes and for
    /// missing measurements.
    pub fn fail_value(&self) -> Option<f64> {
        match self {
            PhysicalOutcome::Pass(_) => None,
            PhysicalOutcome::Fail(v) => *v,
        }
    }

    /// True when the record failed because nothing was measured.
    pub fn is_missing(&self) -> bool {
        matches!(self, PhysicalOutcome::Fail(None))
    }
}

/// Output of the physical limit stage (Tests 1–3) for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicalFlags {
    pub ghi: PhysicalOutcome,
    pub dhi: PhysicalOutcome,
    pub dni: PhysicalOutcome,
}

impl PhysicalFlags {
    pub fn outcome(&self, channel: Channel) -> &PhysicalOutcome {
        match channel {
            Channel::Ghi => &self.ghi,
            Channel::Dni => &self.dni,
            Channel::Dhi => &self.dhi,
        }
    }
}

/// Zenith band used by the ratio tests.
///
/// `HighSun` is band A (zenith ≤ 75°), `LowSun` is band B (75° < zenith < 93°).
/// Anything at or beyond the band-B limit is not ratio-tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZenithBand {
    HighSun,
    LowSun,
}

/// One ratio test on one record.
///
/// `ratio` is `None` when the test was skipped (denominator at or below its
/// floor, or an input missing). `flagged` names the band whose limit was
/// exceeded; it is always `None` when `ratio` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RatioCheck {
    pub ratio: Option<f64>,
    pub flagged: Option<ZenithBand>,
}

impl RatioCheck {
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn is_evaluated(&self) -> bool {
        self.ratio.is_some()
    }

    /// Band A exceed flag (`G_flag1` / `D_flag1`).
    pub fn band_a_flag(&self) -> bool {
        self.flagged == Some(ZenithBand::HighSun)
    }

    /// Band B exceed flag (`G_flag2` / `D_flag2`).
    pub fn band_b_flag(&self) -> bool {
        self.flagged == Some(ZenithBand::LowSun)
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged.is_some()
    }
}

/// Output of the consistency stage (Tests 4–5) plus final accepted values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioFlags {
    pub ghi_ratio: RatioCheck,
    pub dhi_ratio: RatioCheck,
    /// `FG_final`
    pub final_ghi: Option<f64>,
    /// `FD_final`
    pub final_dhi: Option<f64>,
    /// `FI_final`
    pub final_dni: Option<f64>,
}

/// A record with everything the pipeline attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlaggedRecord {
    pub input: QcInputRecord,
    pub derived: DerivedGeometry,
    pub physical: PhysicalFlags,
    pub ratio: RatioFlags,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort a QC run or reject its inputs.
///
/// Per-record problems (missing values, undefined ratios) never surface
/// here; they become fail or skip flags on the record.
#[derive(Debug, PartialEq)]
pub enum QcError {
    /// Timestamps must be strictly ascending.
    NonMonotonicTimestamp {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    /// Zenith or Earth-Sun factor outside the range the thresholds accept.
    InvalidGeometry {
        timestamp: DateTime<Utc>,
        reason: String,
    },
    /// The geometry provider returned a different number of rows than asked.
    GeometryLengthMismatch { expected: usize, actual: usize },
    /// Normalized record text could not be parsed.
    ParseError(String),
    /// Configuration file unreadable or inconsistent.
    ConfigError(String),
}

impl std::fmt::Display for QcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QcError::NonMonotonicTimestamp { index, previous, current } => write!(
                f,
                "Non-monotonic timestamp at record {}: {} does not follow {}",
                index, current, previous
            ),
            QcError::InvalidGeometry { timestamp, reason } => {
                write!(f, "Invalid geometry at {}: {}", timestamp, reason)
            }
            QcError::GeometryLengthMismatch { expected, actual } => write!(
                f,
                "Geometry provider returned {} rows for {} timestamps",
                actual, expected
            ),
            QcError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            QcError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for QcError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
