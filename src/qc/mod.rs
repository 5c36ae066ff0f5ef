//! The QC flagging pipeline.
//!
//! Stages run in a fixed order, each consuming an immutable view of the
//! previous stage's output and returning a new, separately owned column:
//!
//!   validate → derive geometry → physical (Tests 1–3)
//!            → ratio (Tests 4–5, reads physical pass channels)
//!            → monthly aggregation (reads everything, writes nothing back)
//!
//! Per-record problems never abort a run; they become fail or skip flags.
//! Only broken input contracts (unordered timestamps, impossible geometry)
//! are returned as errors, since they would silently corrupt the monthly
//! counts.

pub mod physical;
pub mod ratio;

use serde::Serialize;

use crate::analysis::monthly::{self, MonthlyCounts};
use crate::config::QcThresholds;
use crate::geometry::{self, SolarGeometryProvider};
use crate::logging::{self, Stage};
use crate::model::{
    Channel, DerivedGeometry, FlaggedRecord, Observation, QcError, QcInputRecord,
};
use crate::stations::Station;

/// Output of one QC run over a whole series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcRun {
    pub station_id: Option<String>,
    pub records: Vec<FlaggedRecord>,
    pub monthly: Vec<MonthlyCounts>,
}

/// Checks the input contract: strictly ascending timestamps and usable
/// geometry on every record.
pub fn validate_series(records: &[QcInputRecord]) -> Result<(), QcError> {
    for (index, pair) in records.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(QcError::NonMonotonicTimestamp {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    records.iter().try_for_each(geometry::validate_geometry)
}

/// Runs the full pipeline over records that already carry geometry.
pub fn run_qc(
    records: &[QcInputRecord],
    thresholds: &QcThresholds,
    station_id: Option<&str>,
) -> Result<QcRun, QcError> {
    if let Err(e) = validate_series(records) {
        logging::log_run_failure(station_id, "input validation", &e);
        return Err(e);
    }

    logging::info(
        Stage::System,
        station_id,
        &format!("running QC over {} records", records.len()),
    );

    let derived: Vec<DerivedGeometry> = records
        .iter()
        .map(|r| geometry::derive_record(r, thresholds))
        .collect();

    let physical = physical::run(records, &derived, thresholds);
    let ratio = ratio::run(records, &derived, &physical, thresholds);

    let flagged: Vec<FlaggedRecord> = records
        .iter()
        .zip(&derived)
        .zip(&physical)
        .zip(&ratio)
        .map(|(((input, derived), physical), ratio)| FlaggedRecord {
            input: *input,
            derived: *derived,
            physical: *physical,
            ratio: *ratio,
        })
        .collect();

    let months = monthly::aggregate(&flagged);
    log_run_summary(station_id, &months);

    Ok(QcRun {
        station_id: station_id.map(String::from),
        records: flagged,
        monthly: months,
    })
}

/// Attaches geometry from `provider` to raw observations, then runs the
/// pipeline.
pub fn run_station(
    observations: &[Observation],
    station: &Station,
    provider: &dyn SolarGeometryProvider,
    thresholds: &QcThresholds,
) -> Result<QcRun, QcError> {
    let records = match geometry::build_records(observations, station, provider) {
        Ok(records) => records,
        Err(e) => {
            logging::log_run_failure(Some(&station.id), "geometry", &e);
            return Err(e);
        }
    };
    run_qc(&records, thresholds, Some(&station.id))
}

fn log_run_summary(station_id: Option<&str>, months: &[MonthlyCounts]) {
    let total = monthly::totals(months);
    for (i, channel) in Channel::ALL.into_iter().enumerate() {
        let counts = total.physical(channel);
        let test = format!("Test {} ({} physical)", i + 1, channel);
        logging::log_stage_summary(Stage::Physical, station_id, &test, counts.pass, counts.fail);
    }
    for (test, counts) in [
        ("Test 4 (GHI ratio)", total.ghi_ratio),
        ("Test 5 (DHI ratio)", total.dhi_ratio),
    ] {
        logging::log_stage_summary(
            Stage::Ratio,
            station_id,
            test,
            counts.evaluated - counts.flagged(),
            counts.flagged(),
        );
    }
    logging::debug(
        Stage::Aggregate,
        station_id,
        &format!("{} monthly buckets", months.len()),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
