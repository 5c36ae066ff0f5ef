//! End-to-end QC pipeline tests
//!
//! Drives the public API the way a batch run does: normalized CSV in,
//! flagged records and monthly counts out. The fixture in
//! `tests/fixtures/daa_sample.csv` holds two night minutes at the end of
//! January and six daytime minutes on 1 February, each built to exercise a
//! specific test outcome:
//!
//!   row 1  night, all channels plausible
//!   row 2  night, GHI missing
//!   row 3  clear noon, everything consistent
//!   row 4  DNI above S_a
//!   row 5  DHI above 1.05 × GHI (band A)
//!   row 6  GHI above its envelope
//!   row 7  80° zenith, GHI far above dhi + dni·mu0 (band B)
//!   row 8  95° zenith, exempt from ratio tests

use chrono::{Duration, TimeZone, Utc};

use irradiance_qc::analysis::monthly::{self, MonthKey};
use irradiance_qc::config::{QcConfig, QcThresholds};
use irradiance_qc::geometry::PrecomputedGeometry;
use irradiance_qc::ingest::records::read_records_csv;
use irradiance_qc::model::{
    Observation, PhysicalOutcome, QcError, SOLAR_CONSTANT_NREL_2000_WM2, ZenithBand,
};
use irradiance_qc::qc::{run_qc, run_station, QcRun};
use irradiance_qc::report::QcReport;
use irradiance_qc::stations::find_station;

const FIXTURE: &str = "tests/fixtures/daa_sample.csv";

fn fixture_run() -> QcRun {
    let records = read_records_csv(FIXTURE).expect("fixture should parse");
    run_qc(&records, &QcThresholds::default(), Some("DAA")).expect("fixture is a valid series")
}

// ---------------------------------------------------------------------------
// Per-record outcomes
// ---------------------------------------------------------------------------

#[test]
fn test_fixture_has_eight_records() {
    assert_eq!(fixture_run().records.len(), 8);
}

#[test]
fn test_night_records_pass_physical_tests_and_skip_ratios() {
    let run = fixture_run();
    let night = &run.records[0];
    assert_eq!(night.derived.mu0, 0.0);
    assert_eq!(night.physical.ghi, PhysicalOutcome::Pass(-1.2));
    assert!(!night.ratio.ghi_ratio.is_evaluated(), "sum_sw is negative at night");
    assert!(!night.ratio.dhi_ratio.is_evaluated());
    assert_eq!(night.ratio.final_ghi, Some(-1.2));

    let gap = &run.records[1];
    assert!(gap.physical.ghi.is_missing());
    assert_eq!(gap.ratio.final_ghi, None);
    assert_eq!(gap.ratio.final_dhi, Some(-1.1));
}

#[test]
fn test_consistent_noon_record_keeps_every_final_value() {
    let rec = &fixture_run().records[2];
    let ratio = rec.ratio.ghi_ratio.ratio.expect("sum_sw is well above 50");
    assert!((ratio - 1.0).abs() < 0.01, "G ratio = {}", ratio);
    assert_eq!(rec.ratio.final_ghi, Some(1050.0));
    assert_eq!(rec.ratio.final_dhi, Some(140.0));
    assert_eq!(rec.ratio.final_dni, Some(980.0));
}

#[test]
fn test_dni_above_adjusted_constant_has_no_final_dni() {
    let rec = &fixture_run().records[3];
    assert_eq!(rec.physical.dni, PhysicalOutcome::Fail(Some(1450.0)));
    assert_eq!(rec.ratio.final_dni, None);
    assert_eq!(rec.ratio.final_ghi, Some(1045.0));
}

#[test]
fn test_excess_diffuse_is_removed_by_ratio_test() {
    let rec = &fixture_run().records[4];
    assert!(rec.physical.dhi.is_pass());
    assert_eq!(rec.ratio.dhi_ratio.flagged, Some(ZenithBand::HighSun));
    assert_eq!(rec.ratio.final_dhi, None);
}

#[test]
fn test_ghi_envelope_failure_blocks_both_ratio_tests() {
    let rec = &fixture_run().records[5];
    assert_eq!(rec.physical.ghi, PhysicalOutcome::Fail(Some(2100.0)));
    assert!(!rec.ratio.ghi_ratio.is_evaluated());
    assert!(!rec.ratio.dhi_ratio.is_evaluated());
    assert_eq!(rec.ratio.final_ghi, None);
    assert_eq!(rec.ratio.final_dhi, Some(142.0));
}

#[test]
fn test_low_sun_inconsistency_is_flagged_in_band_b() {
    let rec = &fixture_run().records[6];
    assert!(rec.physical.ghi.is_pass());
    assert!(rec.ratio.ghi_ratio.band_b_flag());
    assert_eq!(rec.ratio.final_ghi, None);
    assert_eq!(rec.ratio.final_dhi, Some(60.0));
}

#[test]
fn test_beyond_93_degrees_final_follows_physical_test() {
    let rec = &fixture_run().records[7];
    assert!(rec.ratio.ghi_ratio.is_evaluated());
    assert!(!rec.ratio.ghi_ratio.is_flagged());
    assert_eq!(rec.ratio.final_ghi, Some(40.0));
}

// ---------------------------------------------------------------------------
// Monthly aggregation
// ---------------------------------------------------------------------------

#[test]
fn test_monthly_counts_for_fixture() {
    let run = fixture_run();
    assert_eq!(run.monthly.len(), 2);

    let jan = &run.monthly[0];
    assert_eq!(jan.month, MonthKey { year: 2019, month: 1 });
    assert_eq!(jan.records, 2);
    assert_eq!((jan.ghi_physical.pass, jan.ghi_physical.fail), (1, 1));
    assert_eq!(jan.ghi_physical.missing, 1);
    assert_eq!(jan.ghi_ratio.evaluated, 0);

    let feb = &run.monthly[1];
    assert_eq!(feb.month, MonthKey { year: 2019, month: 2 });
    assert_eq!(feb.records, 6);
    assert_eq!((feb.ghi_physical.pass, feb.ghi_physical.fail), (5, 1));
    assert_eq!((feb.dni_physical.pass, feb.dni_physical.fail), (5, 1));
    assert_eq!((feb.dhi_physical.pass, feb.dhi_physical.fail), (6, 0));
    assert_eq!(feb.ghi_ratio.evaluated, 5);
    assert_eq!((feb.ghi_ratio.band_a, feb.ghi_ratio.band_b), (0, 1));
    assert_eq!(feb.dhi_ratio.evaluated, 4);
    assert_eq!((feb.dhi_ratio.band_a, feb.dhi_ratio.band_b), (1, 0));
}

#[test]
fn test_physical_counts_partition_every_record() {
    let run = fixture_run();
    let total = monthly::totals(&run.monthly);
    for counts in [total.ghi_physical, total.dhi_physical, total.dni_physical] {
        assert_eq!(counts.total(), run.records.len());
    }
}

#[test]
fn test_report_summary_for_fixture() {
    let report = QcReport::from_run(&fixture_run());
    assert_eq!(report.station_id.as_deref(), Some("DAA"));
    assert_eq!(report.summary.final_ghi_count, 5);
    assert_eq!(report.summary.final_dhi_count, 7);
    assert_eq!(report.summary.final_dni_count, 7);
    assert_eq!(report.summary.ghi_ratio.band_b_flagged, 1);
}

// ---------------------------------------------------------------------------
// Station runs and configuration
// ---------------------------------------------------------------------------

#[test]
fn test_run_station_with_precomputed_geometry() {
    let station = find_station("DAA").expect("DAA is a built-in station");
    let start = Utc.with_ymd_and_hms(2019, 2, 1, 10, 0, 0).unwrap();
    let observations: Vec<Observation> = (0..3)
        .map(|i| Observation {
            timestamp: start + Duration::minutes(i),
            ghi: Some(1050.0),
            dni: Some(980.0),
            dhi: Some(140.0),
        })
        .collect();
    let timestamps: Vec<_> = observations.iter().map(|o| o.timestamp).collect();
    let provider = PrecomputedGeometry::with_spencer_distance(&timestamps, &[22.0, 22.1, 22.2]);

    let run = run_station(&observations, &station, &provider, &QcThresholds::default())
        .expect("geometry matches observations");
    assert_eq!(run.station_id.as_deref(), Some("DAA"));
    assert!(run.records.iter().all(|r| r.ratio.final_ghi == Some(1050.0)));
    assert!(run.records.iter().all(|r| r.derived.extraterrestrial_adjusted > 1361.1));
}

#[test]
fn test_run_station_rejects_mismatched_geometry() {
    let station = find_station("SUN").expect("SUN is a built-in station");
    let ts = Utc.with_ymd_and_hms(2019, 2, 1, 10, 0, 0).unwrap();
    let observations = vec![Observation { timestamp: ts, ghi: Some(800.0), dni: None, dhi: None }];
    let provider = PrecomputedGeometry::default();
    let result = run_station(&observations, &station, &provider, &QcThresholds::default());
    assert_eq!(
        result.map(|r| r.records.len()),
        Err(QcError::GeometryLengthMismatch { expected: 1, actual: 0 })
    );
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = QcConfig::load("./irradiance_qc.toml").expect("shipped config should load");
    assert_eq!(config.thresholds, QcThresholds::default());
}

#[test]
fn test_nrel_solar_constant_tightens_nothing_at_night() {
    // Swapping the solar constant moves daytime envelopes only; with mu0 = 0
    // the GHI and DHI bounds collapse to the fixed offset.
    let records = read_records_csv(FIXTURE).expect("fixture should parse");
    let thresholds = QcThresholds::nrel_2000();
    assert_eq!(thresholds.solar_constant_wm2, SOLAR_CONSTANT_NREL_2000_WM2);
    let run = run_qc(&records, &thresholds, None).expect("valid series");
    let baseline = fixture_run();
    assert_eq!(run.records[0].physical, baseline.records[0].physical);
    assert_eq!(run.monthly[0], baseline.monthly[0]);
}
