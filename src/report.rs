//! QC Run Report
//!
//! Serializable summary of a QC run for the reporting and plotting side:
//! the monthly count buckets plus whole-series totals and pass rates.

use chrono::Utc;
use serde::Serialize;

use crate::analysis::monthly::{self, BandCounts, MonthlyCounts, PhysicalCounts};
use crate::logging::{self, Stage};
use crate::model::{Channel, FlaggedRecord};
use crate::qc::QcRun;

// ============================================================================
// Report types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub station_id: Option<String>,
    pub generated_at: String,
    pub record_count: usize,
    pub months: Vec<MonthlyCounts>,
    pub summary: QcSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcSummary {
    pub ghi_physical: PhysicalSummary,
    pub dhi_physical: PhysicalSummary,
    pub dni_physical: PhysicalSummary,
    pub ghi_ratio: RatioSummary,
    pub dhi_ratio: RatioSummary,
    /// Records with a final accepted value, per channel.
    pub final_ghi_count: usize,
    pub final_dhi_count: usize,
    pub final_dni_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalSummary {
    pub pass: usize,
    pub fail: usize,
    pub missing: usize,
    pub pass_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioSummary {
    pub evaluated: usize,
    pub band_a_flagged: usize,
    pub band_b_flagged: usize,
    pub flagged_rate_pct: f64,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl From<PhysicalCounts> for PhysicalSummary {
    fn from(c: PhysicalCounts) -> Self {
        PhysicalSummary {
            pass: c.pass,
            fail: c.fail,
            missing: c.missing,
            pass_rate_pct: percent(c.pass, c.total()),
        }
    }
}

impl From<BandCounts> for RatioSummary {
    fn from(c: BandCounts) -> Self {
        RatioSummary {
            evaluated: c.evaluated,
            band_a_flagged: c.band_a,
            band_b_flagged: c.band_b,
            flagged_rate_pct: percent(c.flagged(), c.evaluated),
        }
    }
}

// ============================================================================
// Building
// ============================================================================

fn count_final<F>(run: &QcRun, value: F) -> usize
where
    F: Fn(&FlaggedRecord) -> Option<f64>,
{
    run.records.iter().filter(|r| value(r).is_some()).count()
}

impl QcReport {
    pub fn from_run(run: &QcRun) -> Self {
        let total = monthly::totals(&run.monthly);

        QcReport {
            station_id: run.station_id.clone(),
            generated_at: Utc::now().to_rfc3339(),
            record_count: run.records.len(),
            months: run.monthly.clone(),
            summary: QcSummary {
                ghi_physical: total.ghi_physical.into(),
                dhi_physical: total.dhi_physical.into(),
                dni_physical: total.dni_physical.into(),
                ghi_ratio: total.ghi_ratio.into(),
                dhi_ratio: total.dhi_ratio.into(),
                final_ghi_count: count_final(run, |r| r.ratio.final_ghi),
                final_dhi_count: count_final(run, |r| r.ratio.final_dhi),
                final_dni_count: count_final(run, |r| r.ratio.final_dni),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Serializes every flagged record, for the plotting side.
pub fn records_to_json(run: &QcRun) -> Result<String, serde_json::Error> {
    serde_json::to_string(&run.records)
}

// ============================================================================
// Logging
// ============================================================================

fn join(values: &[usize]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logs one line per metric with its per-month series, then the pass rates.
pub fn log_report(report: &QcReport) {
    let station = report.station_id.as_deref();
    let months = &report.months;

    let labels: Vec<String> = months.iter().map(|m| m.month.to_string()).collect();
    logging::info(Stage::Aggregate, station, &format!("months: [{}]", labels.join(" ")));

    for channel in Channel::ALL {
        let code = channel.column_code();
        let pass = monthly::series(months, |m| m.physical(channel).pass);
        let fail = monthly::series(months, |m| m.physical(channel).fail);
        for (name, values) in [(format!("F_{}1", code), pass), (format!("F_{}1_fail", code), fail)] {
            logging::info(Stage::Aggregate, station, &format!("{:<10} [{}]", name, join(&values)));
        }
    }

    let metrics: [(&str, fn(&MonthlyCounts) -> usize); 4] = [
        ("G_flag1", |m: &MonthlyCounts| m.ghi_ratio.band_a),
        ("G_flag2", |m: &MonthlyCounts| m.ghi_ratio.band_b),
        ("D_flag1", |m: &MonthlyCounts| m.dhi_ratio.band_a),
        ("D_flag2", |m: &MonthlyCounts| m.dhi_ratio.band_b),
    ];
    for (name, metric) in metrics {
        let values = monthly::series(months, metric);
        logging::info(Stage::Aggregate, station, &format!("{:<10} [{}]", name, join(&values)));
    }

    let s = &report.summary;
    logging::info(
        Stage::Aggregate,
        station,
        &format!(
            "pass rates: GHI {:.1}%  DHI {:.1}%  DNI {:.1}%  ({} records)",
            s.ghi_physical.pass_rate_pct,
            s.dhi_physical.pass_rate_pct,
            s.dni_physical.pass_rate_pct,
            report.record_count
        ),
    );
}

// ============================================================================
// Tests
// ============================================================================
