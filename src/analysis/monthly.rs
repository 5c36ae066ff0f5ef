//! Calendar-month pass/fail counts.
//!
//! Records are keyed by the year and month of their own timestamp (UTC)
//! and counted in a single pass. Only months that contain records get a
//! bucket; buckets come out in chronological order.

use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Channel, FlaggedRecord, PhysicalOutcome, RatioCheck};

// ---------------------------------------------------------------------------
// Count types
// ---------------------------------------------------------------------------

/// Calendar month key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(record: &FlaggedRecord) -> Self {
        let ts = record.input.timestamp;
        MonthKey { year: ts.year(), month: ts.month() }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Pass/fail counts for one physical test.
///
/// `missing` is the subset of `fail` that failed for lack of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PhysicalCounts {
    pub pass: usize,
    pub fail: usize,
    pub missing: usize,
}

impl PhysicalCounts {
    fn record(&mut self, outcome: &PhysicalOutcome) {
        match outcome {
            PhysicalOutcome::Pass(_) => self.pass += 1,
            PhysicalOutcome::Fail(value) => {
                self.fail += 1;
                if value.is_none() {
                    self.missing += 1;
                }
            }
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail
    }

    pub fn merge(&mut self, other: &PhysicalCounts) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.missing += other.missing;
    }
}

/// Band-flag counts for one ratio test.
///
/// `evaluated` counts records whose ratio was defined; skipped records
/// appear in no field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BandCounts {
    pub evaluated: usize,
    pub band_a: usize,
    pub band_b: usize,
}

impl BandCounts {
    fn record(&mut self, check: &RatioCheck) {
        if !check.is_evaluated() {
            return;
        }
        self.evaluated += 1;
        if check.band_a_flag() {
            self.band_a += 1;
        }
        if check.band_b_flag() {
            self.band_b += 1;
        }
    }

    pub fn flagged(&self) -> usize {
        self.band_a + self.band_b
    }

    pub fn merge(&mut self, other: &BandCounts) {
        self.evaluated += other.evaluated;
        self.band_a += other.band_a;
        self.band_b += other.band_b;
    }
}

/// Every count for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCounts {
    pub month: MonthKey,
    pub records: usize,
    pub ghi_physical: PhysicalCounts,
    pub dhi_physical: PhysicalCounts,
    pub dni_physical: PhysicalCounts,
    pub ghi_ratio: BandCounts,
    pub dhi_ratio: BandCounts,
}

impl MonthlyCounts {
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            records: 0,
            ghi_physical: PhysicalCounts::default(),
            dhi_physical: PhysicalCounts::default(),
            dni_physical: PhysicalCounts::default(),
            ghi_ratio: BandCounts::default(),
            dhi_ratio: BandCounts::default(),
        }
    }

    /// Physical-test counts for one channel.
    pub fn physical(&self, channel: Channel) -> &PhysicalCounts {
        match channel {
            Channel::Ghi => &self.ghi_physical,
            Channel::Dhi => &self.dhi_physical,
            Channel::Dni => &self.dni_physical,
        }
    }

    fn physical_mut(&mut self, channel: Channel) -> &mut PhysicalCounts {
        match channel {
            Channel::Ghi => &mut self.ghi_physical,
            Channel::Dhi => &mut self.dhi_physical,
            Channel::Dni => &mut self.dni_physical,
        }
    }

    fn add(&mut self, record: &FlaggedRecord) {
        self.records += 1;
        for channel in Channel::ALL {
            self.physical_mut(channel).record(record.physical.outcome(channel));
        }
        self.ghi_ratio.record(&record.ratio.ghi_ratio);
        self.dhi_ratio.record(&record.ratio.dhi_ratio);
    }
}

/// Counts summed over every month of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeriesTotals {
    /// Number of monthly buckets summed.
    pub months: usize,
    pub records: usize,
    pub ghi_physical: PhysicalCounts,
    pub dhi_physical: PhysicalCounts,
    pub dni_physical: PhysicalCounts,
    pub ghi_ratio: BandCounts,
    pub dhi_ratio: BandCounts,
}

impl SeriesTotals {
    pub fn add_month(&mut self, month: &MonthlyCounts) {
        self.months += 1;
        self.records += month.records;
        self.ghi_physical.merge(&month.ghi_physical);
        self.dhi_physical.merge(&month.dhi_physical);
        self.dni_physical.merge(&month.dni_physical);
        self.ghi_ratio.merge(&month.ghi_ratio);
        self.dhi_ratio.merge(&month.dhi_ratio);
    }

    pub fn physical(&self, channel: Channel) -> &PhysicalCounts {
        match channel {
            Channel::Ghi => &self.ghi_physical,
            Channel::Dhi => &self.dhi_physical,
            Channel::Dni => &self.dni_physical,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Buckets flagged records by calendar month and counts every test.
pub fn aggregate(records: &[FlaggedRecord]) -> Vec<MonthlyCounts> {
    let mut buckets: BTreeMap<MonthKey, MonthlyCounts> = BTreeMap::new();
    for record in records {
        let key = MonthKey::of(record);
        buckets
            .entry(key)
            .or_insert_with(|| MonthlyCounts::empty(key))
            .add(record);
    }
    buckets.into_values().collect()
}

/// Sums every monthly bucket. No buckets gives all-zero totals.
pub fn totals(months: &[MonthlyCounts]) -> SeriesTotals {
    months.iter().fold(SeriesTotals::default(), |mut acc, m| {
        acc.add_month(m);
        acc
    })
}

/// Pulls one metric out of every bucket, in month order. This is the shape
/// the plotting side consumes, one number per month.
pub fn series<F>(months: &[MonthlyCounts], metric: F) -> Vec<usize>
where
    F: Fn(&MonthlyCounts) -> usize,
{
    months.iter().map(metric).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DerivedGeometry, PhysicalFlags, QcInputRecord, RatioFlags, ZenithBand,
    };
    use chrono::{TimeZone, Utc};

    fn flagged(year: i32, month: u32, day: u32, ghi: PhysicalOutcome, ghi_ratio: RatioCheck) -> FlaggedRecord {
        FlaggedRecord {
            input: QcInputRecord {
                timestamp: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
                ghi: ghi.pass_value().or(ghi.fail_value()),
                dni: None,
                dhi: Some(100.0),
                zenith_deg: 40.0,
                earth_sun_factor: 1.0,
            },
            derived: DerivedGeometry { mu0: 0.77, extraterrestrial_adjusted: 1361.1, sum_sw: None },
            physical: PhysicalFlags {
                ghi,
                dhi: PhysicalOutcome::Pass(100.0),
                dni: PhysicalOutcome::Fail(None),
            },
            ratio: RatioFlags {
                ghi_ratio,
                dhi_ratio: RatioCheck::skipped(),
                final_ghi: None,
                final_dhi: Some(100.0),
                final_dni: None,
            },
        }
    }

    fn flagged_a() -> RatioCheck {
        RatioCheck { ratio: Some(2.0), flagged: Some(ZenithBand::HighSun) }
    }

    #[test]
    fn test_empty_input_produces_no_buckets() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_buckets_are_chronological_and_skip_empty_months() {
        let records = vec![
            flagged(2019, 1, 5, PhysicalOutcome::Pass(400.0), RatioCheck::skipped()),
            flagged(2019, 1, 31, PhysicalOutcome::Pass(410.0), RatioCheck::skipped()),
            flagged(2019, 3, 1, PhysicalOutcome::Fail(Some(2500.0)), RatioCheck::skipped()),
            flagged(2020, 1, 1, PhysicalOutcome::Pass(390.0), RatioCheck::skipped()),
        ];
        let months = aggregate(&records);
        let keys: Vec<String> = months.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(keys, vec!["2019-01", "2019-03", "2020-01"]);
        assert_eq!(months[0].records, 2);
        assert_eq!(months[0].ghi_physical.pass, 2);
        assert_eq!(months[1].ghi_physical.fail, 1);
    }

    #[test]
    fn test_missing_values_count_as_failures() {
        let records = vec![flagged(2019, 1, 5, PhysicalOutcome::Pass(400.0), RatioCheck::skipped())];
        let months = aggregate(&records);
        assert_eq!(months[0].dni_physical.fail, 1);
        assert_eq!(months[0].dni_physical.missing, 1);
        assert_eq!(months[0].dni_physical.pass, 0);
    }

    #[test]
    fn test_skipped_ratio_checks_are_not_counted() {
        let records = vec![
            flagged(2019, 2, 1, PhysicalOutcome::Pass(400.0), RatioCheck::skipped()),
            flagged(2019, 2, 2, PhysicalOutcome::Pass(400.0), flagged_a()),
            flagged(
                2019,
                2,
                3,
                PhysicalOutcome::Pass(400.0),
                RatioCheck { ratio: Some(1.0), flagged: None },
            ),
        ];
        let counts = aggregate(&records)[0].ghi_ratio;
        assert_eq!(counts.evaluated, 2);
        assert_eq!(counts.band_a, 1);
        assert_eq!(counts.band_b, 0);
    }

    #[test]
    fn test_monthly_counts_sum_to_series_totals() {
        let mut records = Vec::new();
        for day in 1..=28 {
            for month in [1, 2, 6, 11] {
                let outcome = if day % 3 == 0 {
                    PhysicalOutcome::Fail(Some(3000.0))
                } else {
                    PhysicalOutcome::Pass(300.0)
                };
                records.push(flagged(2019, month, day, outcome, RatioCheck::skipped()));
            }
        }
        records.sort_by_key(|r| r.input.timestamp);
        let months = aggregate(&records);
        let total = totals(&months);
        assert_eq!(total.months, 4);
        assert_eq!(total.records, records.len());
        assert_eq!(total.ghi_physical.total(), records.len());
        assert_eq!(
            total.ghi_physical.fail,
            records.iter().filter(|r| !r.physical.ghi.is_pass()).count()
        );
    }

    #[test]
    fn test_series_extracts_one_metric_per_month() {
        let records = vec![
            flagged(2019, 1, 5, PhysicalOutcome::Pass(400.0), flagged_a()),
            flagged(2019, 2, 5, PhysicalOutcome::Pass(400.0), RatioCheck::skipped()),
        ];
        let months = aggregate(&records);
        assert_eq!(series(&months, |m| m.ghi_ratio.band_a), vec![1, 0]);
        assert_eq!(series(&months, |m| m.ghi_physical.pass), vec![1, 1]);
    }

    #[test]
    fn test_totals_of_nothing_is_zero() {
        let total = totals(&[]);
        assert_eq!(total, SeriesTotals::default());
        assert_eq!(total.months, 0);
        assert_eq!(total.records, 0);

        let json = serde_json::to_value(total).expect("totals should serialize");
        assert!(json.get("month").is_none(), "totals carry no month key: {}", json);
    }

    #[test]
    fn test_physical_counts_by_channel() {
        let records = vec![
            flagged(2019, 1, 5, PhysicalOutcome::Pass(400.0), RatioCheck::skipped()),
            flagged(2019, 1, 6, PhysicalOutcome::Fail(Some(2500.0)), RatioCheck::skipped()),
        ];
        let months = aggregate(&records);
        assert_eq!(months[0].physical(Channel::Ghi).pass, 1);
        assert_eq!(months[0].physical(Channel::Ghi).fail, 1);
        assert_eq!(months[0].physical(Channel::Dhi).pass, 2);
        assert_eq!(months[0].physical(Channel::Dni).missing, 2);

        let total = totals(&months);
        for channel in Channel::ALL {
            assert_eq!(total.physical(channel), months[0].physical(channel));
        }
    }
}
