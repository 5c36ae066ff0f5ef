//! Normalized QC record CSV
//!
//! Reads the gap-filled, geometry-annotated minute series that upstream
//! tooling writes for the QC core:
//!
//! ```text
//! timestamp,ghi,dni,dhi,zenith_deg,earth_sun_factor
//! 2019-01-15T10:00:00Z,812.4,905.1,118.0,31.2,0.98368
//! 2019-01-15 10:01,null,903.9,117.6,31.0,0.98368
//! ```
//!
//! Timestamps are RFC 3339 or `YYYY-MM-DD HH:MM` (UTC). Irradiance fields
//! accept the usual logger sentinels for "no data". Geometry is mandatory.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::logging::{self, Stage};
use crate::model::{QcError, QcInputRecord};

/// Tokens that mean "no measurement" in an irradiance column.
pub const MISSING_TOKENS: &[&str] = &["", "null", "nan", "na", "-999", "-9999", "-99.9"];

const EXPECTED_FIELDS: usize = 6;

fn parse_irradiance(field: &str) -> Result<Option<f64>, String> {
    let s = field.trim();
    if MISSING_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        return Ok(None);
    }
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if value.is_finite() && MISSING_TOKENS.iter().any(|t| t.parse::<f64>() == Ok(value)) {
        // "-999.0" and friends
        return Ok(None);
    }
    Ok(Some(value))
}

fn parse_geometry(field: &str, name: &str) -> Result<f64, String> {
    let s = field.trim();
    s.parse::<f64>()
        .map_err(|_| format!("{} '{}' is not a number", name, s))
}

fn parse_timestamp(field: &str) -> Result<DateTime<Utc>, String> {
    let s = field.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
        .ok_or_else(|| format!("unrecognised timestamp '{}'", s))
}

/// Parses normalized record CSV text.
///
/// The first non-blank line is a header and is skipped. Blank lines are
/// ignored. Any malformed row fails the whole parse with its line number,
/// since a silently dropped minute would shift the monthly counts.
pub fn parse_records_csv(text: &str) -> Result<Vec<QcInputRecord>, QcError> {
    let mut records = Vec::new();
    let mut header_seen = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != EXPECTED_FIELDS {
            return Err(QcError::ParseError(format!(
                "line {}: expected {} fields, found {}",
                line_no,
                EXPECTED_FIELDS,
                fields.len()
            )));
        }

        let at_line = |msg: String| QcError::ParseError(format!("line {}: {}", line_no, msg));

        records.push(QcInputRecord {
            timestamp: parse_timestamp(fields[0]).map_err(at_line)?,
            ghi: parse_irradiance(fields[1]).map_err(at_line)?,
            dni: parse_irradiance(fields[2]).map_err(at_line)?,
            dhi: parse_irradiance(fields[3]).map_err(at_line)?,
            zenith_deg: parse_geometry(fields[4], "zenith").map_err(at_line)?,
            earth_sun_factor: parse_geometry(fields[5], "Earth-Sun factor").map_err(at_line)?,
        });
    }

    logging::debug(
        Stage::Ingest,
        None,
        &format!("parsed {} normalized records", records.len()),
    );
    Ok(records)
}

/// Reads and parses a normalized record file.
pub fn read_records_csv(path: impl AsRef<std::path::Path>) -> Result<Vec<QcInputRecord>, QcError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| QcError::ParseError(format!("cannot read {}: {}", path.display(), e)))?;
    parse_records_csv(&text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "timestamp,ghi,dni,dhi,zenith_deg,earth_sun_factor";

    #[test]
    fn test_parses_rfc3339_and_plain_timestamps() {
        let csv = format!(
            "{}\n2019-01-15T10:00:00Z,812.4,905.1,118.0,31.2,0.98368\n2019-01-15 10:01,810.0,903.9,117.6,31.0,0.98368\n",
            HEADER
        );
        let records = parse_records_csv(&csv).expect("valid csv");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2019, 1, 15, 10, 0, 0).unwrap());
        assert_eq!(records[1].timestamp, Utc.with_ymd_and_hms(2019, 1, 15, 10, 1, 0).unwrap());
        assert_eq!(records[0].ghi, Some(812.4));
        assert_eq!(records[1].zenith_deg, 31.0);

        let crlf = csv.replace('\n', "\r\n");
        let from_crlf = parse_records_csv(&crlf).expect("CRLF line endings should parse");
        assert_eq!(from_crlf, records);
        assert_eq!(from_crlf[1].earth_sun_factor, 0.98368);
    }

    #[test]
    fn test_offset_timestamps_are_converted_to_utc() {
        let csv = format!("{}\n2019-01-15T12:00:00+02:00,1,2,3,40,1.0\n", HEADER);
        let records = parse_records_csv(&csv).expect("valid csv");
        assert_eq!(records[0].timestamp, Utc.with_ymd_and_hms(2019, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_sentinels_become_none() {
        let csv = format!(
            "{}\n2019-01-15T10:00:00Z,null,NaN,,40,1.0\n2019-01-15T10:01:00Z,-999,-9999.0,NAN,40,1.0\n",
            HEADER
        );
        let records = parse_records_csv(&csv).expect("sentinels are valid");
        for rec in &records {
            assert_eq!((rec.ghi, rec.dni, rec.dhi), (None, None, None), "{:?}", rec);
        }
    }

    #[test]
    fn test_small_negative_values_are_kept() {
        let csv = format!("{}\n2019-01-15T02:00:00Z,-2.1,-0.4,-1.9,120,1.0\n", HEADER);
        let records = parse_records_csv(&csv).expect("valid csv");
        assert_eq!(records[0].ghi, Some(-2.1));
    }

    #[test]
    fn test_missing_geometry_is_an_error() {
        let csv = format!("{}\n2019-01-15T10:00:00Z,1,2,3,,1.0\n", HEADER);
        let err = parse_records_csv(&csv).unwrap_err();
        match err {
            QcError::ParseError(msg) => assert!(msg.contains("line 2"), "{}", msg),
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_count_is_an_error() {
        let csv = format!("{}\n2019-01-15T10:00:00Z,1,2,3,40\n", HEADER);
        assert!(matches!(parse_records_csv(&csv), Err(QcError::ParseError(_))));
    }

    #[test]
    fn test_blank_lines_and_header_only() {
        assert!(parse_records_csv("").unwrap().is_empty());
        assert!(parse_records_csv(&format!("\n{}\n\n", HEADER)).unwrap().is_empty());
    }
}
