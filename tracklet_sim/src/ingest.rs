// tracklet_sim/src/ingest.rs

//! Reading recorded measurement logs.
//!
//! One measurement per line, whitespace separated:
//!
//! ```text
//! L  px  py  timestamp_us  [gt_px gt_py gt_vx gt_vy]
//! R  rho phi rho_dot timestamp_us  [gt_px gt_py gt_vx gt_vy]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use nalgebra::Vector4;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracklet_core::messages::MeasurementMessage;
use tracklet_core::types::Timestamp;
use walkdir::WalkDir;

use crate::error::SimError;

/// Extension of the measurement log files picked up from a directory.
pub const LOG_EXTENSION: &str = "txt";

const GROUND_TRUTH_FIELDS: usize = 4;

/// One line of a measurement log.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub message: MeasurementMessage,
    /// Reference `[px, py, vx, vy]`, when the log carries one.
    pub ground_truth: Option<Vector4<f64>>,
}

/// Parses a single line. Returns `Ok(None)` for blank and comment lines.
/// `line_no` is 1-based and only used for error reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<MeasurementRecord>, SimError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let tag = tokens.next().unwrap_or_default();
    let fields: Vec<&str> = tokens.collect();

    let fail = |reason: String| SimError::Parse {
        line: line_no,
        reason,
    };

    let reading_len = match tag {
        "L" => 2,
        "R" => 3,
        other => return Err(fail(format!("unknown sensor tag '{other}'"))),
    };

    // Readings, then the timestamp, then optionally a full ground-truth block.
    let expected = reading_len + 1;
    if fields.len() != expected && fields.len() != expected + GROUND_TRUTH_FIELDS {
        return Err(fail(format!(
            "expected {} or {} fields after '{}', found {}",
            expected,
            expected + GROUND_TRUTH_FIELDS,
            tag,
            fields.len()
        )));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if i == reading_len {
            continue;
        }
        let value: f64 = field
            .parse()
            .map_err(|_| fail(format!("'{field}' is not a number")))?;
        if !value.is_finite() {
            return Err(fail(format!("'{field}' is not finite")));
        }
        values.push(value);
    }
    let timestamp: Timestamp = fields[reading_len]
        .parse()
        .map_err(|_| fail(format!("'{}' is not a timestamp in us", fields[reading_len])))?;

    let message = match tag {
        "L" => MeasurementMessage::lidar(values[0], values[1], timestamp),
        _ => MeasurementMessage::radar(values[0], values[1], values[2], timestamp),
    };

    let ground_truth = (values.len() > reading_len).then(|| {
        Vector4::new(
            values[reading_len],
            values[reading_len + 1],
            values[reading_len + 2],
            values[reading_len + 3],
        )
    });

    Ok(Some(MeasurementRecord {
        message,
        ground_truth,
    }))
}

/// Parses a whole log, stopping at the first malformed line.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<MeasurementRecord>, SimError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        if let Some(record) = parse_line(&line?, i + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

pub fn load_log(path: &Path) -> Result<Vec<MeasurementRecord>, SimError> {
    let file = File::open(path)?;
    let records = parse_log(BufReader::new(file))?;
    info!("Read {} measurements from {}", records.len(), path.display());
    Ok(records)
}

/// Resolves `path` into the list of logs to replay: the file itself, or
/// every `*.txt` file below a directory in sorted order.
pub fn collect_log_files(path: &Path) -> Result<Vec<PathBuf>, SimError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_log = entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some(LOG_EXTENSION);
        if is_log {
            debug!("Found measurement log: {}", entry.path().display());
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklet_core::messages::{MeasurementData, SensorKind};

    #[test]
    fn test_lidar_line_with_ground_truth() {
        let line = "L\t3.122427e-01\t5.803398e-01\t1477010443000000\t\
                    6.000000e-01\t6.000000e-01\t5.199937e+00\t0\n";
        let record = parse_line(line, 1).unwrap().unwrap();
        assert_eq!(record.message.sensor(), SensorKind::Lidar);
        assert_eq!(record.message.timestamp, 1_477_010_443_000_000);
        match record.message.data {
            MeasurementData::Lidar(z) => {
                assert_eq!(z[0], 0.3122427);
                assert_eq!(z[1], 0.5803398);
            }
            other => panic!("wrong data {:?}", other),
        }
        assert_eq!(record.ground_truth, Some(Vector4::new(0.6, 0.6, 5.199937, 0.0)));
    }

    #[test]
    fn test_radar_line_without_ground_truth() {
        let record = parse_line("R 1.014892 0.554329 4.892807 1477010443050000", 3)
            .unwrap()
            .unwrap();
        assert_eq!(record.message.sensor(), SensorKind::Radar);
        assert_eq!(record.message.timestamp, 1_477_010_443_050_000);
        assert!(record.ground_truth.is_none());
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert!(parse_line("", 1).unwrap().is_none());
        assert!(parse_line("   ", 2).unwrap().is_none());
        assert!(parse_line("# recorded 2016-10-21", 3).unwrap().is_none());
    }

    #[test]
    fn test_errors_carry_line_number() {
        let log = "L 1.0 2.0 100\n\nX 1.0 2.0 200\n";
        match parse_log(log.as_bytes()) {
            Err(SimError::Parse { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("'X'"));
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_field_counts_and_numbers() {
        // Partial ground truth block.
        assert!(matches!(
            parse_line("L 1.0 2.0 100 0.0 0.0", 1),
            Err(SimError::Parse { line: 1, .. })
        ));
        assert!(parse_line("R 1.0 abc 2.0 100", 1).is_err());
        assert!(parse_line("L 1.0 2.0 -100", 1).is_err());
        assert!(parse_line("L 1.0 NaN 100", 1).is_err());
    }

    #[test]
    fn test_parse_log_keeps_order() {
        let log = "# header\nL 1.0 2.0 100\nR 1.0 0.1 0.5 200\n";
        let records = parse_log(log.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message.timestamp, 100);
        assert_eq!(records[1].message.sensor(), SensorKind::Radar);
    }
}
