// tracklet_sim/src/export.rs

//! Tab-separated output: estimates of a run, and measurement logs in the
//! format `ingest` reads back.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use tracklet_core::messages::MeasurementData;

use crate::error::SimError;
use crate::ingest::MeasurementRecord;
use crate::replay::EstimateRecord;

pub const HEADER: &str =
    "time_us\tsensor\tpx\tpy\tv\tyaw\tyaw_rate\tnis\tgt_px\tgt_py\tgt_vx\tgt_vy";

/// Writes the header and one row per estimate. Missing NIS and ground-truth
/// values are written as empty fields so every row has the same column count.
pub fn write_estimates<W: Write>(
    mut out: W,
    estimates: &[EstimateRecord],
) -> Result<(), SimError> {
    writeln!(out, "{HEADER}")?;
    for e in estimates {
        write!(out, "{}\t{}", e.timestamp_us, e.sensor)?;
        for value in e.state.iter() {
            write!(out, "\t{value:.6}")?;
        }
        match e.nis {
            Some(nis) => write!(out, "\t{nis:.6}")?,
            None => write!(out, "\t")?,
        }
        match e.ground_truth {
            Some(gt) => {
                for value in gt.iter() {
                    write!(out, "\t{value:.6}")?;
                }
            }
            None => write!(out, "\t\t\t\t")?,
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_estimates_to_file(
    path: &Path,
    estimates: &[EstimateRecord],
) -> Result<(), SimError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_estimates(BufWriter::new(File::create(path)?), estimates)?;
    info!("Wrote {} estimates to {}", estimates.len(), path.display());
    Ok(())
}

/// Writes records in the `L`/`R` log format. Values use the shortest exact
/// representation, so reading the log back reproduces the records bit for bit.
pub fn write_measurement_log<W: Write>(
    mut out: W,
    records: &[MeasurementRecord],
) -> Result<(), SimError> {
    for record in records {
        let ts = record.message.timestamp;
        match record.message.data {
            MeasurementData::Lidar(z) => write!(out, "L\t{}\t{}\t{}", z[0], z[1], ts)?,
            MeasurementData::Radar(z) => {
                write!(out, "R\t{}\t{}\t{}\t{}", z[0], z[1], z[2], ts)?
            }
        }
        if let Some(gt) = record.ground_truth {
            write!(out, "\t{}\t{}\t{}\t{}", gt[0], gt[1], gt[2], gt[3])?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_measurement_log_to_file(
    path: &Path,
    records: &[MeasurementRecord],
) -> Result<(), SimError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_measurement_log(BufWriter::new(File::create(path)?), records)?;
    info!("Wrote {} measurements to {}", records.len(), path.display());
    Ok(())
}
