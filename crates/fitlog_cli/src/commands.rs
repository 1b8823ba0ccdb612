//! Command implementations behind the `fitlog` binary.
//!
//! Each command returns a serializable run summary that `main` prints as
//! JSON, so scripted callers can pick up the produced paths.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use fitlog_core::extract::{ExportScan, ExtractOptions, ScanItem, ScanStats, TrimOutput, trim_export};
use fitlog_core::types::{HealthMetric, QuantityRecord};
use fitlog_core::{daily, merge, strength, tables};

/// Trim the XML export into compact records/workouts tables.
pub fn trim(
    xml: &Path,
    out_dir: &Path,
    since_days: u32,
    types: Vec<String>,
    keep_workouts: bool,
) -> Result<TrimOutput> {
    let opts = ExtractOptions {
        since_days,
        record_types: types,
        keep_workouts,
        ..Default::default()
    };
    Ok(trim_export(xml, out_dir, &opts)?)
}

fn scan_body_records(xml: &Path, since_days: u32) -> Result<(Vec<QuantityRecord>, ScanStats)> {
    let opts = ExtractOptions {
        since_days,
        record_types: HealthMetric::BODY_COMPOSITION
            .iter()
            .map(|m| m.hk_identifier().to_string())
            .collect(),
        keep_workouts: false,
        ..Default::default()
    };
    let mut scan = ExportScan::open(xml, &opts)?;
    let mut records = Vec::new();
    for item in scan.by_ref() {
        if let ScanItem::Record(rec) = item? {
            records.push(rec);
        }
    }
    Ok((records, scan.stats()))
}

#[derive(Debug, Serialize)]
pub struct HealthOutput {
    pub table: PathBuf,
    pub days: usize,
    #[serde(flatten)]
    pub stats: ScanStats,
}

/// Build the daily health table from the XML export.
pub fn health(xml: &Path, outdir: &Path, since_days: u32) -> Result<HealthOutput> {
    let (records, stats) = scan_body_records(xml, since_days)?;
    let rows = daily::reduce_daily(records);
    let table = outdir.join(tables::HEALTH_DAILY_FILE);
    tables::write_table(&table, &rows)?;
    info!(days = rows.len(), "daily health table written");
    Ok(HealthOutput {
        table,
        days: rows.len(),
        stats,
    })
}

#[derive(Debug, Serialize)]
pub struct StrengthOutput {
    pub daily: PathBuf,
    pub by_exercise: PathBuf,
    pub personal_records: PathBuf,
    pub rows: usize,
    pub days: usize,
}

/// Build the three strength tables from the training-log CSV.
pub fn strength(csv: &Path, outdir: &Path) -> Result<StrengthOutput> {
    let rows = strength::load_strength_csv(csv)?;
    let daily_rows = strength::daily_summary(&rows);
    let by_exercise = strength::exercise_day_summary(&rows);
    let prs = strength::personal_records(&rows);

    let daily_path = outdir.join(tables::STRENGTH_DAILY_FILE);
    let by_exercise_path = outdir.join(tables::STRENGTH_BY_EXERCISE_FILE);
    let prs_path = outdir.join(tables::STRENGTH_PRS_FILE);
    tables::write_table(&daily_path, &daily_rows)?;
    tables::write_table(&by_exercise_path, &by_exercise)?;
    tables::write_table(&prs_path, &prs)?;
    info!(
        rows = rows.len(),
        days = daily_rows.len(),
        "strength tables written"
    );

    Ok(StrengthOutput {
        daily: daily_path,
        by_exercise: by_exercise_path,
        personal_records: prs_path,
        rows: rows.len(),
        days: daily_rows.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct BuildOutput {
    pub health_daily: PathBuf,
    pub strength_daily: PathBuf,
    pub combined: PathBuf,
    pub days: usize,
    #[serde(flatten)]
    pub stats: ScanStats,
}

/// End-to-end: both sources to the combined daily dataset.
pub fn build(
    xml: &Path,
    strong_csv: &Path,
    outdir: &Path,
    since_days: u32,
) -> Result<BuildOutput> {
    let (records, stats) = scan_body_records(xml, since_days)?;
    let health_rows = daily::reduce_daily(records);

    let strength_rows = strength::load_strength_csv(strong_csv)?;
    let strength_daily = strength::daily_summary(&strength_rows);

    let combined = merge::merge_daily(&health_rows, &strength_daily);

    let health_path = outdir.join(tables::HEALTH_DAILY_FILE);
    let strength_path = outdir.join(tables::STRENGTH_DAILY_FILE);
    let combined_path = outdir.join(tables::COMBINED_DAILY_FILE);
    tables::write_table(&health_path, &health_rows)?;
    tables::write_table(&strength_path, &strength_daily)?;
    tables::write_table(&combined_path, &combined)?;
    info!(days = combined.len(), "combined daily dataset written");

    Ok(BuildOutput {
        health_daily: health_path,
        strength_daily: strength_path,
        combined: combined_path,
        days: combined.len(),
        stats,
    })
}
