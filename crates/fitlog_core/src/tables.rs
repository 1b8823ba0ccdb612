//! Flat-table output.
//!
//! Every artifact is a plain CSV with a fixed header order: the
//! aggregate tables spell theirs out via [`TableRow`] (written even for
//! zero rows), the streaming record/workout tables take theirs from the
//! serde field order on first write. `Option` fields serialize to empty
//! cells, never zero, so a missing reading stays distinguishable from a
//! zero reading.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::Result;
use crate::types::{
    CombinedDailyRow, DailyMetricRow, DailyStrengthRow, ExerciseDayRow, PersonalRecordRow,
    QuantityRecord, WorkoutRecord,
};

pub const RECORDS_FILE: &str = "records.csv";
pub const WORKOUTS_FILE: &str = "workouts.csv";
pub const HEALTH_DAILY_FILE: &str = "health_daily.csv";
pub const STRENGTH_DAILY_FILE: &str = "strength_daily.csv";
pub const STRENGTH_BY_EXERCISE_FILE: &str = "strength_by_exercise.csv";
pub const STRENGTH_PRS_FILE: &str = "strength_prs.csv";
pub const COMBINED_DAILY_FILE: &str = "combined_daily.csv";

/// `records.csv` row. Header names follow the source export's attribute
/// casing for the pass-through columns.
#[derive(Debug, Serialize)]
pub struct RecordCsvRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub unit: Option<String>,
    pub value: f64,
    pub start_utc: String,
    pub end_utc: String,
    #[serde(rename = "sourceName")]
    pub source_name: Option<String>,
    #[serde(rename = "sourceVersion")]
    pub source_version: Option<String>,
    pub device: Option<String>,
}

impl From<&QuantityRecord> for RecordCsvRow {
    fn from(rec: &QuantityRecord) -> Self {
        Self {
            kind: rec.kind.clone(),
            unit: rec.unit.clone(),
            value: rec.value,
            start_utc: rec.start.iso(),
            end_utc: rec.end.iso(),
            source_name: rec.source_name.clone(),
            source_version: rec.source_version.clone(),
            device: rec.device.clone(),
        }
    }
}

/// `workouts.csv` row. Duration/distance/energy keep their original units.
#[derive(Debug, Serialize)]
pub struct WorkoutCsvRow {
    #[serde(rename = "workoutActivityType")]
    pub activity_type: String,
    pub duration: Option<f64>,
    #[serde(rename = "durationUnit")]
    pub duration_unit: Option<String>,
    #[serde(rename = "totalDistance")]
    pub distance: Option<f64>,
    #[serde(rename = "totalDistanceUnit")]
    pub distance_unit: Option<String>,
    #[serde(rename = "totalEnergyBurned")]
    pub energy: Option<f64>,
    #[serde(rename = "totalEnergyBurnedUnit")]
    pub energy_unit: Option<String>,
    pub start_utc: String,
    pub end_utc: String,
    #[serde(rename = "sourceName")]
    pub source_name: Option<String>,
    #[serde(rename = "sourceVersion")]
    pub source_version: Option<String>,
    pub device: Option<String>,
}

impl From<&WorkoutRecord> for WorkoutCsvRow {
    fn from(wk: &WorkoutRecord) -> Self {
        Self {
            activity_type: wk.activity_type.clone(),
            duration: wk.duration,
            duration_unit: wk.duration_unit.clone(),
            distance: wk.distance,
            distance_unit: wk.distance_unit.clone(),
            energy: wk.energy,
            energy_unit: wk.energy_unit.clone(),
            start_utc: wk.start.iso(),
            end_utc: wk.end.iso(),
            source_name: wk.source_name.clone(),
            source_version: wk.source_version.clone(),
            device: wk.device.clone(),
        }
    }
}

/// A row type with a fixed column order. The header is written even when
/// the table has zero rows, so every produced table carries it.
pub trait TableRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl TableRow for DailyMetricRow {
    const HEADER: &'static [&'static str] =
        &["date", "weight_lb", "bmi", "body_fat_pct", "lean_mass_lb"];
}

impl TableRow for DailyStrengthRow {
    const HEADER: &'static [&'static str] = &[
        "date",
        "volume_kg",
        "sets",
        "reps",
        "exercises",
        "workout_count",
        "duration_min",
    ];
}

impl TableRow for ExerciseDayRow {
    const HEADER: &'static [&'static str] =
        &["date", "exercise", "top_set_kg", "sets", "reps", "volume_kg"];
}

impl TableRow for PersonalRecordRow {
    const HEADER: &'static [&'static str] =
        &["exercise", "best_1rm_kg", "best_weight_kg", "best_reps"];
}

impl TableRow for CombinedDailyRow {
    const HEADER: &'static [&'static str] = &[
        "date",
        "weight_lb",
        "bmi",
        "body_fat_pct",
        "lean_mass_lb",
        "volume_kg",
        "sets",
        "reps",
        "exercises",
        "workout_count",
        "duration_min",
        "volume_lb",
    ];
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Open a serde-aware CSV writer; the header row comes from the first
/// serialized struct's field order. Used by the lazily-created streaming
/// tables, which only exist once they have a row.
pub fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    ensure_parent(path)?;
    Ok(csv::Writer::from_path(path)?)
}

/// Write a whole table in one shot. The fixed header goes first, so an
/// empty input still produces a one-line table rather than a zero-byte
/// file.
pub fn write_table<S: TableRow>(path: &Path, rows: &[S]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(S::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyMetricRow;

    #[test]
    fn option_fields_serialize_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEALTH_DAILY_FILE);
        let rows = vec![DailyMetricRow {
            date: "2025-01-02".into(),
            weight_lb: Some(183.25),
            bmi: None,
            body_fat_pct: None,
            lean_mass_lb: Some(150.0),
        }];
        write_table(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,weight_lb,bmi,body_fat_pct,lean_mass_lb"
        );
        assert_eq!(lines.next().unwrap(), "2025-01-02,183.25,,,150.0");
    }

    #[test]
    fn write_table_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/table.csv");
        let rows: Vec<DailyMetricRow> = Vec::new();
        write_table(&path, &rows).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_table_still_carries_its_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEALTH_DAILY_FILE);
        let rows: Vec<DailyMetricRow> = Vec::new();
        write_table(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,weight_lb,bmi,body_fat_pct,lean_mass_lb\n");
    }

    #[test]
    fn combined_header_matches_the_row_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COMBINED_DAILY_FILE);
        let rows = vec![CombinedDailyRow {
            date: "2025-01-02".into(),
            weight_lb: Some(183.25),
            bmi: None,
            body_fat_pct: None,
            lean_mass_lb: None,
            volume_kg: Some(1480.0),
            sets: Some(3),
            reps: Some(18.0),
            exercises: Some(2),
            workout_count: Some(1),
            duration_min: Some(0.0),
            volume_lb: Some(3262.841),
        }];
        write_table(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        for line in text.lines() {
            assert_eq!(line.split(',').count(), CombinedDailyRow::HEADER.len());
        }
    }
}
