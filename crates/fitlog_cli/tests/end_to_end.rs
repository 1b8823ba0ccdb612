//! Drives the command layer against small on-disk fixtures.

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};
use fitlog_cli::commands;

fn stamp(days_ago: i64, time: &str) -> String {
    let date = (Utc::now() - Duration::days(days_ago)).format("%Y-%m-%d");
    format!("{date} {time} +0000")
}

fn write_export(path: &Path) {
    let recent = stamp(2, "07:00:00");
    let older = stamp(5, "07:30:00");
    let ancient = stamp(400, "07:00:00");
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierBodyMass" unit="kg" value="81.6" startDate="{recent}" endDate="{recent}"/>
 <Record type="HKQuantityTypeIdentifierBodyMass" unit="lb" value="181.0" startDate="{older}" endDate="{older}"/>
 <Record type="HKQuantityTypeIdentifierBodyFatPercentage" unit="%" value="0.241" startDate="{recent}" endDate="{recent}"/>
 <Record type="HKQuantityTypeIdentifierBodyMass" unit="kg" value="90.0" startDate="{ancient}" endDate="{ancient}"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" unit="count/min" value="62" startDate="{recent}" endDate="{recent}"/>
</HealthData>
"#
    );
    fs::write(path, xml).expect("write export fixture");
}

fn write_strong_csv(path: &Path) {
    let day = (Utc::now() - Duration::days(2)).format("%Y-%m-%d");
    let csv = format!(
        "Date,Exercise Name,Set Order,Weight,Reps\n\
         {day} 18:00:00,Squat,1,100,5\n\
         {day} 18:00:00,Squat,2,100,5\n\
         {day} 18:00:00,Bench Press,1,60,8\n"
    );
    fs::write(path, csv).expect("write strength fixture");
}

#[test]
fn build_produces_a_combined_daily_table_with_outer_join_semantics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let xml = dir.path().join("export.xml");
    let strong = dir.path().join("strong.csv");
    let out = dir.path().join("processed");
    write_export(&xml);
    write_strong_csv(&strong);

    let summary = commands::build(&xml, &strong, &out, 365).expect("build");

    // Two health days plus one shared strength day -> still two rows.
    assert_eq!(summary.days, 2);
    assert_eq!(summary.stats.skipped_old, 1);

    let combined = fs::read_to_string(&summary.combined).expect("read combined");
    let mut lines = combined.lines();
    assert_eq!(
        lines.next().expect("header"),
        "date,weight_lb,bmi,body_fat_pct,lean_mass_lb,volume_kg,\
         sets,reps,exercises,workout_count,duration_min,volume_lb"
    );

    let older_day = (Utc::now() - Duration::days(5)).format("%Y-%m-%d").to_string();
    let recent_day = (Utc::now() - Duration::days(2)).format("%Y-%m-%d").to_string();
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);

    // Health-only day carries empty strength cells.
    let older_row = rows
        .iter()
        .find(|r| r.starts_with(&older_day))
        .expect("older day present");
    assert_eq!(*older_row, format!("{older_day},181.0,,,,,,,,,,"));

    // Shared day has both sides: 2x100x5 + 60x8 = 1480 kg volume.
    let recent_row = rows
        .iter()
        .find(|r| r.starts_with(&recent_day))
        .expect("recent day present");
    assert!(recent_row.contains(",1480.0,"), "row: {recent_row}");
    assert!(recent_row.ends_with(",3262.841"), "row: {recent_row}");

    assert!(summary.health_daily.is_file());
    assert!(summary.strength_daily.is_file());
}

#[test]
fn strength_command_writes_all_three_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let strong = dir.path().join("strong.csv");
    let out = dir.path().join("processed");
    write_strong_csv(&strong);

    let summary = commands::strength(&strong, &out).expect("strength");
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.days, 1);
    assert!(summary.daily.is_file());
    assert!(summary.by_exercise.is_file());
    assert!(summary.personal_records.is_file());

    let prs = fs::read_to_string(&summary.personal_records).expect("read prs");
    assert!(prs.contains("Squat"));
    assert!(prs.contains("Bench Press"));
}

#[test]
fn strength_command_rejects_a_csv_without_required_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let strong = dir.path().join("strong.csv");
    let out = dir.path().join("processed");
    fs::write(&strong, "When,Movement,Load\n2025-01-01,Squat,100\n").expect("write fixture");

    let err = commands::strength(&strong, &out).expect_err("schema mismatch");
    assert!(err.to_string().contains("columns"), "error: {err}");
}

#[test]
fn health_table_keeps_its_header_when_no_records_are_in_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let xml = dir.path().join("export.xml");
    let out = dir.path().join("processed");
    let ancient = stamp(400, "07:00:00");
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <Record type="HKQuantityTypeIdentifierBodyMass" unit="kg" value="90.0" startDate="{ancient}" endDate="{ancient}"/>
</HealthData>
"#
    );
    fs::write(&xml, body).expect("write export fixture");

    let summary = commands::health(&xml, &out, 365).expect("health");
    assert_eq!(summary.days, 0);

    let table = fs::read_to_string(&summary.table).expect("read table");
    assert_eq!(table, "date,weight_lb,bmi,body_fat_pct,lean_mass_lb\n");
}

#[test]
fn health_command_reduces_body_records_to_daily_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let xml = dir.path().join("export.xml");
    let out = dir.path().join("processed");
    write_export(&xml);

    let summary = commands::health(&xml, &out, 365).expect("health");
    assert_eq!(summary.days, 2);

    let table = fs::read_to_string(&summary.table).expect("read table");
    assert!(table.starts_with("date,weight_lb,bmi,body_fat_pct,lean_mass_lb"));
    // Body fat fraction 0.241 comes out as a percentage.
    assert!(table.contains("24.1"), "table: {table}");
}
