//! Strength-training log: flexible-schema CSV loader and aggregations.
//!
//! Strong-style exports drift: column names change casing, spacing, and
//! wording between app versions. The loader resolves each logical field
//! against a declarative alias table with case/space/underscore-insensitive
//! matching. Only the date and exercise columns are required; everything
//! else degrades to `None`. Per-row parse failures null the field or skip
//! the row, never the file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::types::{DailyStrengthRow, ExerciseDayRow, PersonalRecordRow, StrengthSetRow};
use crate::{FitlogError, Result, timestamp, units};

/// Alias candidates per logical field, in match-priority order. Matching
/// normalizes case and strips spaces/underscores on both sides.
mod aliases {
    pub const DATE: &[&str] = &["Date", "Workout Date", "Start Time", "day"];
    pub const EXERCISE: &[&str] = &["Exercise Name", "Exercise"];
    pub const SET_INDEX: &[&str] = &["Set Order", "Set", "Set Number"];
    pub const WEIGHT: &[&str] = &["Weight", "Weight (kg)", "kg", "lb"];
    pub const WEIGHT_UNIT: &[&str] = &["Weight Unit", "Unit"];
    pub const REPS: &[&str] = &["Reps", "Rep"];
    pub const VOLUME: &[&str] = &["Volume", "Total Volume", "Volume (kg)"];
    pub const GROUP: &[&str] = &["Body Part", "Muscle Group", "Category"];
    pub const NOTES: &[&str] = &["Notes", "Comment"];
    pub const DURATION: &[&str] = &["Duration", "Total Time", "Workout Duration (min)"];
}

fn norm_header(s: &str) -> String {
    s.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Header indices after alias resolution. Date and exercise are the only
/// fatal requirements.
#[derive(Clone, Debug)]
pub struct ResolvedColumns {
    pub date: usize,
    pub exercise: usize,
    pub set_index: Option<usize>,
    pub weight: Option<usize>,
    pub weight_unit: Option<usize>,
    pub reps: Option<usize>,
    pub volume: Option<usize>,
    pub group: Option<usize>,
    pub notes: Option<usize>,
    pub duration: Option<usize>,
}

/// Resolve a header row against the alias table.
pub fn resolve_columns(headers: &csv::StringRecord) -> Result<ResolvedColumns> {
    let normalized: Vec<String> = headers.iter().map(norm_header).collect();
    let find = |candidates: &[&str]| -> Option<usize> {
        candidates
            .iter()
            .find_map(|c| normalized.iter().position(|h| *h == norm_header(c)))
    };

    let date = find(aliases::DATE);
    let exercise = find(aliases::EXERCISE);
    let (Some(date), Some(exercise)) = (date, exercise) else {
        return Err(FitlogError::schema(
            "could not find required strength-log columns (Date/Exercise)",
        ));
    };

    Ok(ResolvedColumns {
        date,
        exercise,
        set_index: find(aliases::SET_INDEX),
        weight: find(aliases::WEIGHT),
        weight_unit: find(aliases::WEIGHT_UNIT),
        reps: find(aliases::REPS),
        volume: find(aliases::VOLUME),
        group: find(aliases::GROUP),
        notes: find(aliases::NOTES),
        duration: find(aliases::DURATION),
    })
}

/// Calendar date from a raw cell, `None` when unrecoverable.
fn parse_date(raw: &str) -> Option<String> {
    let stamp = timestamp::normalize(raw);
    if NaiveDate::parse_from_str(&stamp.date, "%Y-%m-%d").is_ok() {
        return Some(stamp.date);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    None
}

/// Duration cell to minutes: plain number first, colon forms
/// (`HH:MM:SS` or `HH:MM`) as durations.
fn parse_duration_min(raw: &str) -> Option<f64> {
    if let Ok(v) = raw.parse::<f64>() {
        return Some(v);
    }
    if raw.contains(':') {
        let parts: Vec<f64> = raw
            .split(':')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        return match parts[..] {
            [h, m, s] => Some(h * 60.0 + m + s / 60.0),
            [h, m] => Some(h * 60.0 + m),
            _ => None,
        };
    }
    None
}

fn normalize_row(rec: &csv::StringRecord, cols: &ResolvedColumns) -> Option<StrengthSetRow> {
    let cell = |idx: Option<usize>| -> Option<&str> {
        idx.and_then(|i| rec.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let num = |idx: Option<usize>| cell(idx).and_then(|s| s.parse::<f64>().ok());

    let raw_date = cell(Some(cols.date))?;
    let date = parse_date(raw_date)?;
    let exercise = cell(Some(cols.exercise))?.to_string();

    let reps = num(cols.reps);
    let weight_kg = num(cols.weight).map(|w| {
        let is_lb = cell(cols.weight_unit)
            .is_some_and(|u| u.to_lowercase().contains("lb"));
        if is_lb { units::lb_to_kg(w) } else { w }
    });
    // A source volume column wins even when its cell fails to parse;
    // derivation only covers files with no volume column at all.
    let volume_kg = if cols.volume.is_some() {
        num(cols.volume)
    } else {
        weight_kg.zip(reps).map(|(w, r)| w * r)
    };

    Some(StrengthSetRow {
        date,
        started: raw_date.to_string(),
        exercise,
        set_index: num(cols.set_index),
        weight_kg,
        reps,
        volume_kg,
        duration_min: cell(cols.duration).and_then(parse_duration_min),
        group: cell(cols.group).map(str::to_string),
    })
}

/// Load and normalize a strength log from any reader.
pub fn load_strength_reader<R: Read>(reader: R) -> Result<Vec<StrengthSetRow>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let cols = resolve_columns(csv_reader.headers()?)?;

    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for rec in csv_reader.records() {
        let rec = match rec {
            Ok(r) => r,
            Err(err) => {
                skipped += 1;
                debug!("skipping malformed strength row: {err}");
                continue;
            }
        };
        match normalize_row(&rec, &cols) {
            Some(row) => rows.push(row),
            None => {
                skipped += 1;
                debug!("skipping strength row with no usable date/exercise");
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, "strength rows skipped during load");
    }
    info!(rows = rows.len(), "strength log loaded");
    Ok(rows)
}

/// Load a strength log from a file path.
pub fn load_strength_csv(path: &Path) -> Result<Vec<StrengthSetRow>> {
    load_strength_reader(File::open(path)?)
}

/// Group rows by key and reduce with a per-group accumulator. `BTreeMap`
/// keeps group order deterministic. Rows whose key is `None` are excluded
/// from the reduction.
pub fn fold_groups<'a, K, A>(
    rows: &'a [StrengthSetRow],
    key: impl Fn(&StrengthSetRow) -> Option<K>,
    mut fold: impl FnMut(&mut A, &'a StrengthSetRow),
) -> BTreeMap<K, A>
where
    K: Ord,
    A: Default,
{
    let mut groups: BTreeMap<K, A> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            fold(groups.entry(k).or_default(), row);
        }
    }
    groups
}

#[derive(Default)]
struct DailyAcc {
    volume: f64,
    sets: u32,
    reps: f64,
    exercises: BTreeSet<String>,
    starts: BTreeSet<String>,
    duration: f64,
}

/// Daily totals across all exercises, ascending by date.
pub fn daily_summary(rows: &[StrengthSetRow]) -> Vec<DailyStrengthRow> {
    fold_groups(
        rows,
        |r| Some(r.date.clone()),
        |acc: &mut DailyAcc, r| {
            acc.volume += r.volume_kg.unwrap_or(0.0);
            if r.is_set() {
                acc.sets += 1;
            }
            acc.reps += r.reps.unwrap_or(0.0);
            acc.exercises.insert(r.exercise.clone());
            acc.starts.insert(r.started.clone());
            acc.duration += r.duration_min.unwrap_or(0.0);
        },
    )
    .into_iter()
    .map(|(date, acc)| DailyStrengthRow {
        date,
        volume_kg: units::round3(acc.volume),
        sets: acc.sets,
        reps: acc.reps,
        exercises: acc.exercises.len() as u32,
        workout_count: acc.starts.len() as u32,
        duration_min: units::round3(acc.duration),
    })
    .collect()
}

#[derive(Default)]
struct ExerciseAcc {
    top: Option<f64>,
    sets: u32,
    reps: f64,
    volume: f64,
}

/// Per-exercise-per-day totals, ascending by (date, exercise).
pub fn exercise_day_summary(rows: &[StrengthSetRow]) -> Vec<ExerciseDayRow> {
    fold_groups(
        rows,
        |r| Some((r.date.clone(), r.exercise.clone())),
        |acc: &mut ExerciseAcc, r| {
            acc.top = match (acc.top, r.weight_kg) {
                (Some(t), Some(w)) => Some(t.max(w)),
                (None, w) => w,
                (t, None) => t,
            };
            if r.is_set() {
                acc.sets += 1;
            }
            acc.reps += r.reps.unwrap_or(0.0);
            acc.volume += r.volume_kg.unwrap_or(0.0);
        },
    )
    .into_iter()
    .map(|((date, exercise), acc)| ExerciseDayRow {
        date,
        exercise,
        top_set_kg: acc.top.map(units::round3),
        sets: acc.sets,
        reps: acc.reps,
        volume_kg: units::round3(acc.volume),
    })
    .collect()
}

#[derive(Default)]
struct PrAcc {
    best_1rm: f64,
    best_weight: f64,
    best_reps: f64,
}

/// All-history personal records per exercise via the Epley estimate
/// `1RM = weight * (1 + reps / 30)`, restricted to rows carrying both a
/// weight and a rep count. Best 1RM, best weight, and best reps are
/// tracked independently. Sorted descending by estimated 1RM.
pub fn personal_records(rows: &[StrengthSetRow]) -> Vec<PersonalRecordRow> {
    let groups = fold_groups(
        rows,
        |r| {
            (r.weight_kg.is_some() && r.reps.is_some()).then(|| r.exercise.clone())
        },
        |acc: &mut PrAcc, r| {
            // Key guard guarantees both fields are present.
            let (Some(w), Some(reps)) = (r.weight_kg, r.reps) else {
                return;
            };
            let est = w * (1.0 + reps / 30.0);
            acc.best_1rm = acc.best_1rm.max(est);
            acc.best_weight = acc.best_weight.max(w);
            acc.best_reps = acc.best_reps.max(reps);
        },
    );

    let mut prs: Vec<PersonalRecordRow> = groups
        .into_iter()
        .map(|(exercise, acc)| PersonalRecordRow {
            exercise,
            best_1rm_kg: units::round3(acc.best_1rm),
            best_weight_kg: acc.best_weight,
            best_reps: acc.best_reps,
        })
        .collect();
    prs.sort_by(|a, b| {
        b.best_1rm_kg
            .partial_cmp(&a.best_1rm_kg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    prs
}
