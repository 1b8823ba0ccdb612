//! Row types for every stage of the pipeline, plus the registry of
//! recognized health-record types.

use serde::{Deserialize, Serialize};

use crate::timestamp::Stamp;

/// Health-record types the extractor knows by friendly key.
///
/// Each variant maps to the HK identifier Apple writes in `export.xml`.
/// Callers may also pass raw HK identifiers; see [`HealthMetric::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealthMetric {
    BodyMass,
    Bmi,
    BodyFatPct,
    LeanMass,
    HeartRate,
    RestingHr,
    Vo2Max,
    StepCount,
    DistanceWalkingRunning,
    ActiveEnergy,
    BasalEnergy,
}

impl HealthMetric {
    /// Default extraction allow-list.
    pub const DEFAULT_EXTRACT: &'static [HealthMetric] = &[
        Self::BodyMass,
        Self::HeartRate,
        Self::StepCount,
        Self::DistanceWalkingRunning,
        Self::ActiveEnergy,
    ];

    /// The four body-composition metrics the daily health table reports.
    pub const BODY_COMPOSITION: &'static [HealthMetric] = &[
        Self::BodyMass,
        Self::Bmi,
        Self::BodyFatPct,
        Self::LeanMass,
    ];

    /// The HK identifier naming this type in the source export.
    pub fn hk_identifier(self) -> &'static str {
        match self {
            Self::BodyMass => "HKQuantityTypeIdentifierBodyMass",
            Self::Bmi => "HKQuantityTypeIdentifierBodyMassIndex",
            Self::BodyFatPct => "HKQuantityTypeIdentifierBodyFatPercentage",
            Self::LeanMass => "HKQuantityTypeIdentifierLeanBodyMass",
            Self::HeartRate => "HKQuantityTypeIdentifierHeartRate",
            Self::RestingHr => "HKQuantityTypeIdentifierRestingHeartRate",
            Self::Vo2Max => "HKQuantityTypeIdentifierVO2Max",
            Self::StepCount => "HKQuantityTypeIdentifierStepCount",
            Self::DistanceWalkingRunning => {
                "HKQuantityTypeIdentifierDistanceWalkingRunning"
            }
            Self::ActiveEnergy => "HKQuantityTypeIdentifierActiveEnergyBurned",
            Self::BasalEnergy => "HKQuantityTypeIdentifierBasalEnergyBurned",
        }
    }

    /// Look up a friendly key (`body_mass`, `heart_rate`, ...).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "body_mass" => Some(Self::BodyMass),
            "bmi" => Some(Self::Bmi),
            "body_fat_pct" => Some(Self::BodyFatPct),
            "lean_mass" => Some(Self::LeanMass),
            "heart_rate" => Some(Self::HeartRate),
            "resting_hr" => Some(Self::RestingHr),
            "vo2max" => Some(Self::Vo2Max),
            "step_count" => Some(Self::StepCount),
            "distance_walking_running" => Some(Self::DistanceWalkingRunning),
            "active_energy" => Some(Self::ActiveEnergy),
            "basal_energy" => Some(Self::BasalEnergy),
            _ => None,
        }
    }

    /// Resolve a friendly key to its HK identifier; unknown keys pass
    /// through verbatim so raw HK identifiers keep working.
    pub fn resolve(key: &str) -> String {
        Self::from_key(key)
            .map(|m| m.hk_identifier().to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

/// One typed observation extracted from the health export.
#[derive(Clone, Debug)]
pub struct QuantityRecord {
    /// HK identifier of the record type.
    pub kind: String,
    pub value: f64,
    pub unit: Option<String>,
    pub start: Stamp,
    pub end: Stamp,
    pub source_name: Option<String>,
    pub source_version: Option<String>,
    pub device: Option<String>,
}

/// One workout session from the health export. Duration/distance/energy
/// stay in their original units; workouts are not normalized further.
#[derive(Clone, Debug)]
pub struct WorkoutRecord {
    pub activity_type: String,
    pub duration: Option<f64>,
    pub duration_unit: Option<String>,
    pub distance: Option<f64>,
    pub distance_unit: Option<String>,
    pub energy: Option<f64>,
    pub energy_unit: Option<String>,
    pub start: Stamp,
    pub end: Stamp,
    pub source_name: Option<String>,
    pub source_version: Option<String>,
    pub device: Option<String>,
}

/// One row per calendar day in the daily health table. Absent metrics are
/// `None`, never zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRow {
    pub date: String,
    pub weight_lb: Option<f64>,
    pub bmi: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub lean_mass_lb: Option<f64>,
}

/// One normalized strength-log row (one logged set, or a non-set row such
/// as a note line that failed rep parsing).
#[derive(Clone, Debug, PartialEq)]
pub struct StrengthSetRow {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Raw date cell, kept for the distinct-workout count.
    pub started: String,
    pub exercise: String,
    pub set_index: Option<f64>,
    pub weight_kg: Option<f64>,
    pub reps: Option<f64>,
    pub volume_kg: Option<f64>,
    pub duration_min: Option<f64>,
    pub group: Option<String>,
}

impl StrengthSetRow {
    /// A row counts as a set iff reps parsed.
    pub fn is_set(&self) -> bool {
        self.reps.is_some()
    }
}

/// Daily strength totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyStrengthRow {
    pub date: String,
    pub volume_kg: f64,
    pub sets: u32,
    pub reps: f64,
    pub exercises: u32,
    pub workout_count: u32,
    pub duration_min: f64,
}

/// Per-exercise-per-day totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExerciseDayRow {
    pub date: String,
    pub exercise: String,
    pub top_set_kg: Option<f64>,
    pub sets: u32,
    pub reps: f64,
    pub volume_kg: f64,
}

/// All-history personal records for one exercise (best estimated 1RM,
/// best weight, best reps tracked independently).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonalRecordRow {
    pub exercise: String,
    pub best_1rm_kg: f64,
    pub best_weight_kg: f64,
    pub best_reps: f64,
}

/// Outer join of the daily health and daily strength series on `date`.
/// A date present in only one source has `None` for the other's fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedDailyRow {
    pub date: String,
    pub weight_lb: Option<f64>,
    pub bmi: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub lean_mass_lb: Option<f64>,
    pub volume_kg: Option<f64>,
    pub sets: Option<u32>,
    pub reps: Option<f64>,
    pub exercises: Option<u32>,
    pub workout_count: Option<u32>,
    pub duration_min: Option<f64>,
    pub volume_lb: Option<f64>,
}
