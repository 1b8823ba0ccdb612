//! Outer join of the two daily series.

use std::collections::BTreeMap;

use crate::types::{CombinedDailyRow, DailyMetricRow, DailyStrengthRow};
use crate::units;

/// Outer-join the daily health and daily strength series on calendar
/// date, ascending. A date present in only one source keeps `None` for
/// the other's fields; no interpolation or gap-filling. `volume_lb` is
/// derived from `volume_kg` for consumers that prefer pounds.
pub fn merge_daily(
    health: &[DailyMetricRow],
    strength: &[DailyStrengthRow],
) -> Vec<CombinedDailyRow> {
    let mut combined: BTreeMap<String, CombinedDailyRow> = BTreeMap::new();

    let blank = |date: &str| CombinedDailyRow {
        date: date.to_string(),
        weight_lb: None,
        bmi: None,
        body_fat_pct: None,
        lean_mass_lb: None,
        volume_kg: None,
        sets: None,
        reps: None,
        exercises: None,
        workout_count: None,
        duration_min: None,
        volume_lb: None,
    };

    for h in health {
        let row = combined
            .entry(h.date.clone())
            .or_insert_with(|| blank(&h.date));
        row.weight_lb = h.weight_lb;
        row.bmi = h.bmi;
        row.body_fat_pct = h.body_fat_pct;
        row.lean_mass_lb = h.lean_mass_lb;
    }

    for s in strength {
        let row = combined
            .entry(s.date.clone())
            .or_insert_with(|| blank(&s.date));
        row.volume_kg = Some(s.volume_kg);
        row.sets = Some(s.sets);
        row.reps = Some(s.reps);
        row.exercises = Some(s.exercises);
        row.workout_count = Some(s.workout_count);
        row.duration_min = Some(s.duration_min);
        row.volume_lb = Some(units::round3(s.volume_kg * units::KG_TO_LB));
    }

    combined.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health_row(date: &str, weight: f64) -> DailyMetricRow {
        DailyMetricRow {
            date: date.to_string(),
            weight_lb: Some(weight),
            bmi: None,
            body_fat_pct: None,
            lean_mass_lb: None,
        }
    }

    fn strength_row(date: &str, volume: f64) -> DailyStrengthRow {
        DailyStrengthRow {
            date: date.to_string(),
            volume_kg: volume,
            sets: 3,
            reps: 15.0,
            exercises: 1,
            workout_count: 1,
            duration_min: 45.0,
        }
    }

    #[test]
    fn outer_join_keeps_one_sided_dates() {
        let combined = merge_daily(
            &[health_row("2025-02-01", 180.0)],
            &[strength_row("2025-02-02", 1500.0)],
        );
        assert_eq!(combined.len(), 2);

        assert_eq!(combined[0].date, "2025-02-01");
        assert_eq!(combined[0].weight_lb, Some(180.0));
        assert_eq!(combined[0].volume_kg, None);
        assert_eq!(combined[0].sets, None);

        assert_eq!(combined[1].date, "2025-02-02");
        assert_eq!(combined[1].weight_lb, None);
        assert_eq!(combined[1].volume_kg, Some(1500.0));
    }

    #[test]
    fn shared_dates_merge_both_sides() {
        let combined = merge_daily(
            &[health_row("2025-02-01", 180.0)],
            &[strength_row("2025-02-01", 1000.0)],
        );
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].weight_lb, Some(180.0));
        assert_eq!(combined[0].volume_kg, Some(1000.0));
    }

    #[test]
    fn volume_lb_derived_with_mass_constant() {
        let combined = merge_daily(&[], &[strength_row("2025-02-01", 100.0)]);
        assert_eq!(combined[0].volume_lb, Some(220.462));
    }

    #[test]
    fn output_sorted_ascending_by_date() {
        let combined = merge_daily(
            &[health_row("2025-02-03", 180.0), health_row("2025-01-31", 181.0)],
            &[strength_row("2025-02-01", 900.0)],
        );
        let dates: Vec<&str> = combined.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01-31", "2025-02-01", "2025-02-03"]);
    }
}
