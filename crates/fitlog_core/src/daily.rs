//! Daily reduction of health observations.
//!
//! Collapses normalized body-composition records into one row per
//! calendar day. Multiple same-day readings of one metric reduce to their
//! arithmetic mean, so the result is identical for any input order — a
//! last-value-wins rule would depend on stream order, which the extractor
//! does not guarantee.

use std::collections::BTreeMap;

use crate::types::{DailyMetricRow, HealthMetric, QuantityRecord};
use crate::units;

const WEIGHT: usize = 0;
const BMI: usize = 1;
const BODY_FAT: usize = 2;
const LEAN: usize = 3;

#[derive(Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    n: u32,
}

impl MeanAcc {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / f64::from(self.n))
    }
}

fn slot(kind: &str) -> Option<usize> {
    if kind == HealthMetric::BodyMass.hk_identifier() {
        Some(WEIGHT)
    } else if kind == HealthMetric::Bmi.hk_identifier() {
        Some(BMI)
    } else if kind == HealthMetric::BodyFatPct.hk_identifier() {
        Some(BODY_FAT)
    } else if kind == HealthMetric::LeanMass.hk_identifier() {
        Some(LEAN)
    } else {
        None
    }
}

/// Reduce quantity records to one [`DailyMetricRow`] per calendar date,
/// ascending. Records of types outside the four body-composition metrics
/// are ignored; absent metrics stay `None`.
pub fn reduce_daily(records: impl IntoIterator<Item = QuantityRecord>) -> Vec<DailyMetricRow> {
    let mut days: BTreeMap<String, [MeanAcc; 4]> = BTreeMap::new();

    for rec in records {
        let Some(slot) = slot(&rec.kind) else {
            continue;
        };
        let normalized = match slot {
            WEIGHT | LEAN => units::mass_to_lb(rec.value, rec.unit.as_deref()),
            BODY_FAT => units::body_fat_pct(rec.value),
            _ => units::round3(rec.value),
        };
        days.entry(rec.start.date.clone()).or_default()[slot].push(normalized);
    }

    days.into_iter()
        .map(|(date, accs)| DailyMetricRow {
            date,
            weight_lb: accs[WEIGHT].mean().map(units::round3),
            bmi: accs[BMI].mean().map(units::round3),
            body_fat_pct: accs[BODY_FAT].mean().map(units::round4),
            lean_mass_lb: accs[LEAN].mean().map(units::round3),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp;
    use crate::types::HealthMetric;

    fn record(kind: HealthMetric, value: f64, unit: &str, stamp: &str) -> QuantityRecord {
        let start = timestamp::normalize(stamp);
        QuantityRecord {
            kind: kind.hk_identifier().to_string(),
            value,
            unit: Some(unit.to_string()),
            start: start.clone(),
            end: start,
            source_name: None,
            source_version: None,
            device: None,
        }
    }

    #[test]
    fn one_row_per_date_with_absent_metrics_null() {
        let rows = reduce_daily(vec![
            record(HealthMetric::BodyMass, 83.0, "kg", "2025-03-01 08:00:00"),
            record(HealthMetric::Bmi, 24.2, "count", "2025-03-02 08:00:00"),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2025-03-01");
        assert!(rows[0].weight_lb.is_some());
        assert_eq!(rows[0].bmi, None);
        assert_eq!(rows[1].bmi, Some(24.2));
        assert_eq!(rows[1].weight_lb, None);
    }

    #[test]
    fn same_day_readings_reduce_to_mean() {
        // Already in pounds, so no conversion noise in the expectation.
        let rows = reduce_daily(vec![
            record(HealthMetric::BodyMass, 180.0, "lb", "2025-03-01 07:00:00"),
            record(HealthMetric::BodyMass, 182.0, "lb", "2025-03-01 21:00:00"),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weight_lb, Some(181.0));
    }

    #[test]
    fn mean_is_order_independent() {
        let a = vec![
            record(HealthMetric::BodyMass, 80.0, "kg", "2025-03-01 07:00:00"),
            record(HealthMetric::BodyMass, 82.5, "kg", "2025-03-01 12:00:00"),
            record(HealthMetric::BodyMass, 81.1, "kg", "2025-03-01 21:00:00"),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(reduce_daily(a), reduce_daily(b));
    }

    #[test]
    fn non_body_metrics_are_ignored() {
        let rows = reduce_daily(vec![record(
            HealthMetric::HeartRate,
            61.0,
            "count/min",
            "2025-03-01 07:00:00",
        )]);
        assert!(rows.is_empty());
    }

    #[test]
    fn body_fat_fraction_normalizes_to_percent() {
        let rows = reduce_daily(vec![record(
            HealthMetric::BodyFatPct,
            0.241,
            "fraction",
            "2025-03-01 07:00:00",
        )]);
        assert_eq!(rows[0].body_fat_pct, Some(24.1));
    }
}
