//! Unit normalization for recognized quantities.
//!
//! Canonical units are pounds for masses and percent for body fat; BMI is
//! dimensionless and passes through. Outputs are rounded to a fixed
//! precision so repeated runs produce byte-identical tables.

/// Kilograms to pounds.
pub const KG_TO_LB: f64 = 2.204_622_621_8;

/// Pounds to kilograms.
pub const LB_TO_KG: f64 = 0.453_592_37;

/// Body-fat values at or below this are treated as a fraction (0-1) and
/// scaled to percent; values above it are assumed to already be percent.
///
/// Known design risk: this threshold disambiguates two observed export
/// conventions and has only been validated against sample exports. A true
/// body-fat reading between 1.5% and 150% of a fraction cannot occur, but
/// revalidate against real data before trusting it elsewhere.
pub const BODY_FAT_FRACTION_MAX: f64 = 1.5;

/// Round to 3 decimal places (masses, volumes).
pub fn round3(v: f64) -> f64 {
    (v * 1_000.0).round() / 1_000.0
}

/// Round to 4 decimal places (body-fat percent).
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Convert a mass reading to pounds. Only values the source labels as
/// kilograms are converted; anything else passes through untouched.
pub fn mass_to_lb(value: f64, unit: Option<&str>) -> f64 {
    match unit {
        Some(u) if u.trim().eq_ignore_ascii_case("kg") => round3(value * KG_TO_LB),
        _ => round3(value),
    }
}

/// Convert pounds to kilograms (strength-log weights).
pub fn lb_to_kg(value: f64) -> f64 {
    value * LB_TO_KG
}

/// Normalize a body-fat reading to percent, fraction-aware.
pub fn body_fat_pct(value: f64) -> f64 {
    if value <= BODY_FAT_FRACTION_MAX {
        round4(value * 100.0)
    } else {
        round4(value)
    }
}
