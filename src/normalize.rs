//! Category Normalizer.
//!
//! Maps a raw signed sum of factor contributions onto the bounded
//! `[0, category_max]` scale of one scoring table.

/// Share of `category_max` a category starts from before any adjustment.
pub const ADJUSTED_BASE_RATIO: f64 = 0.45;

/// Multiplier applied to the summed adjustments.
pub const ADJUSTMENT_AMPLIFIER: f64 = 2.2;

/// Linear map from `[-max_raw, max_raw]` onto `[0, category_max]`.
///
/// A raw sum of zero lands on `category_max / 2`. Sums beyond the raw bounds
/// saturate instead of extrapolating. Non-finite or non-positive bounds yield
/// the neutral midpoint (or zero for a non-positive `category_max`).
pub fn normalize_to_category(raw_sum: f64, max_raw: f64, category_max: f64) -> f64 {
    if !(category_max > 0.0) {
        return 0.0;
    }
    if !(max_raw > 0.0) || raw_sum.is_nan() {
        return category_max / 2.0;
    }
    let clamped = raw_sum.clamp(-max_raw, max_raw);
    category_max * (clamped / max_raw + 1.0) / 2.0
}

/// Sums `scores` first, then normalizes the total.
pub fn sum_and_normalize(scores: &[f64], max_raw: f64, category_max: f64) -> f64 {
    normalize_to_category(scores.iter().sum(), max_raw, category_max)
}

/// Pessimistic prior plus amplified adjustments, clamped to `[0, category_max]`.
///
/// Adjustments are raw factor values; they are converted to category points
/// at the linear slope `category_max / (2 * max_raw)` before amplification.
/// A non-positive `max_raw` leaves the prior untouched.
pub fn calculate_adjusted_score(category_max: f64, adjustments: &[f64], max_raw: f64) -> f64 {
    if !(category_max > 0.0) {
        return 0.0;
    }
    let base = ADJUSTED_BASE_RATIO * category_max;
    if !(max_raw > 0.0) {
        return base;
    }
    let slope = category_max / (2.0 * max_raw);
    let adjustment = adjustments.iter().sum::<f64>() * slope * ADJUSTMENT_AMPLIFIER;
    let score = base + adjustment;
    if score.is_nan() {
        return base;
    }
    score.clamp(0.0, category_max)
}
