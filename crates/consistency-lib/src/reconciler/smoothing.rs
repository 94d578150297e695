//! Smoothing and scoring primitives
//!
//! Every ratio here has a previous value as denominator; a previous value of
//! zero short-circuits to a defined constant instead of producing NaN.

/// Damp a large run-to-run swing in a savings estimate
///
/// Returns `new_value` unchanged when there is no previous figure or the
/// relative move is within `max_variation`; otherwise blends
/// `smoothing_factor` of the new value with the remainder of the old one.
pub fn smooth_savings(
    new_value: f64,
    old_value: f64,
    max_variation: f64,
    smoothing_factor: f64,
) -> f64 {
    if old_value == 0.0 {
        return new_value;
    }

    let variation = (new_value - old_value).abs() / old_value;
    if variation <= max_variation {
        return new_value;
    }

    new_value * smoothing_factor + old_value * (1.0 - smoothing_factor)
}

/// Blend two confidences, weighting the higher one by `bias`
pub fn smooth_confidence(new_confidence: f64, old_confidence: f64, bias: f64) -> f64 {
    let high = new_confidence.max(old_confidence);
    let low = new_confidence.min(old_confidence);
    high * bias + low * (1.0 - bias)
}

/// Percent change between two aggregate savings figures (0 when the previous total is 0)
pub fn savings_variation(new_total: f64, previous_total: f64) -> f64 {
    if previous_total == 0.0 {
        return 0.0;
    }
    (new_total - previous_total).abs() / previous_total * 100.0
}

/// Composite 0-1 stability metric
///
/// Averages a variation sub-score (summed percent variations over
/// `variation_normalizer`) and a churn sub-score (changed count over
/// `change_normalizer`), each clamped at zero.
pub fn stability_score(
    storage_variation: f64,
    compute_variation: f64,
    recommendations_changed: usize,
    variation_normalizer: f64,
    change_normalizer: f64,
) -> f64 {
    let variation_score =
        (1.0 - (storage_variation + compute_variation) / variation_normalizer).max(0.0);
    let change_score = (1.0 - recommendations_changed as f64 / change_normalizer).max(0.0);

    (variation_score + change_score) / 2.0
}
