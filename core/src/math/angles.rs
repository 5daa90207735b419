/// Folds any finite angle into [0, 360).
pub fn normalize_360(angle_deg: f64) -> f64 {
    let folded = angle_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Signed offset of `target_deg` from `reference_deg`, folded into [-180, 180].
pub fn relative_deg(target_deg: f64, reference_deg: f64) -> f64 {
    let mut delta = normalize_360(target_deg) - normalize_360(reference_deg);
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}
