/// Compute X (seconds or test number) and Y bounds for a line chart
pub fn compute_chart_params(coords: &[(f64, f64)]) -> (f64, f64) {
    let mut highest = 0.0;
    for &(_, y) in coords {
        if y > highest {
            highest = y;
        }
    }

    let mut overall = match coords.last() {
        Some(x) => x.0,
        None => 1.0,
    };
    if overall < 1.0 {
        overall = 1.0;
    }

    (overall, highest.round())
}

/// Bounds for a y axis that should not start at zero, padded by a tenth of the range
pub fn padded_bounds(values: &[f64]) -> [f64; 2] {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let pad = ((max - min) / 10.0).max(1.0);
    [(min - pad).max(0.0).floor(), (max + pad).ceil()]
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
