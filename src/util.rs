pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// How far the most recent value sits from the mean of all values, in
/// standard deviations. `lower_is_better` flips the sign (e.g. for times).
///
/// Scaled as a percentage of one deviation, rounded to 3 decimals first.
/// Zero with fewer than two values or no spread.
pub fn progress_score(data: &[f64], lower_is_better: bool) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let (Some(data_mean), Some(dev), Some(last)) = (mean(data), std_dev(data), data.last()) else {
        return 0.0;
    };
    if dev == 0.0 {
        return 0.0;
    }

    let direction = if lower_is_better { -1.0 } else { 1.0 };
    let z = (last - data_mean) / dev * direction;
    round_to(z, 3) * 100.0
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
