/// Speed observed at a whole second of a running session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub t: f64,
    pub cpm: f64,
}

impl SpeedSample {
    pub fn new(t: f64, cpm: f64) -> Self {
        Self { t, cpm }
    }
}

impl From<(f64, f64)> for SpeedSample {
    fn from(v: (f64, f64)) -> Self {
        SpeedSample { t: v.0, cpm: v.1 }
    }
}

impl From<SpeedSample> for (f64, f64) {
    fn from(p: SpeedSample) -> Self {
        (p.t, p.cpm)
    }
}

/// Append a sample, replacing the last one if it was taken at the same second
pub fn push_sample(series: &mut Vec<SpeedSample>, sample: SpeedSample) {
    match series.last_mut() {
        Some(last) if last.t == sample.t => *last = sample,
        _ => series.push(sample),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_conversions() {
        let s: SpeedSample = (2.0, 180.0).into();
        assert_eq!(s, SpeedSample::new(2.0, 180.0));
        let t: (f64, f64) = s.into();
        assert_eq!(t, (2.0, 180.0));
    }

    #[test]
    fn test_push_sample_replaces_same_second() {
        let mut series = vec![];
        push_sample(&mut series, SpeedSample::new(1.0, 60.0));
        push_sample(&mut series, SpeedSample::new(1.0, 120.0));
        push_sample(&mut series, SpeedSample::new(2.0, 90.0));

        assert_eq!(
            series,
            vec![SpeedSample::new(1.0, 120.0), SpeedSample::new(2.0, 90.0)]
        );
    }
}
