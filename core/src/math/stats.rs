pub struct StatsHelper;

impl StatsHelper {
    /// Root-mean-square over the finite samples.
    pub fn rms(samples: &[f64]) -> f64 {
        let (sum_sq, count) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, n), &v| (sum + v * v, n + 1));
        if count == 0 {
            return 0.0;
        }
        (sum_sq / count as f64).sqrt()
    }

    /// Mean over the finite samples, `None` when there are none.
    pub fn mean(samples: &[f64]) -> Option<f64> {
        let (sum, count) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, n), &v| (sum + v, n + 1));
        (count > 0).then(|| sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_a_doppler_swing() {
        assert!((StatsHelper::rms(&[0.25, -0.25, 0.25, -0.25]) - 0.25).abs() < 1e-15);
        assert!((StatsHelper::rms(&[3.0, 4.0]) - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn statistics_skip_missing_samples() {
        assert_eq!(StatsHelper::mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(StatsHelper::mean(&[f64::NAN]), None);
        assert_eq!(StatsHelper::rms(&[f64::NAN, 3.0]), 3.0);
        assert_eq!(StatsHelper::rms(&[f64::NAN, f64::INFINITY]), 0.0);
        assert_eq!(StatsHelper::rms(&[]), 0.0);
    }
}
