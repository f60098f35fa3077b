/// Piecewise-linear interpolation of `(xs, ys)` at each target.
///
/// `xs` must be strictly increasing. Targets outside `[xs[0], xs[last]]` take
/// the nearest edge value.
pub fn interp_linear(xs: &[f64], ys: &[f64], targets: &[f64]) -> Vec<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return vec![f64::NAN; targets.len()];
    }
    let last = xs.len() - 1;

    targets
        .iter()
        .map(|&target| {
            let upper = xs.partition_point(|&x| x <= target);
            if upper == 0 {
                ys[0]
            } else if upper > last {
                ys[last]
            } else {
                let (x0, x1) = (xs[upper - 1], xs[upper]);
                let (y0, y1) = (ys[upper - 1], ys[upper]);
                y0 + (y1 - y0) * (target - x0) / (x1 - x0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_knots() {
        let values = interp_linear(&[0.0, 0.3, 1.1], &[1.0, 2.0, 4.0], &[0.3, 1.0]);
        assert_eq!(values[0], 2.0);
        assert!((values[1] - 3.75).abs() < 1e-12);
    }

    #[test]
    fn clamps_outside_the_knots() {
        let values = interp_linear(&[1.0, 2.0], &[10.0, 20.0], &[0.0, 2.0, 3.0]);
        assert_eq!(values, vec![10.0, 20.0, 20.0]);
    }
}
