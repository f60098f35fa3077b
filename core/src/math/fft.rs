use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Forward FFT plan of a fixed size, used to evaluate polynomial responses.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real sequence, zero-padded (or truncated) to the plan size.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&value| Complex64::new(value, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::zero());

        self.fft.process(&mut buffer);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_helper_returns_plan_length() {
        let helper = FftHelper::new(8);
        let output = helper.forward(&[1.0, 0.0, -1.0]);
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn dc_bin_is_the_sum() {
        let helper = FftHelper::new(4);
        let output = helper.forward(&[1.0, 2.0, 3.0, 4.0]);
        assert!((output[0].re - 10.0).abs() < 1e-12);
        assert!(output[0].im.abs() < 1e-12);
    }
}
