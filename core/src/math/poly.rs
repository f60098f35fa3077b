use num_complex::Complex64;

/// Monic polynomial with the given roots, highest power first.
pub fn poly_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

pub fn product(values: impl IntoIterator<Item = Complex64>) -> Complex64 {
    values
        .into_iter()
        .fold(Complex64::new(1.0, 0.0), |acc, value| acc * value)
}
