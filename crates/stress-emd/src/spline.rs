//! Natural cubic spline envelopes
//!
//! Envelopes are interpolated through the extrema of a signal. To limit the
//! swing of the spline at the ends, the first and last extrema are mirrored
//! about the signal boundaries before fitting.

/// Extrema mirrored about each boundary
const MIRRORED_POINTS: usize = 2;

/// Natural cubic spline through strictly increasing knots
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline (zero curvature at both ends)
    ///
    /// Returns `None` for fewer than two knots, mismatched lengths or
    /// non-increasing abscissae.
    pub fn natural(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let k = xs.len();
        if k < 2 || ys.len() != k || xs.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let mut m = vec![0.0; k];
        if k > 2 {
            let inner = k - 2;
            let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
            let mut diag = vec![0.0; inner];
            let mut upper = vec![0.0; inner];
            let mut rhs = vec![0.0; inner];
            for r in 0..inner {
                let i = r + 1;
                diag[r] = 2.0 * (h[i - 1] + h[i]);
                upper[r] = h[i];
                rhs[r] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
            }

            // Thomas algorithm; the sub-diagonal of row r is h[r]
            for r in 1..inner {
                let w = h[r] / diag[r - 1];
                diag[r] -= w * upper[r - 1];
                rhs[r] -= w * rhs[r - 1];
            }
            m[inner] = rhs[inner - 1] / diag[inner - 1];
            for r in (0..inner - 1).rev() {
                m[r + 1] = (rhs[r] - upper[r] * m[r + 2]) / diag[r];
            }
        }

        Some(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        })
    }

    fn eval_segment(&self, j: usize, x: f64) -> f64 {
        let (x0, x1) = (self.xs[j], self.xs[j + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - x, x - x0);
        self.m[j] * a * a * a / (6.0 * h)
            + self.m[j + 1] * b * b * b / (6.0 * h)
            + (self.ys[j] / h - self.m[j] * h / 6.0) * a
            + (self.ys[j + 1] / h - self.m[j + 1] * h / 6.0) * b
    }

    /// Evaluate at `x`; outside the knot range the end segments are extended
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 2;
        let j = match self.xs.partition_point(|&k| k <= x) {
            0 => 0,
            p => (p - 1).min(last),
        };
        self.eval_segment(j, x)
    }

    /// Evaluate at the integer positions `0..n`
    pub fn sample(&self, n: usize) -> Vec<f64> {
        let last = self.xs.len() - 2;
        let mut j = 0;
        (0..n)
            .map(|i| {
                let x = i as f64;
                while j < last && x > self.xs[j + 1] {
                    j += 1;
                }
                self.eval_segment(j, x)
            })
            .collect()
    }
}

/// Spline envelope through `values[idx]` for the given extremum indices
///
/// Returns `None` when `indices` is empty.
pub fn envelope(values: &[f64], indices: &[usize]) -> Option<Vec<f64>> {
    let n = values.len();
    if indices.is_empty() || n < 2 {
        return None;
    }
    let end = (n - 1) as f64;
    let take = indices.len().min(MIRRORED_POINTS);

    let mut xs = Vec::with_capacity(indices.len() + 2 * take);
    let mut ys = Vec::with_capacity(xs.capacity());
    for &i in indices[..take].iter().rev() {
        xs.push(-(i as f64));
        ys.push(values[i]);
    }
    for &i in indices {
        xs.push(i as f64);
        ys.push(values[i]);
    }
    for &i in indices[indices.len() - take..].iter().rev() {
        xs.push(2.0 * end - i as f64);
        ys.push(values[i]);
    }

    CubicSpline::natural(&xs, &ys).map(|s| s.sample(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_interpolates_knots() {
        let xs = [0.0, 1.0, 2.5, 4.0, 7.0];
        let ys = [1.0, -2.0, 0.5, 3.0, -1.0];
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_abs_diff_eq!(s.eval(*x), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_stays_linear() {
        let xs = [0.0, 2.0, 3.0, 7.0, 9.0];
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x - 1.0).collect();
        let s = CubicSpline::natural(&xs, &ys).unwrap();
        for (i, v) in s.sample(10).iter().enumerate() {
            assert_abs_diff_eq!(*v, 0.5 * i as f64 - 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_two_knots_is_a_line() {
        let s = CubicSpline::natural(&[0.0, 4.0], &[0.0, 8.0]).unwrap();
        assert_abs_diff_eq!(s.eval(1.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(6.0), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_knots() {
        assert!(CubicSpline::natural(&[0.0], &[1.0]).is_none());
        assert!(CubicSpline::natural(&[0.0, 0.0], &[1.0, 2.0]).is_none());
        assert!(CubicSpline::natural(&[0.0, 1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_envelope_passes_through_extrema() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin()).collect();
        let maxima: Vec<usize> = (1..49)
            .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1])
            .collect();
        let env = envelope(&values, &maxima).unwrap();
        assert_eq!(env.len(), values.len());
        for &i in &maxima {
            assert_abs_diff_eq!(env[i], values[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_extremum_envelope_is_flat() {
        let values = [0.0, 0.0, 2.0, 0.0, 0.0];
        let env = envelope(&values, &[2]).unwrap();
        for v in env {
            assert_abs_diff_eq!(v, 2.0, epsilon = 1e-12);
        }
        assert!(envelope(&values, &[]).is_none());
    }
}
