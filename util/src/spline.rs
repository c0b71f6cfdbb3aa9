//! # Cubic spline
//!
//! A natural cubic spline through a set of knots `(x_i, y_i)` with strictly
//! increasing `x`. The curve passes through every knot, is twice continuously
//! differentiable, and has zero curvature at both ends. Outside the knot range
//! the spline is extended linearly using the slope at the nearest end knot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A natural cubic spline.
///
/// On the interval `[x_i, x_(i+1)]` the curve is
/// `a_i + b_i dx + c_i dx^2 + d_i dx^3` with `dx = x - x_i`.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while fitting a spline.
#[derive(Debug, Error, PartialEq)]
pub enum SplineError {
    #[error("Knot coordinate arrays have different lengths ({0} x values, {1} y values)")]
    LengthMismatch(usize, usize),

    #[error("At least 2 knots are required to fit a spline, found {0}")]
    TooFewKnots(usize),

    #[error("Knot x values must be strictly increasing, knot {0} is not")]
    NotStrictlyIncreasing(usize),

    #[error("Knot {0} is not finite")]
    NonFiniteKnot(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a natural cubic spline through the given knots.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch(x.len(), y.len()));
        }

        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewKnots(n));
        }

        for i in 0..n {
            if !x[i].is_finite() || !y[i].is_finite() {
                return Err(SplineError::NonFiniteKnot(i));
            }
            if i > 0 && x[i] <= x[i - 1] {
                return Err(SplineError::NotStrictlyIncreasing(i));
            }
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let a = y.to_vec();

        // Tridiagonal system for the quadratic coefficients, solved with the
        // Thomas algorithm. The natural end conditions fix c_0 = c_(n-1) = 0.
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];
        for i in 1..n - 1 {
            let alpha = 3.0 * (a[i + 1] - a[i]) / h[i] - 3.0 * (a[i] - a[i - 1]) / h[i - 1];
            let l = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l;
            z[i] = (alpha - h[i - 1] * z[i - 1]) / l;
        }

        let mut b = vec![0.0; n];
        let mut c = vec![0.0; n];
        let mut d = vec![0.0; n];
        for j in (0..n - 1).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (a[j + 1] - a[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }

        // Slope at the last knot, used for extrapolation past the end
        let hl = h[n - 2];
        b[n - 1] = b[n - 2] + 2.0 * c[n - 2] * hl + 3.0 * d[n - 2] * hl * hl;

        Ok(Self { x: x.to_vec(), a, b, c, d })
    }

    /// Evaluate the spline at `t`.
    pub fn eval(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        if self.is_outside(t) {
            return self.a[i] + self.b[i] * dx;
        }
        self.a[i] + self.b[i] * dx + self.c[i] * dx * dx + self.d[i] * dx * dx * dx
    }

    /// Evaluate the first derivative of the spline at `t`.
    pub fn eval_deriv(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        if self.is_outside(t) {
            return self.b[i];
        }
        self.b[i] + 2.0 * self.c[i] * dx + 3.0 * self.d[i] * dx * dx
    }

    /// Evaluate the second derivative of the spline at `t`.
    pub fn eval_second_deriv(&self, t: f64) -> f64 {
        let (i, dx) = self.locate(t);
        if self.is_outside(t) {
            return 0.0;
        }
        2.0 * self.c[i] + 6.0 * self.d[i] * dx
    }

    fn is_outside(&self, t: f64) -> bool {
        t < self.x[0] || t > self.x[self.x.len() - 1]
    }

    /// Find the polynomial piece for `t` and the offset into it.
    ///
    /// Points before the first knot use piece 0, points after the last knot
    /// use the last knot itself (whose only meaningful coefficients are the
    /// value and slope).
    fn locate(&self, t: f64) -> (usize, f64) {
        let last = self.x.len() - 1;
        let i = if t > self.x[last] {
            last
        } else {
            // Index of the last knot at or before t, limited to a valid piece
            self.x
                .partition_point(|&k| k <= t)
                .saturating_sub(1)
                .min(last - 1)
        };
        (i, t - self.x[i])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-9;

    fn knots() -> (Vec<f64>, Vec<f64>) {
        (
            vec![-1.0, 0.0, 30.0, 60.0, 90.0],
            vec![0.02, 0.0, 1.5, 3.8, 4.0],
        )
    }

    #[test]
    fn test_passes_through_knots() {
        let (x, y) = knots();
        let s = CubicSpline::new(&x, &y).unwrap();

        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((s.eval(*xi) - yi).abs() < TOL, "knot ({}, {})", xi, yi);
        }
    }

    #[test]
    fn test_c2_continuity_at_interior_knots() {
        let (x, y) = knots();
        let s = CubicSpline::new(&x, &y).unwrap();
        let eps = 1e-7;

        for xi in &x[1..x.len() - 1] {
            let d1_l = s.eval_deriv(xi - eps);
            let d1_r = s.eval_deriv(xi + eps);
            let d2_l = s.eval_second_deriv(xi - eps);
            let d2_r = s.eval_second_deriv(xi + eps);
            assert!((d1_l - d1_r).abs() < 1e-5);
            assert!((d2_l - d2_r).abs() < 1e-5);
        }

        // Natural end conditions
        assert!(s.eval_second_deriv(x[0]).abs() < 1e-9);
        assert!(s.eval_second_deriv(x[x.len() - 1] - 1e-12).abs() < 1e-6);
    }

    #[test]
    fn test_reproduces_straight_line() {
        let x = vec![0.0, 1.0, 2.5, 7.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let s = CubicSpline::new(&x, &y).unwrap();

        for t in &[-3.0, 0.5, 3.3, 6.9, 12.0] {
            assert!((s.eval(*t) - (2.0 * t - 1.0)).abs() < TOL);
        }
    }

    #[test]
    fn test_linear_extrapolation() {
        let (x, y) = knots();
        let s = CubicSpline::new(&x, &y).unwrap();

        let end = x[x.len() - 1];
        let slope = s.eval_deriv(end - 1e-9);
        assert!((s.eval(end + 10.0) - (s.eval(end) + 10.0 * slope)).abs() < 1e-6);

        let start = x[0];
        let slope = s.eval_deriv(start);
        assert!((s.eval(start - 2.0) - (s.eval(start) - 2.0 * slope)).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_knots() {
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[0.0]).unwrap_err(),
            SplineError::LengthMismatch(2, 1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0], &[0.0]).unwrap_err(),
            SplineError::TooFewKnots(1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 0.0, 0.0]).unwrap_err(),
            SplineError::NotStrictlyIncreasing(2)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0], &[0.0, 0.0, 0.0]).unwrap_err(),
            SplineError::NotStrictlyIncreasing(2)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, std::f64::NAN], &[0.0, 0.0]).unwrap_err(),
            SplineError::NonFiniteKnot(1)
        );
    }
}
