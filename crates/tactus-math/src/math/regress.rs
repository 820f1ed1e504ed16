//! Simple ordinary least-squares regression with diagnostics.
//!
//! The correction operator regresses smoothed prediction errors against
//! beat indices and records the fit quality alongside the slope and
//! intercept. Diagnostics match the usual textbook definitions: Pearson
//! r, a two-sided p-value from the Student-t distribution of
//! `t = r * sqrt(df / (1 - r^2))` with `df = n - 2`, and the standard
//! error of the slope.

use serde::{Deserialize, Serialize};

use super::special::beta_cdf;

/// Result of a simple linear regression `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r_value: f64,
    /// Two-sided p-value for the null hypothesis of zero slope.
    pub p_value: f64,
    /// Standard error of the slope estimate.
    pub stderr: f64,
}

/// Ordinary least-squares fit of `ys` against `xs`.
///
/// Returns `None` when the fit is underdetermined: fewer than two
/// points, mismatched lengths, non-finite values, or constant `xs`.
/// With exactly two points the fit is exact and the diagnostics
/// degenerate to `p_value = 1.0`, `stderr = 0.0`.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    if !xs.iter().chain(ys.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let n_f = n as f64;
    let x_mean = xs.iter().sum::<f64>() / n_f;
    let y_mean = ys.iter().sum::<f64>() / n_f;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }
    if ss_xx == 0.0 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = y_mean - slope * x_mean;
    let r_value = if ss_yy == 0.0 {
        0.0
    } else {
        (ss_xy / (ss_xx * ss_yy).sqrt()).clamp(-1.0, 1.0)
    };

    let df = n_f - 2.0;
    let (p_value, stderr) = if df <= 0.0 {
        (1.0, 0.0)
    } else {
        let one_minus_r2 = (1.0 - r_value * r_value).max(0.0);
        if one_minus_r2 == 0.0 {
            (0.0, 0.0)
        } else {
            let t2 = r_value * r_value * df / one_minus_r2;
            let p = beta_cdf(df / (df + t2), df / 2.0, 0.5);
            let se = (one_minus_r2 * ss_yy / ss_xx / df).sqrt();
            (p, se)
        }
    };

    Some(LinearFit {
        slope,
        intercept,
        r_value,
        p_value,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_regression(&xs, &ys).unwrap();
        assert!(approx_eq(fit.slope, 2.0, 1e-12));
        assert!(approx_eq(fit.intercept, 1.0, 1e-12));
        assert!(approx_eq(fit.r_value, 1.0, 1e-12));
        assert!(approx_eq(fit.p_value, 0.0, 1e-12));
        assert!(approx_eq(fit.stderr, 0.0, 1e-12));
    }

    #[test]
    fn constant_ys() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [4.0, 4.0, 4.0];
        let fit = linear_regression(&xs, &ys).unwrap();
        assert!(approx_eq(fit.slope, 0.0, 1e-12));
        assert!(approx_eq(fit.intercept, 4.0, 1e-12));
        assert!(approx_eq(fit.r_value, 0.0, 1e-12));
        assert!(approx_eq(fit.p_value, 1.0, 1e-12));
        assert!(approx_eq(fit.stderr, 0.0, 1e-12));
    }

    #[test]
    fn known_noisy_fit() {
        // Hand-computed: slope 1.3, intercept -0.2, r 0.98270
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 2.0, 4.0];
        let fit = linear_regression(&xs, &ys).unwrap();
        assert!(approx_eq(fit.slope, 1.3, 1e-12));
        assert!(approx_eq(fit.intercept, -0.2, 1e-12));
        assert!(approx_eq(fit.r_value, 0.982_70, 1e-4));
        assert!(fit.p_value > 0.0 && fit.p_value < 0.05);
        assert!(fit.stderr > 0.0);
    }

    #[test]
    fn two_points_degenerate_diagnostics() {
        let fit = linear_regression(&[0.0, 1.0], &[2.0, 5.0]).unwrap();
        assert!(approx_eq(fit.slope, 3.0, 1e-12));
        assert!(approx_eq(fit.intercept, 2.0, 1e-12));
        assert_eq!(fit.p_value, 1.0);
        assert_eq!(fit.stderr, 0.0);
    }

    #[test]
    fn underdetermined_inputs() {
        assert!(linear_regression(&[], &[]).is_none());
        assert!(linear_regression(&[1.0], &[2.0]).is_none());
        assert!(linear_regression(&[1.0, 2.0], &[3.0]).is_none());
        // Constant xs: slope undefined
        assert!(linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        // Non-finite values
        assert!(linear_regression(&[0.0, f64::NAN], &[1.0, 2.0]).is_none());
        assert!(linear_regression(&[0.0, 1.0], &[1.0, f64::INFINITY]).is_none());
    }
}
