//! Linear regression: ordinary least squares, ridge (L2), lasso (L1)
//!
//! All three center `X` and `y` and recover the intercept afterwards, so the
//! penalty never applies to the intercept.
//!
//! - OLS / ridge: normal equations `(XᵀX + αI) β = Xᵀy`. When the system is
//!   singular (a constant or collinear column) the minimum-norm least-squares
//!   solution is used instead, taken from the eigendecomposition of `XᵀX`.
//! - lasso: coordinate descent on `(1/2n)‖y − Xβ‖² + α‖β‖₁`

use super::dataset::Dataset;
use super::ModelError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

const LASSO_MAX_ITER: usize = 1000;
const LASSO_TOLERANCE: f64 = 1e-4;

const JACOBI_MAX_SWEEPS: usize = 100;
/// Eigenvalues below `largest * PINV_RCOND` are treated as zero
const PINV_RCOND: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "penalty", rename_all = "snake_case")]
pub enum Penalty {
    None,
    Ridge { alpha: f64 },
    Lasso { alpha: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub penalty: Penalty,
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    fitted: bool,
}

impl LinearRegression {
    pub fn new(penalty: Penalty) -> Self {
        Self {
            penalty,
            coefficients: Array1::zeros(0),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn ols() -> Self {
        Self::new(Penalty::None)
    }

    pub fn ridge(alpha: f64) -> Self {
        Self::new(Penalty::Ridge { alpha })
    }

    pub fn lasso(alpha: f64) -> Self {
        Self::new(Penalty::Lasso { alpha })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let x_mean = data
            .features
            .mean_axis(Axis(0))
            .ok_or(ModelError::EmptyDataset)?;
        let y_mean = data.labels.mean().ok_or(ModelError::EmptyDataset)?;
        let xc = &data.features - &x_mean;
        let yc = &data.labels - y_mean;

        let coefficients = match self.penalty {
            Penalty::None => solve_normal_equations(&xc, &yc, 0.0),
            Penalty::Ridge { alpha } => {
                check_alpha(alpha)?;
                solve_normal_equations(&xc, &yc, alpha)
            }
            Penalty::Lasso { alpha } => {
                check_alpha(alpha)?;
                coordinate_descent(&xc, &yc, alpha)
            }
        };

        self.intercept = y_mean - x_mean.dot(&coefficients);
        self.coefficients = coefficients;
        self.fitted = true;
        Ok(())
    }

    /// NaN when the row width does not match the fitted coefficients
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if row.len() != self.coefficients.len() {
            return f64::NAN;
        }
        self.intercept + self.coefficients.dot(&row)
    }
}

fn check_alpha(alpha: f64) -> Result<(), ModelError> {
    if alpha.is_finite() && alpha >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidAlpha(alpha))
    }
}

fn solve_normal_equations(xc: &Array2<f64>, yc: &Array1<f64>, alpha: f64) -> Array1<f64> {
    let mut xtx = xc.t().dot(xc);
    xtx.diag_mut().mapv_inplace(|d| d + alpha);
    let xty = xc.t().dot(yc);

    match gaussian_solve(xtx.clone(), xty.clone()) {
        Some(beta) => beta,
        None => {
            log::debug!("Normal equations are singular, using the minimum-norm solution");
            pseudoinverse_solve(&xtx, &xty)
        }
    }
}

/// Gaussian elimination with partial pivoting; None when singular
fn gaussian_solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let scale = a.diag().fold(1.0_f64, |m, d| m.max(d.abs()));

    for col in 0..n {
        let pivot = (col..n).max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))?;
        if a[[pivot, col]].abs() <= 1e-12 * scale {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Some(x)
}

/// `A⁺b` for symmetric positive semi-definite `A`. Directions with a
/// (numerically) zero eigenvalue get no weight, which gives the
/// minimum-norm least-squares coefficients.
fn pseudoinverse_solve(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let (eigenvalues, eigenvectors) = symmetric_eigen(a.clone());
    let largest = eigenvalues.fold(0.0_f64, |m, v| m.max(v.abs()));
    let cutoff = largest * PINV_RCOND;

    let mut projected = eigenvectors.t().dot(b);
    for (p, &lambda) in projected.iter_mut().zip(eigenvalues.iter()) {
        *p = if lambda > cutoff { *p / lambda } else { 0.0 };
    }
    eigenvectors.dot(&projected)
}

/// Cyclic Jacobi rotations. Returns the eigenvalues and the matching
/// eigenvectors as columns.
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let total = a.mapv(|x| x * x).sum();

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off_diagonal = total - a.diag().mapv(|d| d * d).sum();
        if off_diagonal <= 1e-24 * total.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

fn coordinate_descent(xc: &Array2<f64>, yc: &Array1<f64>, alpha: f64) -> Array1<f64> {
    let n = yc.len() as f64;
    let threshold = alpha * n;
    let squared_norms = xc.map_axis(Axis(0), |column| column.dot(&column));

    let mut coef = Array1::<f64>::zeros(xc.ncols());
    let mut residual = yc.clone();

    for _ in 0..LASSO_MAX_ITER {
        let mut max_step = 0.0_f64;

        for (j, column) in xc.columns().into_iter().enumerate() {
            let norm = squared_norms[j];
            if norm <= 1e-12 {
                continue;
            }
            // Correlation with the partial residual that excludes feature j
            let rho = column.dot(&residual) + coef[j] * norm;
            let updated = soft_threshold(rho, threshold) / norm;

            let delta = updated - coef[j];
            if delta != 0.0 {
                residual.scaled_add(-delta, &column);
                coef[j] = updated;
            }
            max_step = max_step.max(delta.abs());
        }

        let largest = coef.fold(1.0_f64, |m, c| m.max(c.abs()));
        if max_step <= LASSO_TOLERANCE * largest {
            break;
        }
    }

    coef
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}
