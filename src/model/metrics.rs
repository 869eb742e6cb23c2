//! Held-out regression metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Panics if the arrays differ in length
    pub fn calculate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len();
        if n == 0 {
            return Self {
                mae: f64::NAN,
                mse: f64::NAN,
                rmse: f64::NAN,
                r2: f64::NAN,
                n_samples: 0,
            };
        }

        let residuals = y_true - y_pred;
        let nf = n as f64;
        let sq_sum = residuals.mapv(|r| r * r).sum();
        let mean = y_true.sum() / nf;
        let ss_tot = y_true.mapv(|t| (t - mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - sq_sum / ss_tot
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        let mse = sq_sum / nf;
        Self {
            mae: residuals.mapv(f64::abs).sum() / nf,
            mse,
            rmse: mse.sqrt(),
            r2,
            n_samples: n,
        }
    }

    pub fn log(&self, label: &str) {
        log::info!("📈 {} (n={})", label, self.n_samples);
        log::info!("   ├─ MAE:  {:.2}", self.mae);
        log::info!("   ├─ MSE:  {:.2}", self.mse);
        log::info!("   ├─ RMSE: {:.2}", self.rmse);
        log::info!("   └─ R²:   {:.4}", self.r2);
    }
}
