//! Zero-mean / unit-variance scaling, fit on the training split only

use super::dataset::Dataset;
use super::ModelError;
use ndarray::{Array1, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    /// Population standard deviation; constant columns use 1.0
    pub scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(data: &Dataset) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let mean = data
            .features
            .mean_axis(Axis(0))
            .ok_or(ModelError::EmptyDataset)?;
        let scale = data
            .features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-6 { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    fn check_width(&self, got: usize) -> Result<(), ModelError> {
        if got == self.mean.len() {
            Ok(())
        } else {
            Err(ModelError::DimensionMismatch {
                expected: self.mean.len(),
                got,
            })
        }
    }

    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }

    pub fn transform(&self, data: &Dataset) -> Result<Dataset, ModelError> {
        self.check_width(data.features.ncols())?;
        let features = (&data.features - &self.mean) / &self.scale;
        Ok(Dataset::from_arrays(
            features,
            data.labels.clone(),
            data.feature_names.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Feature;
    use ndarray::{array, aview1};

    #[test]
    fn test_fit_transform_centers_columns() {
        let data = Dataset::new(
            vec![vec![1.0, 5.0], vec![3.0, 5.0]],
            vec![0.0, 0.0],
            vec![Feature::Floor, Feature::DealMonth],
        );

        let scaler = StandardScaler::fit(&data).unwrap();
        assert_eq!(scaler.mean, array![2.0, 5.0]);
        assert!((scaler.scale[0] - 1.0).abs() < 1e-12);
        // Constant column
        assert_eq!(scaler.scale[1], 1.0);

        let scaled = scaler.transform(&data).unwrap();
        let expected = array![[-1.0, 0.0], [1.0, 0.0]];
        for (got, want) in scaled.features.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(scaled.labels, data.labels);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let scaler = StandardScaler {
            mean: Array1::zeros(3),
            scale: Array1::ones(3),
        };
        assert_eq!(
            scaler.transform_row(aview1(&[1.0])),
            Err(ModelError::DimensionMismatch { expected: 3, got: 1 })
        );

        let narrow = Dataset::new(vec![vec![1.0]], vec![0.0], vec![Feature::Floor]);
        assert_eq!(
            scaler.transform(&narrow),
            Err(ModelError::DimensionMismatch { expected: 3, got: 1 })
        );
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert_eq!(StandardScaler::fit(&Dataset::default()), Err(ModelError::EmptyDataset));
    }
}
