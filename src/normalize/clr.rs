//! Centered log-ratio (CLR) transform of per-sample food compositions.

use crate::error::{GfopError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A transformed matrix with the labels it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedMatrix {
    /// Transformed values (filenames × food types).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    pub filenames: Vec<String>,
    pub food_types: Vec<String>,
    /// Name of the transformation applied.
    pub transformation: String,
    /// Geometric mean of each filename's row.
    pub geometric_means: Vec<f64>,
}

impl TransformedMatrix {
    /// Get the transformed value for a filename and food type.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of filenames.
    pub fn n_filenames(&self) -> usize {
        self.data.nrows()
    }

    /// Number of food types.
    pub fn n_food_types(&self) -> usize {
        self.data.ncols()
    }

    /// Get a filename's row as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    /// Get reference to the underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// Apply the CLR transform to each filename's row.
///
/// For row i: CLR(x_ij) = ln(x_ij) - mean_j(ln(x_ij)), i.e. the log of each
/// value over the row's geometric mean.
///
/// Input must be strictly positive; add a pseudocount first.
pub fn norm_clr(
    data: &DMatrix<f64>,
    filenames: Vec<String>,
    food_types: Vec<String>,
) -> Result<TransformedMatrix> {
    let (n_rows, n_cols) = data.shape();

    if n_rows == 0 || n_cols == 0 {
        return Err(GfopError::EmptyData(
            "Cannot apply CLR to empty matrix".to_string(),
        ));
    }
    if filenames.len() != n_rows || food_types.len() != n_cols {
        return Err(GfopError::InvalidParameter(format!(
            "Labels ({} × {}) do not match a {} × {} matrix",
            filenames.len(),
            food_types.len(),
            n_rows,
            n_cols
        )));
    }

    for i in 0..n_rows {
        for j in 0..n_cols {
            let val = data[(i, j)];
            if val <= 0.0 {
                return Err(GfopError::Numerical(format!(
                    "CLR requires positive values; found {} at ({}, {})",
                    val, i, j
                )));
            }
        }
    }

    let log_data: DMatrix<f64> = data.map(|x| x.ln());

    let log_means: Vec<f64> = (0..n_rows)
        .into_par_iter()
        .map(|i| log_data.row(i).sum() / n_cols as f64)
        .collect();

    let mut clr_data = log_data;
    for (i, mean) in log_means.iter().enumerate() {
        for j in 0..n_cols {
            clr_data[(i, j)] -= mean;
        }
    }

    Ok(TransformedMatrix {
        data: clr_data,
        filenames,
        food_types,
        transformation: "CLR".to_string(),
        geometric_means: log_means.into_iter().map(f64::exp).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn create_test_data() -> DMatrix<f64> {
        // 4 filenames × 3 food types, pseudocount already added
        DMatrix::from_row_slice(4, 3, &[
            10.5, 30.5, 5.5,
            20.5, 40.5, 10.5,
            15.5, 35.5, 8.5,
            5.5, 25.5, 3.5,
        ])
    }

    #[test]
    fn test_clr_row_sums_zero() {
        let result = norm_clr(&create_test_data(), labels("s", 4), labels("f", 3)).unwrap();

        assert_eq!(result.n_filenames(), 4);
        assert_eq!(result.n_food_types(), 3);
        for i in 0..result.n_filenames() {
            let row_sum: f64 = result.row(i).iter().sum();
            assert_relative_eq!(row_sum, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_clr_geometric_mean() {
        let result = norm_clr(&create_test_data(), labels("s", 4), labels("f", 3)).unwrap();
        let expected = (10.5_f64 * 30.5 * 5.5).powf(1.0 / 3.0);
        assert_relative_eq!(result.geometric_means[0], expected, epsilon = 1e-10);
    }

    #[test]
    fn test_clr_manual_calculation() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 4.0, 4.0, 1.0]);
        let result = norm_clr(&data, labels("s", 2), labels("f", 2)).unwrap();

        // geometric mean of each row is 2
        assert_relative_eq!(result.get(0, 0), -2.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(result.get(0, 1), 2.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(result.get(1, 0), 2.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(result.get(1, 1), -2.0_f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_clr_rejects_non_positive() {
        let zero = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 4.0, 1.0]);
        assert!(matches!(
            norm_clr(&zero, labels("s", 2), labels("f", 2)),
            Err(GfopError::Numerical(_))
        ));
        let negative = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, 4.0, 1.0]);
        assert!(norm_clr(&negative, labels("s", 2), labels("f", 2)).is_err());
    }

    #[test]
    fn test_clr_label_mismatch() {
        let err = norm_clr(&create_test_data(), labels("s", 3), labels("f", 3)).unwrap_err();
        assert!(matches!(err, GfopError::InvalidParameter(_)));
    }
}
