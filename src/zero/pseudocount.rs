//! Pseudocount addition for zero handling.

use crate::error::{GfopError, Result};
use nalgebra::DMatrix;

/// Pseudocount used before CLR in the ordination.
pub const DEFAULT_PSEUDOCOUNT: f64 = 1.0;

/// Add a pseudocount to every cell of a dense count matrix.
///
/// Zero and non-zero cells are shifted alike so relative differences
/// between food types survive the log transform.
pub fn add_pseudocount(counts: &DMatrix<f64>, pseudocount: f64) -> Result<DMatrix<f64>> {
    if pseudocount <= 0.0 || !pseudocount.is_finite() {
        return Err(GfopError::InvalidParameter(format!(
            "Pseudocount must be positive, got {}",
            pseudocount
        )));
    }
    Ok(counts.add_scalar(pseudocount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_pseudocount() {
        let counts = DMatrix::from_row_slice(2, 3, &[10.0, 20.0, 0.0, 5.0, 0.0, 15.0]);
        let result = add_pseudocount(&counts, 0.5).unwrap();

        assert_eq!(result.shape(), (2, 3));
        assert!((result[(0, 0)] - 10.5).abs() < 1e-10);
        assert!((result[(0, 2)] - 0.5).abs() < 1e-10);
        assert!((result[(1, 1)] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_invalid_pseudocount() {
        let counts = DMatrix::<f64>::zeros(1, 1);
        assert!(add_pseudocount(&counts, 0.0).is_err());
        assert!(add_pseudocount(&counts, -1.0).is_err());
        assert!(add_pseudocount(&counts, f64::NAN).is_err());
    }
}
