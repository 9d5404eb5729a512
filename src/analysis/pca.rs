//! Principal component ordination of one food-count level.

use crate::data::{FoodCountTable, WideFoodCounts};
use crate::error::{GfopError, Result};
use crate::normalize::clr::norm_clr;
use crate::zero::pseudocount::{add_pseudocount, DEFAULT_PSEUDOCOUNT};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Options for [`pca_food_counts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaOptions {
    /// Ontology level to ordinate.
    pub level: u8,
    pub n_components: usize,
    /// Add a pseudocount of 1 and CLR-transform each sample first.
    pub apply_clr: bool,
    /// Restrict to these food types; all when `None`.
    pub food_types: Option<Vec<String>>,
}

impl Default for PcaOptions {
    fn default() -> Self {
        Self {
            level: 3,
            n_components: 3,
            apply_clr: true,
            food_types: None,
        }
    }
}

/// Sample scores on the leading principal components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaResult {
    pub filenames: Vec<String>,
    pub groups: Vec<Option<String>>,
    /// Scores (filenames × components).
    #[serde(skip)]
    pub scores: DMatrix<f64>,
    /// Fraction of total variance carried by each component.
    pub explained_variance_ratio: Vec<f64>,
}

impl PcaResult {
    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.scores.ncols()
    }

    /// Score of a filename on a component.
    pub fn score(&self, row: usize, component: usize) -> f64 {
        self.scores[(row, component)]
    }

    /// Write as TSV: `PC1..PCk`, then filename and group.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for k in 0..self.n_components() {
            write!(writer, "PC{}\t", k + 1)?;
        }
        writeln!(writer, "filename\tgroup")?;

        for (i, filename) in self.filenames.iter().enumerate() {
            for k in 0..self.n_components() {
                write!(writer, "{:.6}\t", self.scores[(i, k)])?;
            }
            writeln!(
                writer,
                "{}\t{}",
                filename,
                self.groups[i].as_deref().unwrap_or("")
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Ordinate the samples of one level.
///
/// The level is pivoted wide, optionally CLR-transformed, standardized per
/// food type and decomposed by SVD.
pub fn pca_food_counts(table: &FoodCountTable, options: &PcaOptions) -> Result<PcaResult> {
    let filtered = table.filter(options.food_types.as_deref(), options.level);
    let wide = filtered.pivot_wide(Some(options.level))?;
    if wide.is_empty() {
        return Err(GfopError::EmptyData(format!(
            "No food counts at level {} to ordinate",
            options.level
        )));
    }
    pca_wide(&wide, options.n_components, options.apply_clr)
}

/// Ordinate an already pivoted level.
pub fn pca_wide(wide: &WideFoodCounts, n_components: usize, apply_clr: bool) -> Result<PcaResult> {
    let matrix = &wide.matrix;
    let (n, p) = (matrix.n_filenames(), matrix.n_food_types());
    if n_components == 0 || n_components > n.min(p) {
        return Err(GfopError::InvalidParameter(format!(
            "n_components must be within 1..={} for a {} × {} matrix, got {}",
            n.min(p),
            n,
            p,
            n_components
        )));
    }

    let mut features = matrix.to_dense();
    if apply_clr {
        let shifted = add_pseudocount(&features, DEFAULT_PSEUDOCOUNT)?;
        features = norm_clr(
            &shifted,
            matrix.filenames().to_vec(),
            matrix.food_types().to_vec(),
        )?
        .data;
    }

    let scaled = standardize(&features);
    let (scores, explained_variance_ratio) = principal_components(&scaled, n_components)?;

    log::info!(
        "PCA on {} filenames × {} food types, explained variance {:?}",
        n,
        p,
        explained_variance_ratio
    );

    Ok(PcaResult {
        filenames: matrix.filenames().to_vec(),
        groups: wide.groups.clone(),
        scores,
        explained_variance_ratio,
    })
}

/// Center each column and divide by its population standard deviation.
///
/// Columns with zero spread are only centered.
pub fn standardize(data: &DMatrix<f64>) -> DMatrix<f64> {
    let n = data.nrows() as f64;
    let columns: Vec<(usize, f64, f64)> = (0..data.ncols())
        .into_par_iter()
        .map(|j| {
            let col = data.column(j);
            let mean = col.sum() / n;
            let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            (j, mean, if std == 0.0 { 1.0 } else { std })
        })
        .collect();

    let mut scaled = data.clone();
    for (j, mean, std) in columns {
        for x in scaled.column_mut(j).iter_mut() {
            *x = (*x - mean) / std;
        }
    }
    scaled
}

/// Scores `U·S` and explained-variance ratios of the leading components.
///
/// Each component is oriented so that its largest-magnitude food-type
/// loading (row of `Vᵀ`) is positive, as scikit-learn's `PCA` does.
fn principal_components(
    scaled: &DMatrix<f64>,
    n_components: usize,
) -> Result<(DMatrix<f64>, Vec<f64>)> {
    let svd = scaled.clone().svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| GfopError::Numerical("SVD did not produce U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| GfopError::Numerical("SVD did not produce Vt".to_string()))?;
    let singular = svd.singular_values;

    let mut order: Vec<usize> = (0..singular.len()).collect();
    order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

    let total: f64 = singular.iter().map(|s| s * s).sum();
    let mut scores = DMatrix::zeros(scaled.nrows(), n_components);
    let mut ratios = Vec::with_capacity(n_components);

    for (k, &idx) in order.iter().take(n_components).enumerate() {
        let column = u.column(idx);
        let sign = svd_flip_sign(v_t.row(idx).iter().copied());
        let s = singular[idx];
        for i in 0..scaled.nrows() {
            scores[(i, k)] = sign * column[i] * s;
        }
        ratios.push(if total > 0.0 { s * s / total } else { 0.0 });
    }

    Ok((scores, ratios))
}

/// Sign making the largest-magnitude entry of a loading vector positive.
fn svd_flip_sign(values: impl Iterator<Item = f64>) -> f64 {
    let mut largest = 0.0_f64;
    for v in values {
        if v.abs() > largest.abs() {
            largest = v;
        }
    }
    if largest < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FoodCountRow;
    use approx::assert_relative_eq;

    fn row(filename: &str, food_type: &str, count: u64) -> FoodCountRow {
        let mut r = FoodCountRow::new(filename, food_type, count, 3);
        r.group = Some(if filename < "s3" { "a" } else { "b" }.to_string());
        r
    }

    fn create_test_table() -> FoodCountTable {
        FoodCountTable::new(vec![
            row("s1", "fruit", 10),
            row("s1", "meat", 1),
            row("s1", "grain", 4),
            row("s2", "fruit", 8),
            row("s2", "meat", 2),
            row("s2", "grain", 5),
            row("s3", "fruit", 1),
            row("s3", "meat", 9),
            row("s3", "grain", 3),
            row("s4", "fruit", 2),
            row("s4", "meat", 12),
            row("s4", "grain", 6),
            FoodCountRow::new("s1", "plant", 15, 1),
        ])
    }

    #[test]
    fn test_standardize_zero_mean_unit_variance() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
        let scaled = standardize(&data);

        assert_relative_eq!(scaled.column(0).sum(), 0.0, epsilon = 1e-12);
        let var: f64 = scaled.column(0).iter().map(|x| x * x).sum::<f64>() / 3.0;
        assert_relative_eq!(var, 1.0, epsilon = 1e-12);
        // constant column is centered only
        assert!(scaled.column(1).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_pca_explained_variance() {
        let result = pca_food_counts(&create_test_table(), &PcaOptions::default()).unwrap();

        assert_eq!(result.filenames, vec!["s1", "s2", "s3", "s4"]);
        assert_eq!(result.n_components(), 3);
        let total: f64 = result.explained_variance_ratio.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        let ratios = &result.explained_variance_ratio;
        assert!(ratios.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_pca_separates_groups() {
        let options = PcaOptions {
            n_components: 2,
            apply_clr: false,
            ..Default::default()
        };
        let result = pca_food_counts(&create_test_table(), &options).unwrap();

        // fruit-heavy and meat-heavy samples fall on opposite sides of PC1
        let pc1: Vec<f64> = (0..4).map(|i| result.score(i, 0)).collect();
        assert!(pc1[0] * pc1[2] < 0.0);
        assert!(pc1[1] * pc1[3] < 0.0);
        assert_eq!(result.groups[0].as_deref(), Some("a"));
        assert_eq!(result.groups[3].as_deref(), Some("b"));
    }

    #[test]
    fn test_scores_are_centered() {
        let result = pca_food_counts(&create_test_table(), &PcaOptions::default()).unwrap();
        for k in 0..result.n_components() {
            let sum: f64 = (0..4).map(|i| result.score(i, k)).sum();
            assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_too_many_components() {
        let options = PcaOptions {
            n_components: 4,
            ..Default::default()
        };
        let err = pca_food_counts(&create_test_table(), &options).unwrap_err();
        assert!(matches!(err, GfopError::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_level() {
        let options = PcaOptions {
            level: 5,
            ..Default::default()
        };
        let err = pca_food_counts(&create_test_table(), &options).unwrap_err();
        assert!(matches!(err, GfopError::EmptyData(_)));
    }

    #[test]
    fn test_food_type_subset() {
        let options = PcaOptions {
            n_components: 2,
            food_types: Some(vec!["fruit".to_string(), "meat".to_string()]),
            ..Default::default()
        };
        let result = pca_food_counts(&create_test_table(), &options).unwrap();
        assert_eq!(result.n_components(), 2);
    }

    #[test]
    fn test_flip_sign() {
        assert_eq!(svd_flip_sign([0.1, -0.9, 0.3].into_iter()), -1.0);
        assert_eq!(svd_flip_sign([0.5, -0.2].into_iter()), 1.0);
    }

    #[test]
    fn test_largest_loading_positive() {
        let data = DMatrix::from_row_slice(
            4,
            3,
            &[10.0, 1.0, 4.0, 8.0, 2.0, 5.0, 1.0, 9.0, 3.0, 2.0, 12.0, 6.0],
        );
        let scaled = standardize(&data);
        let (scores, _) = principal_components(&scaled, 2).unwrap();

        // loadings recovered from the scores: Vᵀ_k ∝ scoresᵀ_k · X
        for k in 0..2 {
            let loading: Vec<f64> = (0..3)
                .map(|j| (0..4).map(|i| scores[(i, k)] * scaled[(i, j)]).sum::<f64>())
                .collect();
            let largest = loading
                .iter()
                .copied()
                .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            assert!(largest > 0.0, "component {} loading {:?}", k, loading);
        }
    }
}
