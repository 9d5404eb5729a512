//! Sparse filename × food-type count matrix.

use crate::error::{GfopError, Result};
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, BTreeSet};

/// A wide count matrix: rows are sample filenames, columns are food types.
///
/// Absent combinations are implicit zeros. Row and column labels are kept
/// sorted when built from triplets.
#[derive(Debug, Clone)]
pub struct FoodMatrix {
    /// Sparse matrix in CSR format (filenames × food types)
    data: CsMat<u64>,
    filenames: Vec<String>,
    food_types: Vec<String>,
}

impl FoodMatrix {
    /// Create a new FoodMatrix from a sparse matrix and labels.
    pub fn new(data: CsMat<u64>, filenames: Vec<String>, food_types: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != filenames.len() {
            return Err(GfopError::InvalidParameter(format!(
                "Matrix has {} rows but {} filenames",
                nrows,
                filenames.len()
            )));
        }
        if ncols != food_types.len() {
            return Err(GfopError::InvalidParameter(format!(
                "Matrix has {} columns but {} food types",
                ncols,
                food_types.len()
            )));
        }
        Ok(Self {
            data,
            filenames,
            food_types,
        })
    }

    /// Pivot (filename, food_type, count) triplets into a zero-filled matrix.
    ///
    /// Repeated combinations are summed. Zero counts still register their
    /// filename and food type as a row and column.
    pub fn from_triplets<I, S, T>(triplets: I) -> Self
    where
        I: IntoIterator<Item = (S, T, u64)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut cells: BTreeMap<(String, String), u64> = BTreeMap::new();
        let mut filenames = BTreeSet::new();
        let mut food_types = BTreeSet::new();

        for (filename, food_type, count) in triplets {
            let filename = filename.into();
            let food_type = food_type.into();
            filenames.insert(filename.clone());
            food_types.insert(food_type.clone());
            *cells.entry((filename, food_type)).or_insert(0) += count;
        }

        let filenames: Vec<String> = filenames.into_iter().collect();
        let food_types: Vec<String> = food_types.into_iter().collect();
        let row_of: BTreeMap<&str, usize> = filenames
            .iter()
            .enumerate()
            .map(|(i, f)| (f.as_str(), i))
            .collect();
        let col_of: BTreeMap<&str, usize> = food_types
            .iter()
            .enumerate()
            .map(|(j, t)| (t.as_str(), j))
            .collect();

        let mut tri_mat = TriMat::new((filenames.len(), food_types.len()));
        for ((filename, food_type), count) in &cells {
            if *count > 0 {
                tri_mat.add_triplet(row_of[filename.as_str()], col_of[food_type.as_str()], *count);
            }
        }
        let data: CsMat<u64> = tri_mat.to_csr();

        Self {
            data,
            filenames,
            food_types,
        }
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Number of filenames (rows).
    #[inline]
    pub fn n_filenames(&self) -> usize {
        self.data.rows()
    }

    /// Number of food types (columns).
    #[inline]
    pub fn n_food_types(&self) -> usize {
        self.data.cols()
    }

    /// Row labels.
    #[inline]
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Column labels.
    #[inline]
    pub fn food_types(&self) -> &[String] {
        &self.food_types
    }

    /// Check if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.n_filenames() == 0 || self.n_food_types() == 0
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<u64> {
        &self.data
    }

    /// Column index of a food type.
    pub fn column_index(&self, food_type: &str) -> Option<usize> {
        self.food_types.iter().position(|t| t == food_type)
    }

    /// Row index of a filename.
    pub fn row_index(&self, filename: &str) -> Option<usize> {
        self.filenames.iter().position(|f| f == filename)
    }

    /// Get a dense vector for a specific row (filename).
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_food_types()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Get a dense vector for a specific column (food type).
    pub fn col_dense(&self, col: usize) -> Vec<u64> {
        (0..self.n_filenames()).map(|row| self.get(row, col)).collect()
    }

    /// Total counts per filename.
    pub fn row_sums(&self) -> Vec<u64> {
        self.data
            .outer_iterator()
            .map(|v| v.iter().map(|(_, &val)| val).sum())
            .collect()
    }

    /// Total counts per food type.
    pub fn col_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_food_types()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Zero every cell that does not strictly exceed its row's floor.
    ///
    /// `floor` holds one value per row. Applying the same floor twice
    /// removes nothing further.
    pub fn apply_noise_floor(&mut self, floor: &[u64]) -> Result<usize> {
        if floor.len() != self.n_filenames() {
            return Err(GfopError::InvalidParameter(format!(
                "Noise floor has {} values for {} rows",
                floor.len(),
                self.n_filenames()
            )));
        }

        let mut removed = 0;
        let mut tri_mat = TriMat::new(self.data.shape());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                if val > floor[row] {
                    tri_mat.add_triplet(row, col, val);
                } else {
                    removed += 1;
                }
            }
        }
        self.data = tri_mat.to_csr();
        Ok(removed)
    }

    /// Use the `blank` column as a per-row noise floor, then drop it.
    ///
    /// Returns the floor that was applied, or `None` when the column is
    /// absent and the matrix is left unchanged.
    pub fn suppress_below_blank(&mut self, blank: &str) -> Result<Option<Vec<u64>>> {
        let Some(blank_col) = self.column_index(blank) else {
            return Ok(None);
        };
        let floor = self.col_dense(blank_col);

        let keep: Vec<usize> = (0..self.n_food_types()).filter(|&j| j != blank_col).collect();
        *self = self.subset_columns(&keep)?;
        self.apply_noise_floor(&floor)?;
        Ok(Some(floor))
    }

    /// Drop food types whose column is zero for every filename.
    pub fn drop_empty_columns(&self) -> Result<Self> {
        let sums = self.col_sums();
        let keep: Vec<usize> = (0..self.n_food_types()).filter(|&j| sums[j] > 0).collect();
        self.subset_columns(&keep)
    }

    /// Subset the matrix to the given columns (by index).
    pub fn subset_columns(&self, indices: &[usize]) -> Result<Self> {
        let mut new_col = vec![None; self.n_food_types()];
        let mut food_types = Vec::with_capacity(indices.len());
        for (new_idx, &old_idx) in indices.iter().enumerate() {
            if old_idx >= self.n_food_types() {
                return Err(GfopError::InvalidParameter(format!(
                    "Food type index {} out of bounds",
                    old_idx
                )));
            }
            new_col[old_idx] = Some(new_idx);
            food_types.push(self.food_types[old_idx].clone());
        }

        let mut tri_mat = TriMat::new((self.n_filenames(), indices.len()));
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                if let Some(new_idx) = new_col[col] {
                    tri_mat.add_triplet(row, new_idx, val);
                }
            }
        }

        Self::new(tri_mat.to_csr(), self.filenames.clone(), food_types)
    }

    /// Un-pivot to (filename, food_type, count) triplets, zeros included.
    ///
    /// Triplets come column by column, each column in row order.
    pub fn melt(&self) -> Vec<(String, String, u64)> {
        let mut out = Vec::with_capacity(self.n_filenames() * self.n_food_types());
        for (col, food_type) in self.food_types.iter().enumerate() {
            for (row, filename) in self.filenames.iter().enumerate() {
                out.push((filename.clone(), food_type.clone(), self.get(row, col)));
            }
        }
        out
    }

    /// Convert to a dense matrix (f64), filenames × food types.
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_filenames(), self.n_food_types());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val as f64;
            }
        }
        dense
    }
}
