//! Long-format food counts across ontology levels.

use crate::data::matrix::FoodMatrix;
use crate::data::sample_metadata::SampleMetadata;
use crate::error::{GfopError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One row of the long table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodCountRow {
    pub filename: String,
    pub food_type: String,
    pub count: u64,
    pub level: u8,
    pub group: Option<String>,
}

impl FoodCountRow {
    /// Create a row with no group attached.
    pub fn new<S: Into<String>, T: Into<String>>(
        filename: S,
        food_type: T,
        count: u64,
        level: u8,
    ) -> Self {
        Self {
            filename: filename.into(),
            food_type: food_type.into(),
            count,
            level,
            group: None,
        }
    }
}

/// Food counts for every filename, food type and level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodCountTable {
    rows: Vec<FoodCountRow>,
}

impl FoodCountTable {
    /// Create a table from rows as given.
    pub fn new(rows: Vec<FoodCountRow>) -> Self {
        Self { rows }
    }

    /// Concatenate per-level rows and attach each filename's group.
    ///
    /// Filenames without a known group get `None`.
    pub fn assemble(
        levels: impl IntoIterator<Item = Vec<FoodCountRow>>,
        metadata: &SampleMetadata,
    ) -> Self {
        let rows = levels
            .into_iter()
            .flatten()
            .map(|mut row| {
                row.group = metadata.group(&row.filename).map(String::from);
                row
            })
            .collect();
        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[FoodCountRow] {
        &self.rows
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &FoodCountRow> {
        self.rows.iter()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct levels present.
    pub fn levels(&self) -> BTreeSet<u8> {
        self.rows.iter().map(|r| r.level).collect()
    }

    /// Distinct food types present at a level.
    pub fn food_types(&self, level: u8) -> BTreeSet<&str> {
        self.rows
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.food_type.as_str())
            .collect()
    }

    /// Rows at `level`, optionally restricted to a set of food types.
    ///
    /// A set that matches nothing yields an empty table.
    pub fn filter<S: AsRef<str>>(&self, food_types: Option<&[S]>, level: u8) -> Self {
        let wanted: Option<HashSet<&str>> =
            food_types.map(|types| types.iter().map(|t| t.as_ref()).collect());

        let rows = self
            .rows
            .iter()
            .filter(|r| r.level == level)
            .filter(|r| {
                wanted
                    .as_ref()
                    .map_or(true, |w| w.contains(r.food_type.as_str()))
            })
            .cloned()
            .collect();
        Self { rows }
    }

    fn resolve_level(&self, level: Option<u8>) -> Result<Option<u8>> {
        match level {
            Some(l) => Ok(Some(l)),
            None => {
                let levels = self.levels();
                if levels.len() > 1 {
                    return Err(GfopError::InvalidParameter(
                        "Multiple levels found in the data; \
                         specify a level to convert to wide format"
                            .to_string(),
                    ));
                }
                Ok(levels.into_iter().next())
            }
        }
    }

    /// Pivot one level to a filename × food type matrix with groups.
    ///
    /// The level is inferred when the table holds a single level. No data at
    /// the level yields an empty result.
    pub fn pivot_wide(&self, level: Option<u8>) -> Result<WideFoodCounts> {
        let level = self.resolve_level(level)?;
        let selected: Vec<&FoodCountRow> = match level {
            Some(l) => self.rows.iter().filter(|r| r.level == l).collect(),
            None => Vec::new(),
        };

        let matrix = FoodMatrix::from_triplets(
            selected
                .iter()
                .map(|r| (r.filename.as_str(), r.food_type.as_str(), r.count)),
        );

        let mut group_of: HashMap<&str, Option<&str>> = HashMap::new();
        for r in &selected {
            group_of
                .entry(r.filename.as_str())
                .or_insert(r.group.as_deref());
        }
        let groups = matrix
            .filenames()
            .iter()
            .map(|f| group_of.get(f.as_str()).copied().flatten().map(String::from))
            .collect();

        Ok(WideFoodCounts {
            matrix,
            groups,
            level,
        })
    }

    /// Per-filename proportions of each food type at one level.
    pub fn proportions(&self, level: Option<u8>) -> Result<ProportionTable> {
        let wide = self.pivot_wide(level)?;
        Ok(wide.proportions())
    }

    /// Replace groups of mapped filenames; unmapped filenames keep theirs.
    pub fn apply_group_mapping(&mut self, mapping: &HashMap<String, String>) {
        for row in &mut self.rows {
            if let Some(group) = mapping.get(&row.filename) {
                row.group = Some(group.clone());
            }
        }
    }

    /// Write the long table as TSV.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = writer;
        writeln!(writer, "filename\tfood_type\tcount\tlevel\tgroup")?;
        for r in &self.rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                r.filename,
                r.food_type,
                r.count,
                r.level,
                r.group.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }

    /// Write the long table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_tsv(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// One level pivoted to wide format with a group per filename.
#[derive(Debug, Clone)]
pub struct WideFoodCounts {
    pub matrix: FoodMatrix,
    /// Group per row of `matrix`.
    pub groups: Vec<Option<String>>,
    /// Level the rows came from; `None` for an empty source table.
    pub level: Option<u8>,
}

impl WideFoodCounts {
    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Un-pivot back to long rows, zero-filled cells included.
    pub fn melt(&self) -> Vec<FoodCountRow> {
        let level = self.level.unwrap_or(0);
        self.matrix
            .melt()
            .into_iter()
            .map(|(filename, food_type, count)| {
                let row_idx = self.matrix.row_index(&filename);
                let group = row_idx.and_then(|i| self.groups[i].clone());
                FoodCountRow {
                    filename,
                    food_type,
                    count,
                    level,
                    group,
                }
            })
            .collect()
    }

    /// Divide each cell by its row total; zero totals give zero rows.
    pub fn proportions(&self) -> ProportionTable {
        let mut data = self.matrix.to_dense();
        for (i, total) in self.matrix.row_sums().into_iter().enumerate() {
            let mut row = data.row_mut(i);
            if total == 0 {
                row.fill(0.0);
            } else {
                row /= total as f64;
            }
        }
        ProportionTable {
            data,
            filenames: self.matrix.filenames().to_vec(),
            food_types: self.matrix.food_types().to_vec(),
            groups: self.groups.clone(),
        }
    }

    /// Write as TSV: filename, one column per food type, then group.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "filename")?;
        for food_type in self.matrix.food_types() {
            write!(writer, "\t{}", food_type)?;
        }
        writeln!(writer, "\tgroup")?;

        for (row, filename) in self.matrix.filenames().iter().enumerate() {
            write!(writer, "{}", filename)?;
            for col in 0..self.matrix.n_food_types() {
                write!(writer, "\t{}", self.matrix.get(row, col))?;
            }
            writeln!(writer, "\t{}", self.groups[row].as_deref().unwrap_or(""))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Relative abundance of each food type within each filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProportionTable {
    /// Proportions (filenames × food types).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    pub filenames: Vec<String>,
    pub food_types: Vec<String>,
    pub groups: Vec<Option<String>>,
}

impl ProportionTable {
    /// Get the proportion for a filename and food type.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Get a row (filename) as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().cloned().collect()
    }

    /// Number of filenames.
    pub fn n_filenames(&self) -> usize {
        self.data.nrows()
    }

    /// Write as TSV: filename, one column per food type, then group.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "filename")?;
        for food_type in &self.food_types {
            write!(writer, "\t{}", food_type)?;
        }
        writeln!(writer, "\tgroup")?;

        for (i, filename) in self.filenames.iter().enumerate() {
            write!(writer, "{}", filename)?;
            for j in 0..self.food_types.len() {
                write!(writer, "\t{:.6}", self.data[(i, j)])?;
            }
            writeln!(writer, "\t{}", self.groups[i].as_deref().unwrap_or(""))?;
        }
        writer.flush()?;
        Ok(())
    }
}
