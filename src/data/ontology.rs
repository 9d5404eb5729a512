//! Global FoodOmics ontology store.
//!
//! Maps each reference food filename to its leaf `sample_name` and the six
//! ancestor categories `sample_type_group1..6` (level 1 is the coarsest).
//! The store is read-only after loading and is shared between pipelines
//! through an `Arc`.

use crate::error::{ensure_exists, GfopError, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Number of ontology levels above the leaf.
pub const ONTOLOGY_LEVELS: usize = 6;

/// Category used as the blank/control noise floor.
pub const WATER: &str = "water";

/// Which reference foods to keep, by their `simple_complex` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleTypes {
    Simple,
    Complex,
    #[default]
    All,
}

impl SampleTypes {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
            Self::All => "all",
        }
    }

    fn accepts(&self, tag: &str) -> bool {
        match self {
            Self::All => true,
            other => other.name() == tag,
        }
    }
}

impl FromStr for SampleTypes {
    type Err = GfopError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(Self::Simple),
            "complex" => Ok(Self::Complex),
            "all" => Ok(Self::All),
            other => Err(GfopError::InvalidSampleType(other.to_string())),
        }
    }
}

impl fmt::Display for SampleTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ancestor categories for levels 1..=6; empty strings mean "no category".
pub type AncestorChain = [String; ONTOLOGY_LEVELS];

/// One reference food.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub filename: String,
    pub sample_name: String,
    pub ancestors: AncestorChain,
    pub simple_complex: String,
}

impl FoodEntry {
    /// Category at `level` (1-based), if the ontology defines one.
    pub fn ancestor(&self, level: usize) -> Option<&str> {
        ancestor_at(&self.ancestors, level)
    }
}

/// Category at `level` (1-based) of a chain, skipping empty cells.
pub fn ancestor_at(chain: &AncestorChain, level: usize) -> Option<&str> {
    if level == 0 || level > ONTOLOGY_LEVELS {
        return None;
    }
    let name = chain[level - 1].as_str();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Read-only index over the ontology table.
#[derive(Debug, Clone)]
pub struct Ontology {
    entries: Vec<FoodEntry>,
    by_filename: HashMap<String, usize>,
    /// Distinct ancestor chains per leaf name, in first-seen order.
    chains_by_leaf: HashMap<String, Vec<AncestorChain>>,
    sample_types: SampleTypes,
}

impl Ontology {
    /// Build the store from entries, keeping those accepted by `sample_types`.
    pub fn new(entries: Vec<FoodEntry>, sample_types: SampleTypes) -> Self {
        let entries: Vec<FoodEntry> = entries
            .into_iter()
            .filter(|e| sample_types.accepts(&e.simple_complex))
            .collect();

        let mut by_filename = HashMap::with_capacity(entries.len());
        let mut chains_by_leaf: HashMap<String, Vec<AncestorChain>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            // First row wins for a repeated filename.
            by_filename.entry(entry.filename.clone()).or_insert(idx);
            let chains = chains_by_leaf.entry(entry.sample_name.clone()).or_default();
            if !chains.contains(&entry.ancestors) {
                chains.push(entry.ancestors.clone());
            }
        }

        Self {
            entries,
            by_filename,
            chains_by_leaf,
            sample_types,
        }
    }

    /// Load the ontology from a TSV file.
    pub fn from_tsv<P: AsRef<Path>>(path: P, sample_types: SampleTypes) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), sample_types)
    }

    /// Load the ontology from any tab-separated reader.
    ///
    /// Expected columns: `filename`, `sample_name`, `sample_type_group1..6`
    /// and `simple_complex`. Extra columns are ignored; all values are trimmed.
    pub fn from_reader<R: Read>(reader: R, sample_types: SampleTypes) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let require = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| GfopError::MissingColumn(name.to_string()))
        };

        let filename_col = require("filename")?;
        let sample_name_col = require("sample_name")?;
        let simple_complex_col = require("simple_complex")?;
        let mut level_cols = [0usize; ONTOLOGY_LEVELS];
        for (i, col) in level_cols.iter_mut().enumerate() {
            *col = require(format!("sample_type_group{}", i + 1).as_str())?;
        }

        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

            let filename = field(filename_col);
            if filename.is_empty() {
                continue;
            }
            let ancestors: AncestorChain = std::array::from_fn(|i| field(level_cols[i]));
            entries.push(FoodEntry {
                filename,
                sample_name: field(sample_name_col),
                ancestors,
                simple_complex: field(simple_complex_col),
            });
        }

        let ontology = Self::new(entries, sample_types);
        log::debug!(
            "Loaded ontology with {} reference foods ({})",
            ontology.len(),
            sample_types
        );
        Ok(ontology)
    }

    /// Look up a reference food by filename.
    pub fn entry(&self, filename: &str) -> Option<&FoodEntry> {
        self.by_filename.get(filename).map(|&i| &self.entries[i])
    }

    /// Leaf name for a reference filename.
    pub fn leaf_name(&self, filename: &str) -> Option<&str> {
        self.entry(filename)
            .map(|e| e.sample_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Distinct ancestor chains recorded for a leaf name.
    pub fn chains_for_leaf(&self, sample_name: &str) -> &[AncestorChain] {
        self.chains_by_leaf
            .get(sample_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All entries retained after the sample-type filter.
    pub fn entries(&self) -> &[FoodEntry] {
        &self.entries
    }

    /// Number of retained reference foods.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The sample-type filter this store was built with.
    pub fn sample_types(&self) -> SampleTypes {
        self.sample_types
    }
}
