//! GNPS classical molecular-networking cluster table.
//!
//! Each row of the GNPS `clusterinfo summary` table describes one cluster.
//! Rows are parsed once into [`Cluster`] values that own their filename
//! memberships, so the rest of the crate works with the cluster ↔ filename
//! relation directly instead of re-splitting delimited strings.

use crate::error::{ensure_exists, GfopError, Result};
use csv::ReaderBuilder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// The six GNPS group labels, in column order.
pub const GROUP_LABELS: [&str; 6] = ["G1", "G2", "G3", "G4", "G5", "G6"];

/// Delimiter between filenames in `UniqueFileSources`.
pub const FILE_DELIMITER: char = '|';

/// Delimiter between labels in `DefaultGroups`.
pub const GROUP_DELIMITER: char = ',';

const CLUSTER_COLUMN: &str = "cluster index";
const FILES_COLUMN: &str = "UniqueFileSources";
const GROUPS_COLUMN: &str = "DefaultGroups";

/// Position of a GNPS group label within [`GROUP_LABELS`].
pub fn group_index(label: &str) -> Option<usize> {
    GROUP_LABELS.iter().position(|g| *g == label)
}

/// One molecular-network cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    id: String,
    files: Vec<String>,
    default_groups: Vec<String>,
    group_counts: [f64; 6],
}

impl Cluster {
    /// Create a cluster from already-split memberships.
    pub fn new<S: Into<String>>(
        id: S,
        files: Vec<String>,
        default_groups: Vec<String>,
        group_counts: [f64; 6],
    ) -> Self {
        Self {
            id: id.into(),
            files,
            default_groups,
            group_counts,
        }
    }

    /// Cluster identifier (`cluster index`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Filenames observed in this cluster, duplicates included.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Group labels listed in `DefaultGroups`.
    pub fn default_groups(&self) -> &[String] {
        &self.default_groups
    }

    /// The group label if `DefaultGroups` names exactly one group.
    pub fn single_group(&self) -> Option<&str> {
        match self.default_groups.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Presence count for a group label; unknown labels read as zero.
    pub fn group_count(&self, label: &str) -> f64 {
        group_index(label)
            .map(|i| self.group_counts[i])
            .unwrap_or(0.0)
    }
}

/// The parsed network table.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    clusters: Vec<Cluster>,
    /// Which of `G1`..`G6` were present as columns in the source.
    group_columns: [bool; 6],
}

impl NetworkTable {
    /// Build a table from clusters, treating every group column as present.
    pub fn from_clusters(clusters: Vec<Cluster>) -> Self {
        Self {
            clusters,
            group_columns: [true; 6],
        }
    }

    /// Load the network from a GNPS TSV file.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load the network from any tab-separated reader.
    ///
    /// Requires the `UniqueFileSources` and `DefaultGroups` columns. When
    /// `cluster index` is absent the row ordinal identifies the cluster.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let files_col =
            find(FILES_COLUMN).ok_or_else(|| GfopError::MissingColumn(FILES_COLUMN.to_string()))?;
        let groups_col = find(GROUPS_COLUMN)
            .ok_or_else(|| GfopError::MissingColumn(GROUPS_COLUMN.to_string()))?;
        let cluster_col = find(CLUSTER_COLUMN);
        let group_cols: Vec<Option<usize>> = GROUP_LABELS.iter().map(|g| find(*g)).collect();

        let mut group_columns = [false; 6];
        for (i, col) in group_cols.iter().enumerate() {
            group_columns[i] = col.is_some();
        }

        let mut clusters = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            let id = match cluster_col {
                Some(idx) => field(idx).to_string(),
                None => row_idx.to_string(),
            };
            let files = split_list(field(files_col), FILE_DELIMITER);
            let default_groups = split_list(field(groups_col), GROUP_DELIMITER);

            let mut group_counts = [0.0; 6];
            for (i, col) in group_cols.iter().enumerate() {
                if let Some(idx) = *col {
                    let raw = field(idx);
                    if raw.is_empty() {
                        continue;
                    }
                    group_counts[i] = raw.parse().map_err(|_| GfopError::InvalidValue {
                        value: raw.to_string(),
                        row: row_idx,
                        column: GROUP_LABELS[i].to_string(),
                    })?;
                }
            }

            clusters.push(Cluster::new(id, files, default_groups, group_counts));
        }

        log::debug!("Loaded network with {} clusters", clusters.len());

        Ok(Self {
            clusters,
            group_columns,
        })
    }

    /// All clusters in file order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Whether the group label exists as a numeric column.
    pub fn has_group_column(&self, label: &str) -> bool {
        group_index(label)
            .map(|i| self.group_columns[i])
            .unwrap_or(false)
    }

    /// Distinct group labels named anywhere in `DefaultGroups`.
    pub fn group_labels(&self) -> BTreeSet<String> {
        self.clusters
            .iter()
            .flat_map(|c| c.default_groups.iter().cloned())
            .collect()
    }
}

fn split_list(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cluster index\tUniqueFileSources\tDefaultGroups\tG1\tG2\tG3\tG4").unwrap();
        writeln!(file, "1\ts1.mzXML|apple.mzXML\tG1,G4\t1\t0\t0\t1").unwrap();
        writeln!(file, "2\ts1.mzXML|s2.mzXML\tG1\t2\t0\t0\t0").unwrap();
        writeln!(file, "3\tpear.mzXML\tG4\t0\t0\t0\t\t").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_network() {
        let file = create_test_tsv();
        let net = NetworkTable::from_tsv(file.path()).unwrap();

        assert_eq!(net.n_clusters(), 3);
        let first = &net.clusters()[0];
        assert_eq!(first.id(), "1");
        assert_eq!(first.files(), &["s1.mzXML", "apple.mzXML"]);
        assert_eq!(first.default_groups(), &["G1", "G4"]);
        assert_eq!(first.single_group(), None);
        assert_eq!(net.clusters()[1].single_group(), Some("G1"));
        assert_eq!(net.clusters()[1].group_count("G1"), 2.0);
    }

    #[test]
    fn test_missing_group_columns_read_as_zero() {
        let file = create_test_tsv();
        let net = NetworkTable::from_tsv(file.path()).unwrap();

        assert!(net.has_group_column("G4"));
        assert!(!net.has_group_column("G5"));
        assert_eq!(net.clusters()[0].group_count("G6"), 0.0);
        assert_eq!(net.clusters()[2].group_count("G4"), 0.0);
    }

    #[test]
    fn test_group_labels_split_on_comma() {
        let file = create_test_tsv();
        let net = NetworkTable::from_tsv(file.path()).unwrap();
        let labels: Vec<String> = net.group_labels().into_iter().collect();
        assert_eq!(labels, vec!["G1", "G4"]);
    }

    #[test]
    fn test_row_ordinal_when_cluster_index_absent() {
        let data = "UniqueFileSources\tDefaultGroups\tG1\nA|B\tG1\t1\nC\tG1\t1\n";
        let net = NetworkTable::from_reader(data.as_bytes()).unwrap();
        assert_eq!(net.clusters()[0].id(), "0");
        assert_eq!(net.clusters()[1].id(), "1");
    }

    #[test]
    fn test_missing_required_column() {
        let data = "UniqueFileSources\tG1\nA\t1\n";
        let err = NetworkTable::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, GfopError::MissingColumn(ref c) if c == "DefaultGroups"));
    }

    #[test]
    fn test_invalid_group_count() {
        let data = "UniqueFileSources\tDefaultGroups\tG1\nA\tG1\tmany\n";
        let err = NetworkTable::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, GfopError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn test_file_not_found() {
        let err = NetworkTable::from_tsv("definitely/not/here.tsv").unwrap_err();
        assert!(matches!(err, GfopError::FileNotFound(_)));
    }

    #[test]
    fn test_headers_only() {
        let data = "UniqueFileSources\tDefaultGroups\tG1\tG2\tG3\tG4\n";
        let net = NetworkTable::from_reader(data.as_bytes()).unwrap();
        assert!(net.is_empty());
        assert!(net.group_labels().is_empty());
    }
}
