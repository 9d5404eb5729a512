//! Level-0 sample × reference co-occurrence counts.

use crate::data::{Cluster, FoodCountRow, NetworkTable, Ontology, SampleMetadata};
use crate::error::Result;
use crate::filter::select_for_counts;
use std::collections::BTreeMap;

/// Raw co-occurrence count of a sample with a reference leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level0Count {
    pub filename: String,
    pub sample_name: String,
    pub count: u64,
}

/// Level-0 counts, sorted by (filename, sample_name). Every count is > 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Level0Counts {
    counts: Vec<Level0Count>,
}

impl Level0Counts {
    /// All counts.
    pub fn counts(&self) -> &[Level0Count] {
        &self.counts
    }

    /// Number of (filename, leaf) pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count for a pair; absent pairs are zero.
    pub fn get(&self, filename: &str, sample_name: &str) -> u64 {
        self.counts
            .binary_search_by(|c| {
                (c.filename.as_str(), c.sample_name.as_str()).cmp(&(filename, sample_name))
            })
            .map(|i| self.counts[i].count)
            .unwrap_or(0)
    }

    /// Long-table rows tagged with level 0.
    pub fn to_rows(&self) -> Vec<FoodCountRow> {
        self.counts
            .iter()
            .map(|c| FoodCountRow::new(c.filename.as_str(), c.sample_name.as_str(), c.count, 0))
            .collect()
    }
}

/// Members of one cluster split into samples and reference leaves.
#[derive(Debug, Default)]
struct ClusterMembers<'a> {
    samples: Vec<&'a str>,
    references: Vec<&'a str>,
}

/// Level-0 signal for a study design.
///
/// Selects the clusters that pass the sample/reference group rule (see
/// [`select_for_counts`]) and counts co-occurrences within them.
pub fn base_counts<S: AsRef<str>>(
    network: &NetworkTable,
    metadata: &SampleMetadata,
    ontology: &Ontology,
    sample_groups: &[S],
    reference_groups: &[S],
) -> Result<Level0Counts> {
    let selected = select_for_counts(network, sample_groups, reference_groups)?;
    Ok(count_cooccurrences(&selected, metadata, ontology))
}

/// Count sample/reference co-occurrences over already selected clusters.
///
/// Within each cluster a filename known to `metadata` is a sample; any
/// other filename is a reference if the ontology resolves it to a leaf, and
/// is dropped otherwise. Samples and references are joined on the cluster
/// identifier and the resulting pairs are counted.
pub fn count_cooccurrences(
    clusters: &[&Cluster],
    metadata: &SampleMetadata,
    ontology: &Ontology,
) -> Level0Counts {
    let mut by_cluster: BTreeMap<&str, ClusterMembers> = BTreeMap::new();
    let mut unresolved = 0usize;

    for cluster in clusters {
        let members = by_cluster.entry(cluster.id()).or_default();
        for filename in cluster.files() {
            if metadata.contains(filename) {
                members.samples.push(filename.as_str());
            } else if let Some(leaf) = ontology.leaf_name(filename) {
                members.references.push(leaf);
            } else {
                unresolved += 1;
            }
        }
    }

    if unresolved > 0 {
        log::warn!(
            "{} filenames are neither samples nor ontology references",
            unresolved
        );
    }

    let mut pairs: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for members in by_cluster.values() {
        for &sample in &members.samples {
            for &leaf in &members.references {
                *pairs.entry((sample, leaf)).or_insert(0) += 1;
            }
        }
    }

    let counts = pairs
        .into_iter()
        .map(|((filename, sample_name), count)| Level0Count {
            filename: filename.to_string(),
            sample_name: sample_name.to_string(),
            count,
        })
        .collect();

    Level0Counts { counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FoodEntry, SampleTypes};

    fn entry(filename: &str, leaf: &str, chain: [&str; 6]) -> FoodEntry {
        FoodEntry {
            filename: filename.to_string(),
            sample_name: leaf.to_string(),
            ancestors: chain.map(String::from),
            simple_complex: "simple".to_string(),
        }
    }

    fn create_test_ontology() -> Ontology {
        Ontology::new(
            vec![
                entry(
                    "apple.mzXML",
                    "apple",
                    ["plant", "fruit", "fleshy", "pome", "apple", "apple"],
                ),
                entry("pear.mzXML", "pear", ["plant", "fruit", "fleshy", "pome", "pear", "pear"]),
                entry("beef.mzXML", "beef", ["animal", "meat", "red", "bovine", "beef", "beef"]),
            ],
            SampleTypes::All,
        )
    }

    fn cluster(id: &str, files: &[&str], groups: &[&str], counts: [f64; 6]) -> Cluster {
        Cluster::new(
            id,
            files.iter().map(|s| s.to_string()).collect(),
            groups.iter().map(|s| s.to_string()).collect(),
            counts,
        )
    }

    fn create_test_network() -> NetworkTable {
        let mixed = [2.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        NetworkTable::from_clusters(vec![
            cluster("0", &["s1", "s2"], &["G1"], [2.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            cluster("1", &["s1", "apple.mzXML"], &["G1", "G4"], mixed),
            cluster("2", &["s1", "s2", "apple.mzXML", "beef.mzXML"], &["G1", "G4"], mixed),
            cluster("3", &["s2", "mystery.mzXML"], &["G1", "G4"], mixed),
            // contaminated with G3
            cluster(
                "4",
                &["s1", "pear.mzXML"],
                &["G1", "G3", "G4"],
                [1.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            ),
        ])
    }

    fn create_counts() -> Level0Counts {
        let net = create_test_network();
        let meta = SampleMetadata::from_network(&net, &["G1"]);
        base_counts(&net, &meta, &create_test_ontology(), &["G1"], &["G4"]).unwrap()
    }

    #[test]
    fn test_base_counts() {
        let counts = create_counts();

        assert_eq!(counts.get("s1", "apple"), 2);
        assert_eq!(counts.get("s1", "beef"), 1);
        assert_eq!(counts.get("s2", "apple"), 1);
        assert_eq!(counts.get("s2", "beef"), 1);
        // pear only co-occurs in a contaminated cluster
        assert_eq!(counts.get("s1", "pear"), 0);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_only_positive_counts() {
        let counts = create_counts();
        assert!(counts.counts().iter().all(|c| c.count > 0));
    }

    #[test]
    fn test_rows_are_level_zero_leaf_names() {
        let rows = create_counts().to_rows();
        assert!(rows.iter().all(|r| r.level == 0 && r.group.is_none()));
        assert_eq!(rows[0].filename, "s1");
        assert_eq!(rows[0].food_type, "apple");
    }

    #[test]
    fn test_shared_cluster_id_joins_rows() {
        let mixed = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let net = NetworkTable::from_clusters(vec![
            cluster("7", &["s1"], &["G1"], [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            cluster("9", &["s1"], &["G1", "G4"], mixed),
            cluster("9", &["apple.mzXML"], &["G1", "G4"], mixed),
        ]);
        let meta = SampleMetadata::from_network(&net, &["G1"]);
        let counts = base_counts(&net, &meta, &create_test_ontology(), &["G1"], &["G4"]).unwrap();
        assert_eq!(counts.get("s1", "apple"), 1);
    }
}
