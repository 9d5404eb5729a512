//! Sample filename → experimental group mapping.

use crate::data::network::NetworkTable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One (filename, group) association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleGroup {
    pub filename: String,
    pub group: String,
}

/// Study samples and their groups, derived from single-group network rows.
#[derive(Debug, Clone, Default)]
pub struct SampleMetadata {
    /// Deduplicated pairs in first-seen order.
    pairs: Vec<SampleGroup>,
    /// Filename → group; the last pair for a filename wins.
    groups: HashMap<String, String>,
}

impl SampleMetadata {
    /// Build metadata from explicit pairs, dropping exact duplicates.
    pub fn from_pairs(pairs: impl IntoIterator<Item = SampleGroup>) -> Self {
        let mut seen = HashSet::new();
        let pairs: Vec<SampleGroup> = pairs
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();

        let mut groups: HashMap<String, String> = HashMap::with_capacity(pairs.len());
        for pair in &pairs {
            if let Some(previous) = groups.insert(pair.filename.clone(), pair.group.clone()) {
                if previous != pair.group {
                    log::warn!(
                        "Filename '{}' belongs to groups '{}' and '{}'; using '{}'",
                        pair.filename,
                        previous,
                        pair.group,
                        pair.group
                    );
                }
            }
        }

        Self { pairs, groups }
    }

    /// Derive the sample → group mapping from the network.
    ///
    /// Only clusters whose `DefaultGroups` names exactly one group, and whose
    /// group is among `sample_groups`, contribute their filenames.
    pub fn from_network<S: AsRef<str>>(network: &NetworkTable, sample_groups: &[S]) -> Self {
        let wanted: HashSet<&str> = sample_groups.iter().map(|g| g.as_ref()).collect();

        let pairs = network
            .clusters()
            .iter()
            .filter_map(|c| c.single_group().map(|g| (c, g)))
            .filter(|(_, g)| wanted.contains(g))
            .flat_map(|(c, g)| {
                c.files().iter().map(move |f| SampleGroup {
                    filename: f.clone(),
                    group: g.to_string(),
                })
            });

        Self::from_pairs(pairs)
    }

    /// Group for a filename, if it is a known sample.
    pub fn group(&self, filename: &str) -> Option<&str> {
        self.groups.get(filename).map(String::as_str)
    }

    /// Check if a filename is a known sample.
    pub fn contains(&self, filename: &str) -> bool {
        self.groups.contains_key(filename)
    }

    /// All (filename, group) pairs.
    pub fn pairs(&self) -> &[SampleGroup] {
        &self.pairs
    }

    /// Number of distinct sample filenames.
    pub fn n_samples(&self) -> usize {
        self.groups.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace groups for filenames present in `mapping`; others keep theirs.
    pub fn apply_mapping(&mut self, mapping: &HashMap<String, String>) {
        for pair in &mut self.pairs {
            if let Some(new_group) = mapping.get(&pair.filename) {
                pair.group = new_group.clone();
            }
        }
        for (filename, group) in self.groups.iter_mut() {
            if let Some(new_group) = mapping.get(filename) {
                *group = new_group.clone();
            }
        }
    }
}
