//! Multi-level food flows for flow diagrams.
//!
//! Unlike the count rollup, the water floor here is a single global count
//! taken over every mapped filename.

use crate::data::{
    ancestor_at, node_id, FlowEdge, FlowNode, FoodEntry, FoodFlowTable, NetworkTable, Ontology,
    ONTOLOGY_LEVELS, WATER,
};
use crate::error::{GfopError, Result};
use crate::filter::select_for_flows;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Derive flows between adjacent ontology levels `1..=max_level`.
///
/// Every filename of a selected cluster is mapped through the ontology and
/// kept only if it has a category at each level up to `max_level`. Entries
/// whose finest category occurs no more often than the water count are
/// discarded before transitions are counted.
pub fn derive_flows<S: AsRef<str>>(
    network: &NetworkTable,
    ontology: &Ontology,
    groups_included: &[S],
    max_level: usize,
) -> Result<FoodFlowTable> {
    if max_level == 0 || max_level > ONTOLOGY_LEVELS {
        return Err(GfopError::InvalidParameter(format!(
            "max_level must be within 1..={}, got {}",
            ONTOLOGY_LEVELS, max_level
        )));
    }

    let clusters = select_for_flows(network, groups_included)?;
    let mapped: Vec<&FoodEntry> = clusters
        .iter()
        .flat_map(|c| c.files())
        .filter_map(|f| ontology.entry(f))
        .filter(|e| (1..=max_level).all(|level| e.ancestor(level).is_some()))
        .collect();

    let water_count = mapped
        .iter()
        .filter(|e| e.ancestor(1) == Some(WATER))
        .count();

    let mut finest: HashMap<&str, usize> = HashMap::new();
    for &e in &mapped {
        *finest.entry(leaf_category(e, max_level)).or_insert(0) += 1;
    }
    let retained: Vec<&FoodEntry> = mapped
        .into_iter()
        .filter(|e| finest[leaf_category(e, max_level)] > water_count)
        .collect();

    log::debug!(
        "{} filenames mapped for flows, water count {}",
        retained.len(),
        water_count
    );

    let mut table = FoodFlowTable::default();
    let mut seen: HashSet<FlowNode> = HashSet::new();
    for level in 1..max_level {
        let mut transitions: BTreeMap<(&str, &str), u64> = BTreeMap::new();
        for &e in &retained {
            let key = (leaf_category(e, level), leaf_category(e, level + 1));
            *transitions.entry(key).or_insert(0) += 1;
        }

        let step: Vec<FlowEdge> = transitions
            .into_iter()
            .map(|((source, target), value)| {
                let target = node_id(target, level + 1);
                FlowEdge {
                    source: node_id(source, level),
                    kind: target.clone(),
                    target,
                    value,
                }
            })
            .collect();

        let sources = step.iter().map(|e| FlowNode {
            id: e.source.clone(),
            level,
        });
        let targets = step.iter().map(|e| FlowNode {
            id: e.target.clone(),
            level: level + 1,
        });
        for node in sources.chain(targets) {
            if seen.insert(node.clone()) {
                table.nodes.push(node);
            }
        }
        table.edges.extend(step);
    }

    log::info!(
        "Derived {} flow edges across {} levels",
        table.edges.len(),
        max_level
    );
    Ok(table)
}

/// Category at a level already known to be present.
fn leaf_category(entry: &FoodEntry, level: usize) -> &str {
    ancestor_at(&entry.ancestors, level).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cluster, SampleTypes};

    fn entry(filename: &str, chain: [&str; 6]) -> FoodEntry {
        FoodEntry {
            filename: filename.to_string(),
            sample_name: chain[5].to_string(),
            ancestors: chain.map(String::from),
            simple_complex: "simple".to_string(),
        }
    }

    fn create_test_ontology() -> Ontology {
        Ontology::new(
            vec![
                entry("apple", ["plant", "fruit", "fleshy", "pome", "apple", "apple"]),
                entry("pear", ["plant", "fruit", "fleshy", "pome", "pear", "pear"]),
                entry("beef", ["animal", "meat", "red", "bovine", "beef", "beef"]),
                entry("milk", ["animal", "dairy", "", "", "", ""]),
                entry("water", ["water"; 6]),
            ],
            SampleTypes::All,
        )
    }

    fn cluster(files: &[&str], counts: [f64; 6]) -> Cluster {
        Cluster::new(
            "0",
            files.iter().map(|s| s.to_string()).collect(),
            vec!["G4".to_string()],
            counts,
        )
    }

    fn create_test_network() -> NetworkTable {
        let g4 = [0.0, 0.0, 0.0, 3.0, 0.0, 0.0];
        NetworkTable::from_clusters(vec![
            cluster(&["apple", "apple", "pear", "sample.mzXML"], g4),
            cluster(&["apple", "beef", "beef", "milk"], g4),
            cluster(&["water", "pear"], g4),
            // contaminated by G1
            cluster(&["beef", "beef", "beef"], [1.0, 0.0, 0.0, 3.0, 0.0, 0.0]),
        ])
    }

    #[test]
    fn test_two_level_flows() {
        let net = create_test_network();
        let flows = derive_flows(&net, &create_test_ontology(), &["G4"], 2).unwrap();

        // mapped: apple ×3, pear ×2, beef ×2, milk, water; water_count = 1
        // level-2 counts: fruit 5, meat 2, dairy 1, water 1 -> keep fruit, meat
        assert_eq!(
            flows.edges,
            vec![
                FlowEdge {
                    source: "animal_1".into(),
                    target: "meat_2".into(),
                    value: 2,
                    kind: "meat_2".into(),
                },
                FlowEdge {
                    source: "plant_1".into(),
                    target: "fruit_2".into(),
                    value: 5,
                    kind: "fruit_2".into(),
                },
            ]
        );
        let ids: Vec<&str> = flows.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["animal_1", "plant_1", "meat_2", "fruit_2"]);
    }

    #[test]
    fn test_incomplete_chains_dropped() {
        let net = create_test_network();
        let flows = derive_flows(&net, &create_test_ontology(), &["G4"], 3).unwrap();
        // milk has no level-3 category
        assert!(flows.nodes.iter().all(|n| n.id != "dairy_2"));
        assert_eq!(flows.outflow(1), 7);
        assert_eq!(flows.outflow(2), 7);
    }

    #[test]
    fn test_repeated_names_get_level_suffix() {
        let net = create_test_network();
        let flows = derive_flows(&net, &create_test_ontology(), &["G4"], 6).unwrap();
        let nodes: HashSet<&str> = flows.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(nodes.contains("apple_5"));
        assert!(nodes.contains("apple_6"));
        assert!(flows.nodes.iter().all(|n| n.id.ends_with(&format!("_{}", n.level))));
    }

    #[test]
    fn test_invalid_max_level() {
        let net = create_test_network();
        let ont = create_test_ontology();
        assert!(derive_flows(&net, &ont, &["G4"], 0).is_err());
        assert!(derive_flows(&net, &ont, &["G4"], 7).is_err());
    }

    #[test]
    fn test_single_level_has_no_edges() {
        let net = create_test_network();
        let flows = derive_flows(&net, &create_test_ontology(), &["G4"], 1).unwrap();
        assert!(flows.is_empty());
        assert!(flows.nodes.is_empty());
    }

    #[test]
    fn test_no_clusters_selected() {
        let net = create_test_network();
        let flows = derive_flows(&net, &create_test_ontology(), &["G1", "G4"], 3).unwrap();
        // only the contaminated cluster matches; beef ×3 with no water
        assert_eq!(flows.outflow(1), 3);

        let flows = derive_flows(&net, &create_test_ontology(), &["G2"], 3).unwrap();
        assert!(flows.is_empty());
    }
}
