//! Data structures for food counts and food flows.

mod flows;
mod food_counts;
mod group_mapping;
mod matrix;
mod network;
mod ontology;
mod sample_metadata;

pub use flows::{node_id, FlowEdge, FlowNode, FoodFlowTable};
pub use food_counts::{FoodCountRow, FoodCountTable, ProportionTable, WideFoodCounts};
pub use group_mapping::{delimiter_for, group_mapping_from_reader, read_group_mapping};
pub use matrix::FoodMatrix;
pub use network::{
    group_index, Cluster, NetworkTable, FILE_DELIMITER, GROUP_DELIMITER, GROUP_LABELS,
};
pub use ontology::{
    ancestor_at, AncestorChain, FoodEntry, Ontology, SampleTypes, ONTOLOGY_LEVELS, WATER,
};
pub use sample_metadata::{SampleGroup, SampleMetadata};
