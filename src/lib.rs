//! Global FoodOmics Project (GFOP) food counts and food flows.
//!
//! This library turns a GNPS classical molecular-networking cluster table
//! into hierarchical per-sample food counts and multi-level food flows,
//! using the FoodOmics reference ontology.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (NetworkTable, Ontology, FoodCountTable, flows)
//! - **filter**: Group validation and cluster selection by group presence
//! - **count**: Level-0 co-occurrence counts and the ontology rollup
//! - **flow**: Flows between adjacent ontology levels
//! - **zero**: Zero handling (pseudocount)
//! - **normalize**: Compositional transforms (CLR)
//! - **analysis**: Ordination (PCA)
//! - **pipeline**: FoodCounts / FoodFlows construction and YAML runs
//!
//! # Example
//!
//! ```no_run
//! use gfop::prelude::*;
//! use std::sync::Arc;
//!
//! let ontology = Arc::new(Ontology::from_tsv("ontology.tsv", SampleTypes::All).unwrap());
//!
//! let food_counts = FoodCounts::builder()
//!     .sample_groups(&["G1"])
//!     .reference_groups(&["G4"])
//!     .levels(6)
//!     .build_from_path("network.tsv", Arc::clone(&ontology))
//!     .unwrap();
//!
//! let proportions = food_counts.proportions(3).unwrap();
//! food_counts.to_tsv("food_counts.tsv").unwrap();
//! ```

pub mod analysis;
pub mod count;
pub mod data;
pub mod error;
pub mod filter;
pub mod flow;
pub mod normalize;
pub mod pipeline;
pub mod zero;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::{pca_food_counts, PcaOptions, PcaResult};
    pub use crate::count::{base_counts, rollup, Level0Counts};
    pub use crate::data::{
        Cluster, FlowEdge, FlowNode, FoodCountRow, FoodCountTable, FoodFlowTable, FoodMatrix,
        NetworkTable, Ontology, ProportionTable, SampleMetadata, SampleTypes, WideFoodCounts,
    };
    pub use crate::error::{GfopError, Result};
    pub use crate::filter::{select_for_counts, select_for_flows, validate_groups};
    pub use crate::flow::derive_flows;
    pub use crate::normalize::{norm_clr, TransformedMatrix};
    pub use crate::pipeline::{FoodCounts, FoodCountsBuilder, FoodFlows, RunConfig, RunSummary};
    pub use crate::zero::pseudocount::add_pseudocount;
}
