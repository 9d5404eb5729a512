//! Pipeline construction for food counts and food flows.

mod config;
mod runner;

pub use config::{FlowConfig, MetadataConfig, RunConfig, RunSummary};
pub use runner::{FoodCounts, FoodCountsBuilder, FoodFlows};
