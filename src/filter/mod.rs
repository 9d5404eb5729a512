//! Cluster selection by GNPS group presence.

pub mod groups;

pub use groups::{excluded_groups, select_for_counts, select_for_flows, validate_groups};
