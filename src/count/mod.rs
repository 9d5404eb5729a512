//! Food count aggregation.
//!
//! - [`level0`]: sample × reference leaf co-occurrence counts
//! - [`rollup`]: per-level ancestor counts with the water noise floor

pub mod level0;
pub mod rollup;

pub use level0::{base_counts, count_cooccurrences, Level0Count, Level0Counts};
pub use rollup::{level_matrix, rollup, rollup_level};
