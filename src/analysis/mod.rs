//! Statistical post-processing of food counts.

pub mod pca;

pub use pca::{pca_food_counts, pca_wide, standardize, PcaOptions, PcaResult};
