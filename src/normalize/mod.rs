//! Compositional transforms applied before ordination.
//!
//! - **CLR**: Centered log-ratio transformation per sample

pub mod clr;

pub use clr::{norm_clr, TransformedMatrix};
