//! Zero handling before log transforms.

pub mod pseudocount;

pub use pseudocount::{add_pseudocount, DEFAULT_PSEUDOCOUNT};
