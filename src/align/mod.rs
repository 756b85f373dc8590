//! Alignment machinery: the generic DP engine shared by both SSAP levels,
//! the `Alignment` data structure itself, and the two-level SSAP pairwise
//! aligner built on top of them.

mod align_type;
mod alignment;
mod diagonal_array;
mod pairwise;
mod ssap;

pub use align_type::Type;
pub use alignment::{Alignment, Row, SplitMapping};
pub use diagonal_array::DiagonalArray;
pub use pairwise::{align, DpResult};
pub use ssap::{align_pair, refine_join, AlignScoring, RefineConfig, SsapResult};
