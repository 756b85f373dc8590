//! Multi-structure alignment building: a spanning tree over pairwise
//! scores picks a build order, and structures are progressively glued into
//! one growing [`Group`] along that order (`spec.md` §4.7).

mod builder;
mod group;
mod spanning_tree;

pub use builder::{build_multi_alignment, GlueStyle, MultiAlignResult, RootPolicy};
pub use group::Group;
pub use spanning_tree::{maximum_spanning_tree, spanning_tree as compute_spanning_tree, Edge, TreeKind};
