//! The spanning tree over a structure collection's all-vs-all pairwise
//! scores, used to pick a build order for the multi-alignment (`spec.md`
//! §3 "Spanning tree" / §8 scenario 1).

use ordered_float::OrderedFloat;

use crate::error::Error;

/// Whether to keep the highest- or lowest-weight tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Maximum,
    Minimum,
}

/// One edge of a spanning tree: `(a, b, weight)` with `a < b`.
pub type Edge = (usize, usize, f64);

/// Kruskal's algorithm over `edges` (need not be exhaustive, but must
/// connect all `n` nodes), returning the `n - 1` edges of the maximum- or
/// minimum-weight spanning tree. The minimum case is implemented by
/// negating every weight and re-using the maximum-weight selection logic.
///
/// Ties are broken deterministically on `(a, b)` so the result is stable
/// across runs; the returned edges are sorted by weight (descending for
/// `Maximum`, ascending for `Minimum`) with the same tie-break.
pub fn spanning_tree(n: usize, edges: &[Edge], kind: TreeKind) -> Result<Vec<Edge>, Error> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "spanning tree requires at least one node".into(),
        ));
    }
    if n == 1 {
        return Ok(Vec::new());
    }
    let sign = match kind {
        TreeKind::Maximum => -1.0,
        TreeKind::Minimum => 1.0,
    };
    let mut candidates: Vec<Edge> = edges.to_vec();
    candidates.sort_by_key(|&(a, b, w)| (OrderedFloat(w * sign), a, b));

    let mut parent: Vec<usize> = (0..n).collect();
    let mut tree = Vec::new();
    for &(a, b, w) in &candidates {
        if a >= n || b >= n {
            return Err(Error::OutOfRange { index: a.max(b), bound: n });
        }
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            parent[ra] = rb;
            tree.push((a, b, w));
        }
        if tree.len() == n - 1 {
            break;
        }
    }
    if tree.len() != n - 1 {
        return Err(Error::Runtime(
            "edges do not connect every node into a single spanning tree".into(),
        ));
    }
    tree.sort_by_key(|&(a, b, w)| (OrderedFloat(w * sign), a, b));
    Ok(tree)
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        let root = find(parent, parent[x]);
        parent[x] = root;
    }
    parent[x]
}

/// Convenience wrapper: the maximum-weight spanning tree, the default for
/// building a multi-alignment from pairwise SSAP scores (higher score means
/// a better-matched, and so more trustworthy, pairwise glue).
pub fn maximum_spanning_tree(n: usize, edges: &[Edge]) -> Result<Vec<Edge>, Error> {
    spanning_tree(n, edges, TreeKind::Maximum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_node_example_matches_the_documented_scenario() {
        let edges = [
            (0, 1, 85.40),
            (0, 2, 86.25),
            (0, 3, 87.96),
            (1, 2, 85.21),
            (1, 3, 84.20),
            (2, 3, 88.34),
        ];
        let tree = maximum_spanning_tree(4, &edges).unwrap();
        assert_eq!(tree, vec![(2, 3, 88.34), (0, 3, 87.96), (0, 1, 85.40)]);
    }

    #[test]
    fn minimum_tree_picks_the_cheapest_edges() {
        let edges = [(0, 1, 5.0), (1, 2, 1.0), (0, 2, 9.0)];
        let tree = spanning_tree(3, &edges, TreeKind::Minimum).unwrap();
        assert_eq!(tree, vec![(1, 2, 1.0), (0, 1, 5.0)]);
    }

    #[test]
    fn disconnected_edge_set_is_rejected() {
        let edges = [(0, 1, 1.0), (2, 3, 1.0)];
        assert!(maximum_spanning_tree(4, &edges).is_err());
    }

    #[test]
    fn single_node_has_an_empty_tree() {
        assert_eq!(maximum_spanning_tree(1, &[]).unwrap(), Vec::new());
    }
}
