//! A dense, precomputed cache of "view vectors": residue `j`'s Cβ expressed
//! in residue `i`'s local frame, for every ordered pair `(i, j)` in a
//! protein. The pairwise aligner's inner DP reads this cache on every cell
//! rather than re-deriving the view from the two residues' frames each time.

use crate::geometry::Coord;
use crate::protein::Protein;

/// `views[i * n + j]` is residue `j`'s Cβ position as seen from residue `i`'s
/// own local frame (origin at `i`'s Cα).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCache {
    len: usize,
    views: Vec<Coord>,
}

impl ViewCache {
    /// Precompute the full `n x n` view cache for `protein`.
    #[must_use]
    pub fn build(protein: &Protein) -> Self {
        let len = protein.len();
        let mut views = Vec::with_capacity(len * len);
        for i in 0..len {
            for j in 0..len {
                views.push(protein.residues[i].view_of(protein.residues[j].carbon_beta));
            }
        }
        Self { len, views }
    }

    /// Residue `j`'s Cβ as seen from residue `i`'s frame.
    #[must_use]
    pub fn view(&self, i: usize, j: usize) -> Coord {
        assert!(i < self.len && j < self.len, "view index out of range");
        self.views[i * self.len + j]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residue::{AminoAcid, Residue, ResidueId};

    fn residue(i: usize) -> Residue {
        let ca = Coord::new(i as f64 * 3.8, 0.0, 0.0);
        Residue::new(
            ResidueId {
                chain_label: 'A',
                sequence_number: i as isize,
                insertion_code: None,
            },
            AminoAcid::Ala,
            ca + Coord::new(-0.5, 1.3, 0.0),
            ca,
            ca + Coord::new(1.5, 0.0, 0.0),
            None,
        )
        .unwrap()
    }

    #[test]
    fn self_view_is_the_local_cb_position() {
        let protein = Protein::new("t".into(), (0..4).map(residue).collect()).unwrap();
        let cache = ViewCache::build(&protein);
        let expected = protein.residues[1].view_of(protein.residues[1].carbon_beta);
        assert_eq!(cache.view(1, 1), expected);
    }

    #[test]
    fn view_is_not_generally_symmetric() {
        let protein = Protein::new("t".into(), (0..4).map(residue).collect()).unwrap();
        let cache = ViewCache::build(&protein);
        assert_ne!(cache.view(0, 2), cache.view(2, 0));
    }
}
