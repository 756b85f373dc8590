//! The residue-pair scan index: a spatial/rotational hash over view vectors
//! and frame-to-frame orientations, accelerating quad lookup between two
//! structures to roughly the cost of the matching cells rather than the full
//! cross product of residue pairs.

use std::collections::HashMap;

use crate::geometry::{Coord, QuatRot};
use crate::protein::Protein;
use crate::view::ViewCache;

use super::orientation_covering::OrientationCovering;

/// One residue-pair entry stored in the scan index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEntry {
    pub i: usize,
    pub j: usize,
    pub view: Coord,
    pub frame_quat: QuatRot,
    pub phi_i: Option<f64>,
    pub psi_i: Option<f64>,
    pub phi_j: Option<f64>,
    pub psi_j: Option<f64>,
}

/// `(spatial cell of the view vector, nearest orientation-covering index)`.
pub type CellKey = (i64, i64, i64, usize);

/// A built scan index for one structure.
pub struct ScanIndex<'c> {
    cell_width: f64,
    covering: &'c OrientationCovering,
    cells: HashMap<CellKey, Vec<PairEntry>>,
}

impl<'c> ScanIndex<'c> {
    /// Build the index over every ordered residue pair `(i, j)` of `protein`
    /// with `|i - j| >= minimum_sequence_separation`, keeping their view
    /// vector (read from `views`) and frame-to-frame quaternion.
    #[must_use]
    pub fn build(
        protein: &Protein,
        views: &ViewCache,
        covering: &'c OrientationCovering,
        cell_width: f64,
        minimum_sequence_separation: usize,
    ) -> Self {
        let mut cells: HashMap<CellKey, Vec<PairEntry>> = HashMap::new();
        let n = protein.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                if i.abs_diff(j) < minimum_sequence_separation {
                    continue;
                }
                let view = views.view(i, j);
                let frame_quat = QuatRot::from_rotation(&protein.residues[j].frame)
                    .compose(&QuatRot::from_rotation(&protein.residues[i].frame).conjugate());
                let entry = PairEntry {
                    i,
                    j,
                    view,
                    frame_quat,
                    phi_i: protein.residues[i].phi.map(|a| a.radians()),
                    psi_i: protein.residues[i].psi.map(|a| a.radians()),
                    phi_j: protein.residues[j].phi.map(|a| a.radians()),
                    psi_j: protein.residues[j].psi.map(|a| a.radians()),
                };
                let key = cell_key(view, frame_quat, covering, cell_width);
                cells.entry(key).or_default().push(entry);
            }
        }
        Self {
            cell_width,
            covering,
            cells,
        }
    }

    #[must_use]
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    #[must_use]
    pub fn covering(&self) -> &OrientationCovering {
        self.covering
    }

    /// Every entry stored in the exact cell `key`.
    #[must_use]
    pub fn entries_in_cell(&self, key: &CellKey) -> &[PairEntry] {
        self.cells.get(key).map_or(&[], Vec::as_slice)
    }

    /// Every populated cell key in this index.
    #[must_use]
    pub fn all_keys(&self) -> Vec<CellKey> {
        self.cells.keys().copied().collect()
    }

    /// Every distinct spatial coordinate present among the index's cells, at
    /// a given orientation index, used to enumerate which spatial cells a
    /// lookup must probe around a query point.
    #[must_use]
    pub fn spatial_cells_at_orientation(&self, orientation_index: usize) -> Vec<(i64, i64, i64)> {
        self.cells
            .keys()
            .filter(|(.., o)| *o == orientation_index)
            .map(|(x, y, z, _)| (*x, *y, *z))
            .collect()
    }
}

fn spatial_cell(view: Coord, cell_width: f64) -> (i64, i64, i64) {
    (
        (view.x / cell_width).floor() as i64,
        (view.y / cell_width).floor() as i64,
        (view.z / cell_width).floor() as i64,
    )
}

fn cell_key(
    view: Coord,
    frame_quat: QuatRot,
    covering: &OrientationCovering,
    cell_width: f64,
) -> CellKey {
    let (x, y, z) = spatial_cell(view, cell_width);
    let orientation_index = covering.nearest_index(&frame_quat);
    (x, y, z, orientation_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residue::{AminoAcid, Residue, ResidueId};

    fn protein_of(n: usize) -> Protein {
        let residues = (0..n)
            .map(|i| {
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
            })
            .collect();
        Protein::new("t".into(), residues).unwrap()
    }

    #[test]
    fn every_qualifying_pair_is_indexed_exactly_once() {
        let protein = protein_of(8);
        let views = ViewCache::build(&protein);
        let covering = OrientationCovering::octahedral_48();
        let index = ScanIndex::build(&protein, &views, &covering, 2.0, 3);
        let total: usize = index.cells.values().map(Vec::len).sum();
        let expected = (0..8)
            .flat_map(|i| (0..8).map(move |j| (i, j)))
            .filter(|(i, j)| i != j && i.abs_diff(*j) >= 3)
            .count();
        assert_eq!(total, expected);
    }
}
