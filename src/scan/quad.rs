//! Quad lookup: given two structures' scan indices and a [`MatchCriteria`],
//! enumerate every `(i_a, j_a, i_b, j_b)` quadruple that passes all the
//! criteria's bounds.

use crate::geometry::Angle;
use crate::match_criteria::MatchCriteria;
use crate::protein::Protein;

use super::index::{PairEntry, ScanIndex};
use super::orientation_covering::OrientationCovering;

/// A candidate structural equivalence between one residue pair in structure
/// A and one in structure B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad {
    pub i_a: usize,
    pub j_a: usize,
    pub i_b: usize,
    pub j_b: usize,
}

fn phi_diff_ok(a: Option<f64>, b: Option<f64>, bound: Angle) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            Angle::from_radians(a).wrapped_difference(Angle::from_radians(b)).radians()
                <= bound.radians()
        }
        _ => true,
    }
}

fn entries_match(a: &PairEntry, b: &PairEntry, criteria: &MatchCriteria) -> bool {
    let view_distance_sq = (a.view - b.view).length_squared();
    if view_distance_sq > criteria.maximum_squared_view_distance {
        return false;
    }
    if a.frame_quat.distance_1(&b.frame_quat)
        > distance_1_from_angle(criteria.maximum_frame_rotation_angle)
    {
        return false;
    }
    if !phi_diff_ok(a.phi_i, b.phi_i, criteria.maximum_from_phi_difference) {
        return false;
    }
    if !phi_diff_ok(a.phi_j, b.phi_j, criteria.maximum_to_phi_difference) {
        return false;
    }
    if !phi_diff_ok(a.psi_i, b.psi_i, criteria.maximum_from_psi_difference) {
        return false;
    }
    if !phi_diff_ok(a.psi_j, b.psi_j, criteria.maximum_to_psi_difference) {
        return false;
    }
    if criteria.require_matching_sequence_direction {
        let dir_a = (a.j as isize) - (a.i as isize);
        let dir_b = (b.j as isize) - (b.i as isize);
        if dir_a.signum() != dir_b.signum() {
            return false;
        }
    }
    true
}

/// An upper bound on `distance_1` equivalent to `angle`, used to turn the
/// criteria's angular bound into the cheaper distance-1 comparison before
/// falling back to nothing costlier: `distance_1 = 1 - cos(angle/2)` for the
/// corresponding rotation angle, which is monotone in `angle`.
fn distance_1_from_angle(angle: Angle) -> f64 {
    1.0 - (angle.radians() / 2.0).cos()
}

/// The indexed quad lookup: probe only the spatial/orientation cells of `b`
/// that could plausibly contain a match for each entry of `a`, using the
/// covering-triangle-inequality neighbour list precomputed on `covering`.
#[must_use]
pub fn scan_indexed(
    index_a: &ScanIndex<'_>,
    index_b: &ScanIndex<'_>,
    covering: &OrientationCovering,
    criteria: &MatchCriteria,
) -> Vec<Quad> {
    let mut out = Vec::new();
    let extra_distance_1 = distance_1_from_angle(criteria.maximum_frame_rotation_angle);
    let cell_radius = (criteria.maximum_squared_view_distance.sqrt() / index_b.cell_width())
        .ceil() as i64
        + 1;

    for (key_a, entries_a) in index_cells(index_a) {
        let (x, y, z, orientation_index) = key_a;
        let neighbour_orientations = covering.neighbours_within(orientation_index, extra_distance_1);
        for &orientation_b in &neighbour_orientations {
            for dx in -cell_radius..=cell_radius {
                for dy in -cell_radius..=cell_radius {
                    for dz in -cell_radius..=cell_radius {
                        let key_b = (x + dx, y + dy, z + dz, orientation_b);
                        for entry_b in index_b.entries_in_cell(&key_b) {
                            for entry_a in &entries_a {
                                if entries_match(entry_a, entry_b, criteria) {
                                    out.push(Quad {
                                        i_a: entry_a.i,
                                        j_a: entry_a.j,
                                        i_b: entry_b.i,
                                        j_b: entry_b.j,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    out
}

fn index_cells(index: &ScanIndex<'_>) -> Vec<(super::index::CellKey, Vec<PairEntry>)> {
    index
        .all_keys()
        .into_iter()
        .map(|key| (key, index.entries_in_cell(&key).to_vec()))
        .collect()
}

/// The direct, unindexed reference scan over every pair of residue pairs:
/// the ground truth `scan_indexed` is checked against.
#[must_use]
pub fn scan_naive(
    protein_a: &Protein,
    views_a: &crate::view::ViewCache,
    protein_b: &Protein,
    views_b: &crate::view::ViewCache,
    criteria: &MatchCriteria,
) -> Vec<Quad> {
    let mut out = Vec::new();
    let na = protein_a.len();
    let nb = protein_b.len();
    for i_a in 0..na {
        for j_a in 0..na {
            if i_a == j_a || i_a.abs_diff(j_a) < criteria.minimum_sequence_separation {
                continue;
            }
            for i_b in 0..nb {
                for j_b in 0..nb {
                    if i_b == j_b || i_b.abs_diff(j_b) < criteria.minimum_sequence_separation {
                        continue;
                    }
                    let entry_a = pair_entry(protein_a, views_a, i_a, j_a);
                    let entry_b = pair_entry(protein_b, views_b, i_b, j_b);
                    if entries_match(&entry_a, &entry_b, criteria) {
                        out.push(Quad { i_a, j_a, i_b, j_b });
                    }
                }
            }
        }
    }
    out
}

fn pair_entry(protein: &Protein, views: &crate::view::ViewCache, i: usize, j: usize) -> PairEntry {
    PairEntry {
        i,
        j,
        view: views.view(i, j),
        frame_quat: crate::geometry::QuatRot::from_rotation(&protein.residues[j].frame)
            .compose(&crate::geometry::QuatRot::from_rotation(&protein.residues[i].frame).conjugate()),
        phi_i: protein.residues[i].phi.map(|a| a.radians()),
        psi_i: protein.residues[i].psi.map(|a| a.radians()),
        phi_j: protein.residues[j].phi.map(|a| a.radians()),
        psi_j: protein.residues[j].psi.map(|a| a.radians()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coord;
    use crate::residue::{AminoAcid, Residue, ResidueId};
    use crate::view::ViewCache;
    use std::collections::HashSet;

    fn protein_of(n: usize, seed: f64) -> Protein {
        let residues = (0..n)
            .map(|i| {
                let ca = Coord::new(i as f64 * 3.8, seed, 0.0);
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
    fn indexed_scan_matches_naive_scan_for_identical_structures() {
        let protein_a = protein_of(10, 0.0);
        let protein_b = protein_of(10, 0.0);
        let views_a = ViewCache::build(&protein_a);
        let views_b = ViewCache::build(&protein_b);
        let covering = OrientationCovering::octahedral_48();
        let criteria = MatchCriteria {
            minimum_sequence_separation: 2,
            ..MatchCriteria::default()
        };
        let index_a = ScanIndex::build(&protein_a, &views_a, &covering, 2.0, criteria.minimum_sequence_separation);
        let index_b = ScanIndex::build(&protein_b, &views_b, &covering, 2.0, criteria.minimum_sequence_separation);

        let indexed: HashSet<_> = scan_indexed(&index_a, &index_b, &covering, &criteria)
            .into_iter()
            .map(|q| (q.i_a, q.j_a, q.i_b, q.j_b))
            .collect();
        let naive: HashSet<_> = scan_naive(&protein_a, &views_a, &protein_b, &views_b, &criteria)
            .into_iter()
            .map(|q| (q.i_a, q.j_a, q.i_b, q.j_b))
            .collect();
        assert_eq!(indexed, naive);
    }
}
