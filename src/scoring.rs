//! The per-residue-pair context score: how similar two view vectors are,
//! turned into a single comparable number.
//!
//! Grounded on `context_res_vec`/`score_of_squared_distance` in
//! `ssap/context_res.hpp`: a squared-distance-based score that falls off to
//! zero past a cutoff, with two interchangeable formulae for the falloff
//! shape.

use crate::align::Alignment;
use crate::geometry::Coord;
use crate::view::ViewCache;

/// The squared distance, beyond which a residue-pair view-vector comparison
/// contributes nothing to the score.
pub const RESIDUE_MAX_DIST_SQ_CUTOFF: f64 = 400.0;
/// Numerator of the `UsedInPreviousCode` falloff, `a / (d^2 + b)`.
pub const RESIDUE_A_VALUE: f64 = 500.0;
/// Denominator offset of the `UsedInPreviousCode` falloff.
pub const RESIDUE_B_VALUE: f64 = 10.0;

/// The two context-score falloff shapes the original implementation
/// supported, resolved as a runtime choice (`spec.md` §9's Open Question)
/// rather than a compile-time one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScoreFormula {
    /// `a / (d^2 + b)`, zero beyond the cutoff distance. The classical SSAP
    /// formula and the default.
    UsedInPreviousCode,
    /// A linear falloff from the same maximum (`a / b` at `d = 0`) to zero at
    /// the same cutoff, cheaper to evaluate and easier to reason about.
    Simplified,
}

impl Default for ScoreFormula {
    fn default() -> Self {
        Self::UsedInPreviousCode
    }
}

/// The maximum score a single residue-pair comparison can contribute
/// (achieved at zero distance), used to normalise alignment scores.
#[must_use]
pub fn max_single_score() -> f64 {
    RESIDUE_A_VALUE / RESIDUE_B_VALUE
}

fn score_of_squared_distance(squared_distance: f64, formula: ScoreFormula) -> f64 {
    match formula {
        ScoreFormula::UsedInPreviousCode => {
            if squared_distance >= RESIDUE_MAX_DIST_SQ_CUTOFF {
                0.0
            } else {
                RESIDUE_A_VALUE / (squared_distance + RESIDUE_B_VALUE)
            }
        }
        ScoreFormula::Simplified => {
            let distance = squared_distance.sqrt();
            let cutoff_distance = RESIDUE_MAX_DIST_SQ_CUTOFF.sqrt();
            let slope = -1.0 / (4.9 * RESIDUE_B_VALUE).sqrt();
            let value = max_single_score() * (1.0 + slope * distance);
            if distance >= cutoff_distance {
                0.0
            } else {
                value.max(0.0)
            }
        }
    }
}

/// Compare two view vectors (one residue-pair's view in protein A, the
/// matching pair's view in protein B) and return the context-score
/// contribution under `formula`.
#[must_use]
pub fn context_score(a_view: Coord, b_view: Coord, formula: ScoreFormula) -> f64 {
    let squared_distance = (a_view - b_view).length_squared();
    score_of_squared_distance(squared_distance, formula)
}

/// The two-directional residue-pair context score `context_res(from_a,
/// from_b, to_a, to_b)` of `spec.md` §4.5: the average of the "forward"
/// comparison (`from_a` vs `from_b`) and the "backward" one (`to_a` vs
/// `to_b`), so a pair of positions scores well only if both structures agree
/// on the view in both directions between them.
#[must_use]
pub fn context_res(from_a: Coord, from_b: Coord, to_a: Coord, to_b: Coord, formula: ScoreFormula) -> f64 {
    (context_score(from_a, from_b, formula) + context_score(to_a, to_b, formula)) / 2.0
}

/// Score every occupied alignment row: for each row, and for every pair of
/// entries both present there, sum [`context_res`] against every other row
/// where that same pair of entries is also both present, then normalise by
/// `max_single_score() * comparisons` to land in `[0, 1]`. The resulting
/// per-row score is written into every entry cell present at that row
/// (`spec.md` §4.5's "these per-position scores populate the alignment's
/// score fields" — the column is scored as a whole, not per entry).
pub fn score_alignment(
    alignment: &mut Alignment,
    view_caches: &[ViewCache],
    formula: ScoreFormula,
) -> Result<(), crate::error::Error> {
    if view_caches.len() != alignment.num_entries() {
        return Err(crate::error::Error::InvalidArgument(format!(
            "{} view caches given for an alignment of {} entries",
            view_caches.len(),
            alignment.num_entries()
        )));
    }
    let num_rows = alignment.num_rows();
    let num_entries = alignment.num_entries();
    let mut row_scores = vec![0.0_f64; num_rows];
    for row in 0..num_rows {
        let mut total = 0.0;
        let mut comparisons = 0usize;
        for entry_a in 0..num_entries {
            let Some(pos_a_here) = alignment.row(row).position(entry_a) else {
                continue;
            };
            for entry_b in (entry_a + 1)..num_entries {
                let Some(pos_b_here) = alignment.row(row).position(entry_b) else {
                    continue;
                };
                for other_row in 0..num_rows {
                    if other_row == row {
                        continue;
                    }
                    let (Some(pos_a_other), Some(pos_b_other)) = (
                        alignment.row(other_row).position(entry_a),
                        alignment.row(other_row).position(entry_b),
                    ) else {
                        continue;
                    };
                    let from_a = view_caches[entry_a].view(pos_a_here, pos_a_other);
                    let from_b = view_caches[entry_b].view(pos_b_here, pos_b_other);
                    let to_a = view_caches[entry_a].view(pos_a_other, pos_a_here);
                    let to_b = view_caches[entry_b].view(pos_b_other, pos_b_here);
                    total += context_res(from_a, from_b, to_a, to_b, formula);
                    comparisons += 1;
                }
            }
        }
        row_scores[row] = if comparisons == 0 {
            0.0
        } else {
            (total / (max_single_score() * comparisons as f64)).clamp(0.0, 1.0)
        };
    }
    for row in 0..num_rows {
        for entry in 0..num_entries {
            if alignment.row(row).position(entry).is_some() {
                alignment.set_score(row, entry, row_scores[row])?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_gives_the_maximum_score() {
        let score = context_score(Coord::ZERO, Coord::ZERO, ScoreFormula::UsedInPreviousCode);
        assert!((score - max_single_score()).abs() < 1e-9);
    }

    #[test]
    fn beyond_cutoff_scores_zero_for_both_formulae() {
        let far = Coord::new(RESIDUE_MAX_DIST_SQ_CUTOFF.sqrt() + 1.0, 0.0, 0.0);
        assert_eq!(context_score(Coord::ZERO, far, ScoreFormula::UsedInPreviousCode), 0.0);
        assert_eq!(context_score(Coord::ZERO, far, ScoreFormula::Simplified), 0.0);
    }

    #[test]
    fn score_decreases_with_distance() {
        let near = context_score(Coord::ZERO, Coord::new(1.0, 0.0, 0.0), ScoreFormula::UsedInPreviousCode);
        let far = context_score(Coord::ZERO, Coord::new(5.0, 0.0, 0.0), ScoreFormula::UsedInPreviousCode);
        assert!(near > far);
    }

    fn straight_protein(n: usize) -> crate::protein::Protein {
        use crate::residue::{AminoAcid, Residue, ResidueId};
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
        crate::protein::Protein::new("t".into(), residues).unwrap()
    }

    #[test]
    fn identical_structures_score_near_the_maximum() {
        let protein_a = straight_protein(5);
        let protein_b = straight_protein(5);
        let views_a = ViewCache::build(&protein_a);
        let views_b = ViewCache::build(&protein_b);
        let mut alignment = Alignment::new(2);
        for i in 0..5 {
            alignment.push_row(vec![Some(i), Some(i)]).unwrap();
        }
        score_alignment(&mut alignment, &[views_a, views_b], ScoreFormula::UsedInPreviousCode).unwrap();
        for row in 0..5 {
            assert!(alignment.row(row).score(0).unwrap() > 0.9);
        }
    }

    #[test]
    fn mismatched_view_cache_count_is_rejected() {
        let protein_a = straight_protein(3);
        let views_a = ViewCache::build(&protein_a);
        let mut alignment = Alignment::new(2);
        alignment.push_row(vec![Some(0), Some(0)]).unwrap();
        assert!(score_alignment(&mut alignment, &[views_a], ScoreFormula::UsedInPreviousCode).is_err());
    }
}
