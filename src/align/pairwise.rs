//! A generic banded, affine-gap dynamic-programming engine shared by both
//! levels of the SSAP aligner: the per-outer-pair inner DP and the final DP
//! over the averaged score matrix use the same engine with different score
//! functions.

use super::align_type::Type;

const NEG_INFINITY: f64 = f64::NEG_INFINITY;

/// The result of running the DP engine: the optimal score and, for every
/// step along the optimal traceback, which positions (if any) in A and B it
/// consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DpResult {
    pub score: f64,
    /// One entry per aligned column, in order: `(position in A, position in B)`.
    pub path: Vec<(Option<usize>, Option<usize>)>,
}

/// Which matrix a cell's optimum came from; used to drive the traceback
/// without re-deriving costs from the score tables.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Lane {
    Match,
    GapInB,
    GapInA,
}

/// Run a banded, affine-gap DP aligning `0..len_a` against `0..len_b`.
///
/// `score` is called with `(p, q)` (0-indexed positions in A and B) for
/// every cell the band covers; `gap_open` and `gap_extend` are costs
/// (subtracted as penalties, so pass non-negative values). `band` limits
/// `|p - q|` to at most that many positions when `Some`; `None` means
/// unbanded (full `O(len_a * len_b)` table).
#[must_use]
pub fn align(
    len_a: usize,
    len_b: usize,
    score: impl Fn(usize, usize) -> f64,
    gap_open: f64,
    gap_extend: f64,
    ty: Type,
    band: Option<usize>,
) -> DpResult {
    let rows = len_a + 1;
    let cols = len_b + 1;
    let in_band = |i: usize, j: usize| -> bool { band.is_none_or(|b| i.abs_diff(j) <= b) };
    let at = |i: usize, j: usize| i * cols + j;

    // Three matrices: M (match/mismatch ending here), Ix (gap in B, i.e. a
    // step along A only), Iy (gap in A, i.e. a step along B only). Each cell
    // in M also remembers which lane fed it, so the traceback is a direct
    // lookup rather than a re-derivation of the recurrence.
    let mut m = vec![NEG_INFINITY; rows * cols];
    let mut ix = vec![NEG_INFINITY; rows * cols];
    let mut iy = vec![NEG_INFINITY; rows * cols];
    let mut m_from = vec![Lane::Match; rows * cols];
    let mut ix_from_extend = vec![false; rows * cols];
    let mut iy_from_extend = vec![false; rows * cols];

    m[at(0, 0)] = 0.0;
    if ty.global() {
        for i in 1..rows {
            if in_band(i, 0) {
                ix[at(i, 0)] = -gap_open - gap_extend * (i - 1) as f64;
                ix_from_extend[at(i, 0)] = i > 1;
            }
        }
        for j in 1..cols {
            if in_band(0, j) {
                iy[at(0, j)] = -gap_open - gap_extend * (j - 1) as f64;
                iy_from_extend[at(0, j)] = j > 1;
            }
        }
    } else {
        for i in 1..rows {
            if in_band(i, 0) {
                m[at(i, 0)] = 0.0;
            }
        }
        for j in 1..cols {
            if in_band(0, j) {
                m[at(0, j)] = 0.0;
            }
        }
    }

    for i in 1..rows {
        for j in 1..cols {
            if !in_band(i, j) {
                continue;
            }
            let diag = at(i - 1, j - 1);
            let s = score(i - 1, j - 1);
            let candidates = [m[diag], ix[diag], iy[diag]];
            let lane = argmax_last(&candidates);
            let best_incoming = candidates[lane];
            let here = at(i, j);
            if best_incoming.is_finite() {
                m[here] = best_incoming + s;
                m_from[here] = match lane {
                    0 => Lane::Match,
                    1 => Lane::GapInB,
                    _ => Lane::GapInA,
                };
            } else if i == 1 && j == 1 {
                m[here] = s;
                m_from[here] = Lane::Match;
            }
            if !ty.global() && m[here] < s {
                m[here] = s;
                m_from[here] = Lane::Match;
            }
            if !ty.global() && m[here] < 0.0 {
                m[here] = 0.0;
            }

            let open_from_m = m[at(i - 1, j)] - gap_open;
            let extend_from_ix = ix[at(i - 1, j)] - gap_extend;
            if extend_from_ix > open_from_m {
                ix[here] = extend_from_ix;
                ix_from_extend[here] = true;
            } else {
                ix[here] = open_from_m;
                ix_from_extend[here] = false;
            }

            let open_from_m_y = m[at(i, j - 1)] - gap_open;
            let extend_from_iy = iy[at(i, j - 1)] - gap_extend;
            if extend_from_iy > open_from_m_y {
                iy[here] = extend_from_iy;
                iy_from_extend[here] = true;
            } else {
                iy[here] = open_from_m_y;
                iy_from_extend[here] = false;
            }
        }
    }

    let (end_i, end_j, best_score) = find_end(len_a, len_b, ty, &m, &ix, &iy, at, &in_band);
    let path = traceback(
        end_i,
        end_j,
        &m,
        &ix,
        &iy,
        &m_from,
        &ix_from_extend,
        &iy_from_extend,
        at,
        ty,
    );
    DpResult {
        score: best_score,
        path,
    }
}

#[allow(clippy::too_many_arguments)]
fn find_end(
    len_a: usize,
    len_b: usize,
    ty: Type,
    m: &[f64],
    ix: &[f64],
    iy: &[f64],
    at: impl Fn(usize, usize) -> usize,
    in_band: &impl Fn(usize, usize) -> bool,
) -> (usize, usize, f64) {
    match ty {
        Type::Global => {
            let i = len_a;
            let j = len_b;
            let best = m[at(i, j)].max(ix[at(i, j)]).max(iy[at(i, j)]);
            (i, j, best)
        }
        Type::GlobalForB => {
            let j = len_b;
            let mut best = NEG_INFINITY;
            let mut best_i = 0;
            for i in 0..=len_a {
                if !in_band(i, j) {
                    continue;
                }
                let value = m[at(i, j)].max(ix[at(i, j)]).max(iy[at(i, j)]);
                // Highest-indexed predecessor wins ties, per the aligner's
                // determinism rule.
                if value >= best {
                    best = value;
                    best_i = i;
                }
            }
            (best_i, j, best)
        }
        Type::Local => {
            let mut best = 0.0;
            let mut best_cell = (0, 0);
            for i in 0..=len_a {
                for j in 0..=len_b {
                    if !in_band(i, j) {
                        continue;
                    }
                    let value = m[at(i, j)];
                    if value >= best {
                        best = value;
                        best_cell = (i, j);
                    }
                }
            }
            (best_cell.0, best_cell.1, best)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn traceback(
    mut i: usize,
    mut j: usize,
    m: &[f64],
    ix: &[f64],
    iy: &[f64],
    m_from: &[Lane],
    ix_from_extend: &[bool],
    iy_from_extend: &[bool],
    at: impl Fn(usize, usize) -> usize,
    ty: Type,
) -> Vec<(Option<usize>, Option<usize>)> {
    let mut path = Vec::new();
    let mut lane = {
        let values = [m[at(i, j)], ix[at(i, j)], iy[at(i, j)]];
        match argmax_last(&values) {
            0 => Lane::Match,
            1 => Lane::GapInB,
            _ => Lane::GapInA,
        }
    };
    while i > 0 || j > 0 {
        if !ty.global() && lane == Lane::Match && m[at(i, j)] <= 0.0 {
            break;
        }
        match lane {
            Lane::Match if i > 0 && j > 0 => {
                path.push((Some(i - 1), Some(j - 1)));
                lane = m_from[at(i, j)];
                i -= 1;
                j -= 1;
            }
            Lane::GapInB if i > 0 => {
                path.push((Some(i - 1), None));
                lane = if ix_from_extend[at(i, j)] {
                    Lane::GapInB
                } else {
                    Lane::Match
                };
                i -= 1;
            }
            Lane::GapInA if j > 0 => {
                path.push((None, Some(j - 1)));
                lane = if iy_from_extend[at(i, j)] {
                    Lane::GapInA
                } else {
                    Lane::Match
                };
                j -= 1;
            }
            _ => break,
        }
    }
    path.reverse();
    path
}

fn argmax_last(values: &[f64; 3]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if values[i] >= values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_align_on_the_diagonal() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = a;
        let result = align(
            a.len(),
            b.len(),
            |p, q| if (a[p] - b[q]).abs() < 1e-9 { 10.0 } else { -5.0 },
            8.0,
            1.0,
            Type::Global,
            None,
        );
        assert_eq!(result.path.len(), 4);
        for (k, (pa, pb)) in result.path.iter().enumerate() {
            assert_eq!(*pa, Some(k));
            assert_eq!(*pb, Some(k));
        }
        assert!((result.score - 40.0).abs() < 1e-9);
    }

    #[test]
    fn an_inserted_residue_forces_a_gap() {
        let a = [1.0, 2.0, 99.0, 3.0, 4.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let result = align(
            a.len(),
            b.len(),
            |p, q| if (a[p] - b[q]).abs() < 1e-9 { 10.0 } else { -5.0 },
            4.0,
            1.0,
            Type::Global,
            None,
        );
        let gaps_in_b = result.path.iter().filter(|(_, pb)| pb.is_none()).count();
        assert_eq!(gaps_in_b, 1);
        let gaps_in_a = result.path.iter().filter(|(pa, _)| pa.is_none()).count();
        assert_eq!(gaps_in_a, 0);
    }

    #[test]
    fn local_alignment_only_covers_the_matching_patch() {
        let a = [9.0, 9.0, 1.0, 2.0, 3.0, 9.0, 9.0];
        let b = [1.0, 2.0, 3.0];
        let result = align(
            a.len(),
            b.len(),
            |p, q| if (a[p] - b[q]).abs() < 1e-9 { 10.0 } else { -20.0 },
            5.0,
            1.0,
            Type::Local,
            None,
        );
        assert_eq!(result.path.len(), 3);
        assert!(result.path.iter().all(|(pa, pb)| pa.is_some() && pb.is_some()));
    }

    #[test]
    fn banding_restricts_reachable_cells_without_crashing() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = align(
            a.len(),
            b.len(),
            |p, q| if (a[p] - b[q]).abs() < 1e-9 { 10.0 } else { -5.0 },
            8.0,
            1.0,
            Type::Global,
            Some(1),
        );
        assert!((result.score - 50.0).abs() < 1e-9);
    }
}
