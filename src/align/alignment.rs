//! The core multi-entry alignment data structure: rows of per-entry
//! positions (or gaps), optional per-cell scores, splitting and
//! permutation.
//!
//! Grounded on `rustyms-align`'s `alignment.rs` (an `Alignment`/`Piece`-based
//! pairwise structure), generalised here to an arbitrary, fixed number of
//! entries per `spec.md` §3 ("Alignment").

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One row of an alignment: for every entry, either a position into that
/// entry's residue list, or `None` for a gap; plus, once scored, an optional
/// per-entry-cell score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    positions: Vec<Option<usize>>,
    scores: Vec<Option<f64>>,
}

impl Row {
    fn new(positions: Vec<Option<usize>>) -> Self {
        let scores = vec![None; positions.len()];
        Self { positions, scores }
    }

    #[must_use]
    pub fn position(&self, entry: usize) -> Option<usize> {
        self.positions.get(entry).copied().flatten()
    }

    #[must_use]
    pub fn score(&self, entry: usize) -> Option<f64> {
        self.scores.get(entry).copied().flatten()
    }

    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_gap_everywhere(&self) -> bool {
        self.positions.iter().all(Option::is_none)
    }
}

/// An alignment over a fixed number of entries (one per structure), built
/// row by row. Rows are appended during construction and never mutated
/// afterward except to annotate per-cell scores, per `spec.md` §3's
/// "Alignment row lifecycle".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    num_entries: usize,
    rows: Vec<Row>,
}

impl Alignment {
    /// An empty alignment over `num_entries` entries.
    #[must_use]
    pub const fn new(num_entries: usize) -> Self {
        Self {
            num_entries,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub const fn num_entries(&self) -> usize {
        self.num_entries
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, index: usize) -> &Row {
        &self.rows[index]
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Append a row, checking that `positions` has exactly `num_entries`
    /// entries and that each entry's positions remain strictly increasing
    /// along the rows (`spec.md` §3's monotonicity invariant).
    pub fn push_row(&mut self, positions: Vec<Option<usize>>) -> Result<(), Error> {
        if positions.len() != self.num_entries {
            return Err(Error::InvalidArgument(format!(
                "row has {} entries, alignment has {}",
                positions.len(),
                self.num_entries
            )));
        }
        for (entry, &position) in positions.iter().enumerate() {
            if let Some(position) = position {
                if let Some(previous) = self.last_position(entry) {
                    if position <= previous {
                        return Err(Error::InvalidArgument(format!(
                            "entry {entry} position {position} does not strictly increase past {previous}"
                        )));
                    }
                }
            }
        }
        self.rows.push(Row::new(positions));
        Ok(())
    }

    fn last_position(&self, entry: usize) -> Option<usize> {
        self.rows.iter().rev().find_map(|row| row.position(entry))
    }

    /// Annotate the score of a single `(row, entry)` cell. No-op on the
    /// cell's invariant (scores never affect monotonicity), but fails on an
    /// out-of-range row or entry.
    pub fn set_score(&mut self, row: usize, entry: usize, score: f64) -> Result<(), Error> {
        let row_count = self.rows.len();
        let row_ref = self.rows.get_mut(row).ok_or(Error::OutOfRange {
            index: row,
            bound: row_count,
        })?;
        let cell = row_ref
            .scores
            .get_mut(entry)
            .ok_or(Error::OutOfRange { index: entry, bound: self.num_entries })?;
        *cell = Some(score);
        Ok(())
    }

    /// Reorder entries globally. `new_order[i]` is the original entry index
    /// that becomes entry `i`; monotonicity within each entry is preserved
    /// since only columns move, not rows.
    pub fn permute(&self, new_order: &[usize]) -> Result<Self, Error> {
        if new_order.len() != self.num_entries {
            return Err(Error::InvalidArgument(format!(
                "permutation has {} entries, alignment has {}",
                new_order.len(),
                self.num_entries
            )));
        }
        let mut seen = vec![false; self.num_entries];
        for &entry in new_order {
            let flag = seen.get_mut(entry).ok_or(Error::OutOfRange {
                index: entry,
                bound: self.num_entries,
            })?;
            if *flag {
                return Err(Error::InvalidArgument(format!(
                    "permutation repeats entry {entry}"
                )));
            }
            *flag = true;
        }
        let rows = self
            .rows
            .iter()
            .map(|row| Row {
                positions: new_order.iter().map(|&e| row.positions[e]).collect(),
                scores: new_order.iter().map(|&e| row.scores[e]).collect(),
            })
            .collect();
        Ok(Self {
            num_entries: self.num_entries,
            rows,
        })
    }

    /// Split this alignment into two complementary halves by entry
    /// membership. `side_a` names the entries kept (in their original
    /// relative order) by the first returned alignment; every other entry
    /// goes to the second. Rows that are gaps in every entry of a side are
    /// dropped from that side's alignment.
    ///
    /// Returns `(alignment_a, mapping_a, alignment_b, mapping_b)` per
    /// `spec.md` §4.6's `alignment_split`/`alignment_split_mapping`.
    pub fn split(&self, side_a: &[usize]) -> Result<(Self, SplitMapping, Self, SplitMapping), Error> {
        if side_a.is_empty() || side_a.len() >= self.num_entries {
            return Err(Error::InvalidArgument(
                "split requires a non-empty, proper subset of entries".into(),
            ));
        }
        let mut seen = vec![false; self.num_entries];
        for &entry in side_a {
            let flag = seen.get_mut(entry).ok_or(Error::OutOfRange {
                index: entry,
                bound: self.num_entries,
            })?;
            if *flag {
                return Err(Error::InvalidArgument(format!("entry {entry} named twice in split")));
            }
            *flag = true;
        }
        let side_b: Vec<usize> = (0..self.num_entries).filter(|e| !side_a.contains(e)).collect();
        let (alignment_a, mapping_a) = self.project(side_a);
        let (alignment_b, mapping_b) = self.project(&side_b);
        Ok((alignment_a, mapping_a, alignment_b, mapping_b))
    }

    fn project(&self, entries: &[usize]) -> (Self, SplitMapping) {
        let mut out = Self::new(entries.len());
        let mut row_map = vec![None; self.num_rows()];
        let mut entry_map = vec![None; self.num_entries];
        for (new_index, &original_entry) in entries.iter().enumerate() {
            entry_map[original_entry] = Some(new_index);
        }
        for (original_row, row) in self.rows.iter().enumerate() {
            let positions: Vec<Option<usize>> = entries.iter().map(|&e| row.position(e)).collect();
            if positions.iter().any(Option::is_some) {
                row_map[original_row] = Some(out.num_rows());
                out.push_row(positions)
                    .expect("projecting a subset of entries preserves monotonicity");
            }
        }
        let mapping = SplitMapping {
            original_num_entries: self.num_entries,
            original_num_rows: self.num_rows(),
            entry_map,
            row_map,
        };
        (out, mapping)
    }
}

/// The mapping one half of an `Alignment::split` carries back to the
/// original alignment: which original entry/row each of the half's
/// entries/rows came from, and (by absence) which original rows were
/// dropped because this half had no data there.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitMapping {
    original_num_entries: usize,
    original_num_rows: usize,
    entry_map: Vec<Option<usize>>,
    row_map: Vec<Option<usize>>,
}

impl SplitMapping {
    #[must_use]
    pub const fn original_num_entries(&self) -> usize {
        self.original_num_entries
    }

    #[must_use]
    pub const fn original_num_rows(&self) -> usize {
        self.original_num_rows
    }

    /// The new entry index `original_entry` was mapped to in this half, if
    /// it belongs to this half.
    #[must_use]
    pub fn new_entry(&self, original_entry: usize) -> Option<usize> {
        self.entry_map.get(original_entry).copied().flatten()
    }

    /// The new row index `original_row` was mapped to in this half, if this
    /// half kept a row there.
    #[must_use]
    pub fn new_row(&self, original_row: usize) -> Option<usize> {
        self.row_map.get(original_row).copied().flatten()
    }

    /// An original row this half has no data for: present only in the
    /// complementary half ("inserted" relative to this one).
    #[must_use]
    pub fn is_inserted_relative_to_this_half(&self, original_row: usize) -> bool {
        self.row_map.get(original_row).copied().flatten().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Alignment {
        // entries A, B, C, D; 6 columns matching spec.md §8 scenario 5.
        let mut a = Alignment::new(4);
        a.push_row(vec![None, Some(0), Some(0), Some(0)]).unwrap();
        a.push_row(vec![Some(1), Some(1), Some(1), Some(1)]).unwrap();
        a.push_row(vec![Some(2), None, Some(2), None]).unwrap();
        a.push_row(vec![Some(4), None, Some(3), None]).unwrap();
        a.push_row(vec![Some(5), Some(2), Some(4), Some(3)]).unwrap();
        a.push_row(vec![None, Some(4), Some(5), Some(4)]).unwrap();
        a
    }

    #[test]
    fn rejects_non_monotonic_rows() {
        let mut a = Alignment::new(2);
        a.push_row(vec![Some(1), Some(0)]).unwrap();
        assert!(a.push_row(vec![Some(0), Some(1)]).is_err());
    }

    #[test]
    fn rejects_wrong_row_width() {
        let mut a = Alignment::new(3);
        assert!(a.push_row(vec![Some(0), Some(0)]).is_err());
    }

    #[test]
    fn permute_reorders_columns_but_keeps_rows() {
        let a = sample();
        let permuted = a.permute(&[2, 0, 1, 3]).unwrap();
        assert_eq!(permuted.num_rows(), a.num_rows());
        assert_eq!(permuted.row(0).position(0), a.row(0).position(2));
        assert_eq!(permuted.row(0).position(1), a.row(0).position(0));
    }

    #[test]
    fn permute_rejects_a_repeated_entry() {
        let a = sample();
        assert!(a.permute(&[0, 0, 1, 3]).is_err());
    }

    #[test]
    fn split_into_complementary_halves_preserves_every_row_with_data() {
        let a = sample();
        let (half_a, mapping_a, half_b, mapping_b) = a.split(&[0, 2]).unwrap();
        assert_eq!(half_a.num_entries(), 2);
        assert_eq!(half_b.num_entries(), 2);
        // Every row has data in at least one half since entries 0,2 and 1,3
        // partition all four entries and no row is all-gap across all four.
        for row in 0..a.num_rows() {
            assert!(mapping_a.new_row(row).is_some() || mapping_b.new_row(row).is_some());
        }
        assert_eq!(mapping_a.new_entry(0), Some(0));
        assert_eq!(mapping_a.new_entry(2), Some(1));
        assert_eq!(mapping_b.new_entry(1), Some(0));
        assert_eq!(mapping_b.new_entry(3), Some(1));
    }

    #[test]
    fn split_rejects_an_empty_or_full_side() {
        let a = sample();
        assert!(a.split(&[]).is_err());
        assert!(a.split(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn set_score_round_trips() {
        let mut a = sample();
        a.set_score(1, 0, 0.75).unwrap();
        assert!((a.row(1).score(0).unwrap() - 0.75).abs() < 1e-12);
        assert!(a.row(1).score(1).is_none());
    }
}
