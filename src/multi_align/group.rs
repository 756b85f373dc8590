//! A growing multi-structure alignment: the set of original structures it
//! currently covers, and the `Alignment` gluing them together (`spec.md`
//! §4.7's incrementally-built `Group`).

use crate::align::Alignment;
use crate::error::Error;

/// A partially- or fully-built multi-structure alignment. `entries[i]` is
/// the original structure index behind the group's internal entry `i` —
/// the indirection [`crate::align::Alignment`] itself does not carry, since
/// an `Alignment` only knows about its own local entry numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    entries: Vec<usize>,
    alignment: Alignment,
}

impl Group {
    /// A fresh group containing a single structure, trivially aligned
    /// against itself: one row per residue.
    #[must_use]
    pub fn singleton(structure: usize, residue_count: usize) -> Self {
        let mut alignment = Alignment::new(1);
        for i in 0..residue_count {
            alignment
                .push_row(vec![Some(i)])
                .expect("identity rows are strictly increasing by construction");
        }
        Self {
            entries: vec![structure],
            alignment,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    #[must_use]
    pub const fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    #[must_use]
    pub fn contains(&self, structure: usize) -> bool {
        self.entries.contains(&structure)
    }

    /// The group-local entry index backing original structure `structure`.
    #[must_use]
    pub fn local_index(&self, structure: usize) -> Option<usize> {
        self.entries.iter().position(|&e| e == structure)
    }

    /// Fold a new structure `entry_b` into this group, given a 2-entry
    /// pairwise alignment `aln_ab` between `entry_a_in_self` (already a
    /// member of this group) and `entry_b` (not yet a member).
    ///
    /// Walks `aln_ab` row by row, merge-joined against this group's rows on
    /// `entry_a_in_self`'s position: rows where `aln_ab` has only `a`'s
    /// position get `b` glued in as a gap; rows where it has both place
    /// `b`'s residue alongside the rest of that row; rows where it has only
    /// `b` become new rows, gapped in every pre-existing entry. If `aln_ab`
    /// names an `a` position this group has no row for, that single row is
    /// skipped and a warning logged — `spec.md` §4.7's "sole recoverable
    /// inconsistency" during gluing.
    pub fn glue_in_alignment(
        &mut self,
        aln_ab: &Alignment,
        entry_a_in_self: usize,
        entry_b: usize,
    ) -> Result<(), Error> {
        if aln_ab.num_entries() != 2 {
            return Err(Error::InvalidArgument(
                "glue_in_alignment requires a 2-entry pairwise alignment".into(),
            ));
        }
        if entry_a_in_self >= self.entries.len() {
            return Err(Error::OutOfRange {
                index: entry_a_in_self,
                bound: self.entries.len(),
            });
        }
        if self.contains(entry_b) {
            return Err(Error::InvalidArgument(format!(
                "structure {entry_b} is already a member of this group"
            )));
        }

        let old_num_entries = self.alignment.num_entries();
        let self_rows = self.alignment.rows();
        let mut merged: Vec<Vec<Option<usize>>> = Vec::new();
        let mut i = 0usize;

        for ab_row in aln_ab.rows() {
            let a_pos = ab_row.position(0);
            let b_pos = ab_row.position(1);
            match a_pos {
                Some(a_pos) => {
                    while i < self_rows.len() && self_rows[i].position(entry_a_in_self) != Some(a_pos) {
                        merged.push(pass_through(&self_rows[i], old_num_entries));
                        i += 1;
                    }
                    if i < self_rows.len() && self_rows[i].position(entry_a_in_self) == Some(a_pos) {
                        let mut cols = pass_through(&self_rows[i], old_num_entries);
                        cols.pop();
                        cols.push(b_pos);
                        merged.push(cols);
                        i += 1;
                    } else {
                        log::warn!(
                            "glue_in_alignment: entry {entry_a_in_self} position {a_pos} is not present in this group; dropping that row of the incoming alignment"
                        );
                    }
                }
                None => {
                    let mut cols = vec![None; old_num_entries];
                    cols.push(b_pos);
                    merged.push(cols);
                }
            }
        }
        while i < self_rows.len() {
            merged.push(pass_through(&self_rows[i], old_num_entries));
            i += 1;
        }

        let mut new_alignment = Alignment::new(old_num_entries + 1);
        for cols in merged {
            new_alignment.push_row(cols)?;
        }
        self.alignment = new_alignment;
        self.entries.push(entry_b);
        Ok(())
    }

    /// Merge another, already-built group into this one, given a structure
    /// `shared` both groups contain. New entries from `other` (every entry
    /// it has that this group doesn't) are appended; rows are merge-joined
    /// on `shared`'s position in each group, with rows unique to either side
    /// carried across as gaps in the other's columns.
    pub fn glue_in_copy_of_group(&mut self, other: &Self, shared: usize) -> Result<(), Error> {
        let self_shared = self
            .local_index(shared)
            .ok_or_else(|| Error::InvalidArgument(format!("structure {shared} is not in this group")))?;
        let other_shared = other
            .local_index(shared)
            .ok_or_else(|| Error::InvalidArgument(format!("structure {shared} is not in the other group")))?;

        let new_entries: Vec<usize> = other
            .entries
            .iter()
            .copied()
            .filter(|e| !self.entries.contains(e))
            .collect();
        if new_entries.is_empty() {
            return Ok(());
        }

        let old_num_entries = self.alignment.num_entries();
        let self_rows = self.alignment.rows();
        let other_rows = other.alignment.rows();
        let mut merged: Vec<Vec<Option<usize>>> = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);

        loop {
            if i >= self_rows.len() && j >= other_rows.len() {
                break;
            }
            if i >= self_rows.len() {
                merged.push(other_only(other, &other_rows[j], &new_entries, old_num_entries));
                j += 1;
                continue;
            }
            if j >= other_rows.len() {
                merged.push(self_only(&self_rows[i], old_num_entries, new_entries.len()));
                i += 1;
                continue;
            }
            let self_key = self_rows[i].position(self_shared);
            let other_key = other_rows[j].position(other_shared);
            match (self_key, other_key) {
                (Some(sk), Some(ok)) if sk == ok => {
                    let mut cols = pass_through(&self_rows[i], old_num_entries);
                    for &entry in &new_entries {
                        let local = other.local_index(entry).expect("new_entries are other's own entries");
                        cols.push(other_rows[j].position(local));
                    }
                    merged.push(cols);
                    i += 1;
                    j += 1;
                }
                (Some(sk), Some(ok)) if sk < ok => {
                    merged.push(self_only(&self_rows[i], old_num_entries, new_entries.len()));
                    i += 1;
                }
                (Some(_), Some(_)) => {
                    merged.push(other_only(other, &other_rows[j], &new_entries, old_num_entries));
                    j += 1;
                }
                (None, _) => {
                    merged.push(self_only(&self_rows[i], old_num_entries, new_entries.len()));
                    i += 1;
                }
                (Some(_), None) => {
                    merged.push(other_only(other, &other_rows[j], &new_entries, old_num_entries));
                    j += 1;
                }
            }
        }

        let mut new_alignment = Alignment::new(old_num_entries + new_entries.len());
        for cols in merged {
            new_alignment.push_row(cols)?;
        }
        self.alignment = new_alignment;
        self.entries.extend(new_entries);
        Ok(())
    }

    /// Drop a member structure from the group (its column, and any row left
    /// entirely gapped as a result), used when re-gluing a refined pairwise
    /// alignment over an existing member.
    pub fn drop_entry(&mut self, structure: usize) -> Result<(), Error> {
        let local = self
            .local_index(structure)
            .ok_or_else(|| Error::InvalidArgument(format!("structure {structure} is not in this group")))?;
        let kept: Vec<usize> = (0..self.entries.len()).filter(|&e| e != local).collect();
        let mut new_alignment = Alignment::new(kept.len());
        for row in self.alignment.rows() {
            let cols: Vec<Option<usize>> = kept.iter().map(|&e| row.position(e)).collect();
            if cols.iter().any(Option::is_some) {
                new_alignment.push_row(cols)?;
            }
        }
        self.entries.remove(local);
        self.alignment = new_alignment;
        Ok(())
    }

    /// Reorder this group's entries to match `canonical_order` (a
    /// permutation of structure indices), returning the re-keyed alignment.
    pub fn into_canonical_alignment(self, canonical_order: &[usize]) -> Result<Alignment, Error> {
        let new_order: Vec<usize> = canonical_order
            .iter()
            .map(|&structure| {
                self.local_index(structure)
                    .ok_or_else(|| Error::InvalidArgument(format!("structure {structure} is not in this group")))
            })
            .collect::<Result<_, _>>()?;
        self.alignment.permute(&new_order)
    }
}

fn pass_through(row: &crate::align::Row, old_num_entries: usize) -> Vec<Option<usize>> {
    let mut cols: Vec<Option<usize>> = (0..old_num_entries).map(|e| row.position(e)).collect();
    cols.push(None);
    cols
}

fn self_only(row: &crate::align::Row, old_num_entries: usize, new_entry_count: usize) -> Vec<Option<usize>> {
    let mut cols: Vec<Option<usize>> = (0..old_num_entries).map(|e| row.position(e)).collect();
    cols.extend(std::iter::repeat(None).take(new_entry_count));
    cols
}

fn other_only(
    other: &Group,
    row: &crate::align::Row,
    new_entries: &[usize],
    old_num_entries: usize,
) -> Vec<Option<usize>> {
    let mut cols = vec![None; old_num_entries];
    for &entry in new_entries {
        let local = other.local_index(entry).expect("new_entries are other's own entries");
        cols.push(row.position(local));
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_is_an_identity_alignment() {
        let group = Group::singleton(3, 4);
        assert_eq!(group.entries(), &[3]);
        assert_eq!(group.alignment().num_rows(), 4);
        assert_eq!(group.alignment().row(2).position(0), Some(2));
    }

    #[test]
    fn glue_in_alignment_adds_a_new_member() {
        let mut group = Group::singleton(0, 3);
        let mut aln_ab = Alignment::new(2);
        aln_ab.push_row(vec![Some(0), Some(10)]).unwrap();
        aln_ab.push_row(vec![None, Some(11)]).unwrap();
        aln_ab.push_row(vec![Some(1), Some(12)]).unwrap();
        aln_ab.push_row(vec![Some(2), None]).unwrap();
        group.glue_in_alignment(&aln_ab, 0, 7).unwrap();
        assert_eq!(group.entries(), &[0, 7]);
        assert_eq!(group.alignment().num_rows(), 4);
        assert_eq!(group.alignment().row(0).position(1), Some(10));
        assert_eq!(group.alignment().row(1).position(0), None);
        assert_eq!(group.alignment().row(1).position(1), Some(11));
        assert_eq!(group.alignment().row(3).position(1), None);
    }

    #[test]
    fn glue_in_copy_of_group_merges_unique_entries() {
        let mut left = Group::singleton(0, 3);
        let mut ab = Alignment::new(2);
        ab.push_row(vec![Some(0), Some(0)]).unwrap();
        ab.push_row(vec![Some(1), Some(1)]).unwrap();
        ab.push_row(vec![Some(2), Some(2)]).unwrap();
        left.glue_in_alignment(&ab, 0, 1).unwrap();

        let mut right = Group::singleton(0, 3);
        let mut ac = Alignment::new(2);
        ac.push_row(vec![Some(0), Some(0)]).unwrap();
        ac.push_row(vec![Some(1), Some(1)]).unwrap();
        ac.push_row(vec![Some(2), Some(2)]).unwrap();
        right.glue_in_alignment(&ac, 0, 2).unwrap();

        left.glue_in_copy_of_group(&right, 0).unwrap();
        assert_eq!(left.entries(), &[0, 1, 2]);
        for row in 0..3 {
            assert_eq!(left.alignment().row(row).position(0), Some(row));
            assert_eq!(left.alignment().row(row).position(1), Some(row));
            assert_eq!(left.alignment().row(row).position(2), Some(row));
        }
    }

    #[test]
    fn drop_entry_removes_its_column() {
        let mut group = Group::singleton(0, 2);
        let mut aln_ab = Alignment::new(2);
        aln_ab.push_row(vec![Some(0), Some(9)]).unwrap();
        aln_ab.push_row(vec![Some(1), Some(10)]).unwrap();
        group.glue_in_alignment(&aln_ab, 0, 5).unwrap();
        group.drop_entry(5).unwrap();
        assert_eq!(group.entries(), &[0]);
        assert_eq!(group.alignment().num_entries(), 1);
    }
}
