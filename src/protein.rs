//! A protein: an ordered chain of residues plus their derived secondary
//! structure segments.

use crate::error::Error;
use crate::residue::{Residue, SecondaryStructureClass};
use crate::secondary_structure::Segment;

/// A single protein structure, as consumed by the pairwise aligner, the scan
/// index and the multi-alignment builder. Hosts build these from whatever
/// format they parse (PDB, mmCIF, ...); this crate only ever reads them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Protein {
    /// A host-assigned identifier (PDB code, domain id, ...), opaque to this
    /// crate beyond being carried through into output.
    pub name: String,
    pub residues: Vec<Residue>,
    pub secondary_structure: Vec<Segment>,
}

impl Protein {
    /// Build a protein from its residues, deriving secondary-structure
    /// segments by grouping consecutive residues sharing a
    /// [`SecondaryStructureClass`] (other than [`SecondaryStructureClass::Coil`],
    /// which is never segmented) and keeping only runs of at least
    /// [`MINIMUM_SEGMENT_LENGTH`] residues, per `spec.md` §3.
    pub fn new(name: String, residues: Vec<Residue>) -> Result<Self, Error> {
        let secondary_structure = derive_segments(&residues)?;
        Ok(Self {
            name,
            residues,
            secondary_structure,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// `spec.md` §3: segments are only produced for "runs of length ≥ 4 of a
/// single non-coil class"; shorter runs are too noisy to fit a reliable axis
/// through and are left unsegmented (their residues remain in the protein
/// but contribute to no [`Segment`]).
pub const MINIMUM_SEGMENT_LENGTH: usize = 4;

fn derive_segments(residues: &[Residue]) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();
    let mut run_start = None;
    let last = residues.len().saturating_sub(1);
    let mut close_run = |segments: &mut Vec<Segment>, class, start, end| -> Result<(), Error> {
        if end - start + 1 >= MINIMUM_SEGMENT_LENGTH {
            segments.push(Segment::fit(class, residues, start, end)?);
        }
        Ok(())
    };
    for (i, residue) in residues.iter().enumerate() {
        match (run_start, residue.secondary_structure) {
            (None, SecondaryStructureClass::Coil) => {}
            (None, class) => run_start = Some((i, class)),
            (Some((start, class)), current) if current == class => {
                if i == last {
                    close_run(&mut segments, class, start, i)?;
                    run_start = None;
                }
            }
            (Some((start, class)), current) => {
                close_run(&mut segments, class, start, i - 1)?;
                run_start = if current == SecondaryStructureClass::Coil {
                    None
                } else {
                    Some((i, current))
                };
                if i == last {
                    if let Some((start, class)) = run_start.take() {
                        close_run(&mut segments, class, start, i)?;
                    }
                }
            }
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coord;
    use crate::residue::{AminoAcid, ResidueId};

    fn residue(i: usize, class: SecondaryStructureClass) -> Residue {
        let ca = Coord::new(i as f64 * 1.5, 0.0, 0.0);
        let mut r = Residue::new(
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
        .unwrap();
        r.secondary_structure = class;
        r
    }

    #[test]
    fn consecutive_helix_residues_form_one_segment() {
        use SecondaryStructureClass::{AlphaHelix, Coil};
        let residues = vec![
            residue(0, Coil),
            residue(1, AlphaHelix),
            residue(2, AlphaHelix),
            residue(3, AlphaHelix),
            residue(4, AlphaHelix),
            residue(5, Coil),
        ];
        let protein = Protein::new("test".into(), residues).unwrap();
        assert_eq!(protein.secondary_structure.len(), 1);
        assert_eq!(protein.secondary_structure[0].start, 1);
        assert_eq!(protein.secondary_structure[0].end, 4);
    }

    #[test]
    fn runs_shorter_than_the_minimum_length_are_not_segmented() {
        use SecondaryStructureClass::{AlphaHelix, Coil};
        let residues = vec![
            residue(0, Coil),
            residue(1, AlphaHelix),
            residue(2, AlphaHelix),
            residue(3, AlphaHelix),
            residue(4, Coil),
        ];
        let protein = Protein::new("test".into(), residues).unwrap();
        assert!(protein.secondary_structure.is_empty());
    }
}
