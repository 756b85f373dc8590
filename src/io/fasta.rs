//! FASTA alignment text: one sequence per structure, in alignment-column
//! order, `-` for a gap (`spec.md` §6). Reading one back into an
//! [`Alignment`] needs the original [`Protein`]s, since a FASTA file alone
//! carries no residue identifiers to resolve positions against — only
//! one-letter codes, which this module cross-checks as it walks each
//! sequence.

use std::io::Write;

use crate::align::Alignment;
use crate::error::Error;
use crate::protein::Protein;

const WRAP_WIDTH: usize = 60;

fn parse_records(input: &str) -> Result<Vec<(String, String)>, Error> {
    let mut records = Vec::new();
    let mut current_header: Option<String> = None;
    let mut current_sequence = String::new();
    for line in input.lines() {
        if let Some(header) = line.trim_end().strip_prefix('>') {
            if let Some(previous_header) = current_header.take() {
                records.push((previous_header, std::mem::take(&mut current_sequence)));
            }
            current_header = Some(header.trim().to_string());
        } else if !line.trim().is_empty() {
            current_sequence.push_str(line.trim());
        }
    }
    if let Some(header) = current_header {
        records.push((header, current_sequence));
    }
    if records.is_empty() {
        return Err(Error::InvalidArgument("FASTA input has no `>` records".into()));
    }
    Ok(records)
}

/// Parse a FASTA alignment into an `Alignment` over `proteins` (entry `i`
/// is `proteins[i]`, matched to the `i`-th FASTA record in file order).
/// Every non-gap character is checked against the next unconsumed
/// residue's one-letter amino-acid code in that protein.
pub fn read_alignment(input: &str, proteins: &[&Protein]) -> Result<Alignment, Error> {
    let records = parse_records(input)?;
    if records.len() != proteins.len() {
        return Err(Error::InvalidArgument(format!(
            "FASTA alignment has {} records but {} proteins were given",
            records.len(),
            proteins.len()
        )));
    }
    let sequences: Vec<Vec<char>> = records.iter().map(|(_, seq)| seq.chars().collect()).collect();
    let width = sequences.first().map_or(0, Vec::len);
    if sequences.iter().any(|s| s.len() != width) {
        return Err(Error::InvalidArgument(
            "FASTA alignment records are not all the same length".into(),
        ));
    }

    let mut alignment = Alignment::new(proteins.len());
    let mut cursors = vec![0usize; proteins.len()];
    for column in 0..width {
        let mut positions = Vec::with_capacity(proteins.len());
        for entry in 0..proteins.len() {
            let c = sequences[entry][column];
            if c == '-' {
                positions.push(None);
                continue;
            }
            let cursor = cursors[entry];
            let residue = proteins[entry].residues.get(cursor).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "FASTA record {entry} has more residues than protein `{}` provides",
                    proteins[entry].name
                ))
            })?;
            let expected = residue.amino_acid.one_letter_code();
            if expected.to_ascii_uppercase() != c.to_ascii_uppercase() {
                return Err(Error::InvalidArgument(format!(
                    "FASTA record {entry} column {column}: expected `{expected}`, found `{c}`"
                )));
            }
            positions.push(Some(cursor));
            cursors[entry] += 1;
        }
        alignment.push_row(positions)?;
    }
    Ok(alignment)
}

/// Write `alignment` as FASTA, one record per entry named from `names`
/// (must have `alignment.num_entries()` entries), resolving residues
/// against `proteins` (same order) and wrapping sequence lines at 60
/// characters.
pub fn write(alignment: &Alignment, proteins: &[&Protein], names: &[&str], mut out: impl Write) -> Result<(), Error> {
    if names.len() != alignment.num_entries() || proteins.len() != alignment.num_entries() {
        return Err(Error::InvalidArgument(format!(
            "{} names and {} proteins given for a {}-entry alignment",
            names.len(),
            proteins.len(),
            alignment.num_entries()
        )));
    }
    for entry in 0..alignment.num_entries() {
        writeln!(out, ">{}", names[entry]).map_err(|e| Error::Runtime(format!("writing FASTA header failed: {e}")))?;
        let sequence: String = alignment
            .rows()
            .iter()
            .map(|row| {
                row.position(entry)
                    .map_or('-', |i| proteins[entry].residues[i].amino_acid.one_letter_code())
            })
            .collect();
        for chunk in sequence.as_bytes().chunks(WRAP_WIDTH) {
            let line = std::str::from_utf8(chunk).expect("one-letter codes and '-' are all ASCII");
            writeln!(out, "{line}").map_err(|e| Error::Runtime(format!("writing FASTA sequence failed: {e}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coord;
    use crate::residue::{AminoAcid, Residue, ResidueId};

    fn protein(name: &str, codes: &[AminoAcid]) -> Protein {
        let residues = codes
            .iter()
            .enumerate()
            .map(|(i, &amino_acid)| {
                let ca = Coord::new(i as f64 * 3.8, 0.0, 0.0);
                Residue::new(
                    ResidueId {
                        chain_label: 'A',
                        sequence_number: i as isize + 1,
                        insertion_code: None,
                    },
                    amino_acid,
                    ca + Coord::new(-0.5, 1.3, 0.0),
                    ca,
                    ca + Coord::new(1.5, 0.0, 0.0),
                    None,
                )
                .unwrap()
            })
            .collect();
        Protein::new(name.into(), residues).unwrap()
    }

    #[test]
    fn reads_a_gapped_two_entry_alignment() {
        use AminoAcid::{Ala, Gly, Leu, Val};
        let protein_a = protein("a", &[Ala, Gly, Leu]);
        let protein_b = protein("b", &[Ala, Leu]);
        let fasta = ">a\nAGL\n>b\nA-L\n";
        let alignment = read_alignment(fasta, &[&protein_a, &protein_b]).unwrap();
        assert_eq!(alignment.num_rows(), 3);
        assert_eq!(alignment.row(1).position(1), None);
        assert_eq!(alignment.row(2).position(1), Some(1));
        let _ = Val;
    }

    #[test]
    fn mismatched_residue_code_is_rejected() {
        use AminoAcid::{Ala, Gly};
        let protein_a = protein("a", &[Ala, Gly]);
        let protein_b = protein("b", &[Ala, Gly]);
        let fasta = ">a\nAG\n>b\nAA\n";
        assert!(read_alignment(fasta, &[&protein_a, &protein_b]).is_err());
    }

    #[test]
    fn write_then_read_round_trips() {
        use AminoAcid::{Ala, Gly, Leu};
        let protein_a = protein("a", &[Ala, Gly, Leu]);
        let protein_b = protein("b", &[Ala, Leu]);
        let mut alignment = Alignment::new(2);
        alignment.push_row(vec![Some(0), Some(0)]).unwrap();
        alignment.push_row(vec![Some(1), None]).unwrap();
        alignment.push_row(vec![Some(2), Some(1)]).unwrap();

        let mut buffer = Vec::new();
        write(&alignment, &[&protein_a, &protein_b], &["a", "b"], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let round_tripped = read_alignment(&text, &[&protein_a, &protein_b]).unwrap();
        assert_eq!(round_tripped, alignment);
    }
}
