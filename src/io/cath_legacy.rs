//! The CATH-legacy pairwise alignment file: one line per aligned position,
//! each carrying a residue identifier for structure A and one for structure
//! B (`-` for a gap), resolved against the original [`Protein`]s into a
//! 2-entry [`Alignment`] (`spec.md` §6).

use std::io::Write;

use crate::align::Alignment;
use crate::error::Error;
use crate::protein::Protein;
use crate::residue::ResidueId;

fn parse_token(token: &str) -> Result<Option<ResidueId>, Error> {
    if token == "-" {
        return Ok(None);
    }
    let mut chars = token.chars();
    let chain_label = chars
        .next()
        .ok_or_else(|| Error::InvalidArgument("residue identifier is empty".into()))?;
    let rest: String = chars.collect();
    let (number_part, insertion_code) = match rest.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (rest[..rest.len() - c.len_utf8()].to_string(), Some(c)),
        _ => (rest, None),
    };
    let sequence_number: isize = number_part
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("malformed residue identifier `{token}`")))?;
    Ok(Some(ResidueId {
        chain_label,
        sequence_number,
        insertion_code,
    }))
}

fn format_token(id: ResidueId) -> String {
    match id.insertion_code {
        Some(c) => format!("{}{}{}", id.chain_label, id.sequence_number, c),
        None => format!("{}{}", id.chain_label, id.sequence_number),
    }
}

fn find_index(protein: &Protein, id: ResidueId, line_number: usize, line: &str) -> Result<usize, Error> {
    protein
        .residues
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "cath-legacy line {line_number}: no residue {} in `{}`: `{line}`",
                format_token(id),
                protein.name
            ))
        })
}

/// Parse `input` into a 2-entry `Alignment` between `protein_a` and
/// `protein_b`.
pub fn parse(input: &str, protein_a: &Protein, protein_b: &Protein) -> Result<Alignment, Error> {
    let mut alignment = Alignment::new(2);
    for (i, line) in input.lines().enumerate() {
        let line_number = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(Error::InvalidArgument(format!(
                "cath-legacy line {line_number}: expected 2 fields, got {}: `{line}`",
                fields.len()
            )));
        }
        let id_a = parse_token(fields[0])?;
        let id_b = parse_token(fields[1])?;
        let pos_a = id_a.map(|id| find_index(protein_a, id, line_number, line)).transpose()?;
        let pos_b = id_b.map(|id| find_index(protein_b, id, line_number, line)).transpose()?;
        alignment.push_row(vec![pos_a, pos_b])?;
    }
    Ok(alignment)
}

/// Write a 2-entry `Alignment` back out in the same format `parse` reads.
pub fn write(alignment: &Alignment, protein_a: &Protein, protein_b: &Protein, mut out: impl Write) -> Result<(), Error> {
    if alignment.num_entries() != 2 {
        return Err(Error::InvalidArgument(
            "cath-legacy format only supports 2-entry alignments".into(),
        ));
    }
    for row in alignment.rows() {
        let token_a = row
            .position(0)
            .map_or_else(|| "-".to_string(), |i| format_token(protein_a.residues[i].id));
        let token_b = row
            .position(1)
            .map_or_else(|| "-".to_string(), |i| format_token(protein_b.residues[i].id));
        writeln!(out, "{token_a} {token_b}").map_err(|e| Error::Runtime(format!("writing cath-legacy record failed: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Coord;
    use crate::residue::{AminoAcid, Residue};

    fn protein(name: &str, chain: char, n: usize) -> Protein {
        let residues = (0..n)
            .map(|i| {
                let ca = Coord::new(i as f64 * 3.8, 0.0, 0.0);
                Residue::new(
                    ResidueId {
                        chain_label: chain,
                        sequence_number: i as isize + 1,
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
        Protein::new(name.into(), residues).unwrap()
    }

    #[test]
    fn parses_a_simple_one_to_one_alignment() {
        let protein_a = protein("a", 'A', 3);
        let protein_b = protein("b", 'B', 3);
        let text = "A1 B1\nA2 B2\nA3 B3\n";
        let alignment = parse(text, &protein_a, &protein_b).unwrap();
        assert_eq!(alignment.num_rows(), 3);
        assert_eq!(alignment.row(1).position(0), Some(1));
        assert_eq!(alignment.row(1).position(1), Some(1));
    }

    #[test]
    fn gaps_are_recognised() {
        let protein_a = protein("a", 'A', 2);
        let protein_b = protein("b", 'B', 1);
        let text = "A1 -\nA2 B1\n";
        let alignment = parse(text, &protein_a, &protein_b).unwrap();
        assert_eq!(alignment.row(0).position(1), None);
        assert_eq!(alignment.row(1).position(1), Some(0));
    }

    #[test]
    fn unknown_residue_is_rejected() {
        let protein_a = protein("a", 'A', 1);
        let protein_b = protein("b", 'B', 1);
        assert!(parse("A9 B1\n", &protein_a, &protein_b).is_err());
    }

    #[test]
    fn write_round_trips_through_parse() {
        let protein_a = protein("a", 'A', 2);
        let protein_b = protein("b", 'B', 2);
        let mut alignment = Alignment::new(2);
        alignment.push_row(vec![Some(0), Some(0)]).unwrap();
        alignment.push_row(vec![Some(1), None]).unwrap();
        let mut buffer = Vec::new();
        write(&alignment, &protein_a, &protein_b, &mut buffer).unwrap();
        let round_tripped = parse(std::str::from_utf8(&buffer).unwrap(), &protein_a, &protein_b).unwrap();
        assert_eq!(round_tripped, alignment);
    }
}
