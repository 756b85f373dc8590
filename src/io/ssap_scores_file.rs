//! The SSAP-scores file: one pairwise-comparison summary per line,
//! whitespace-separated (`spec.md` §6), used to seed a multi-alignment's
//! spanning tree without re-running every pairwise SSAP.

use std::io::Write;

use crate::error::Error;

/// One record: `name_a name_b length_a length_b ssap_score num_aligned rmsd seq_id overlap`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreRecord {
    pub name_a: String,
    pub name_b: String,
    pub length_a: usize,
    pub length_b: usize,
    pub ssap_score: f64,
    pub num_aligned: usize,
    pub rmsd: f64,
    pub seq_id: f64,
    pub overlap: f64,
}

/// Parse every non-blank line of `input` as a [`ScoreRecord`]. A malformed
/// line fails with [`Error::InvalidArgument`] naming the offending line,
/// per `spec.md` §7's "parsers surface malformed records with the
/// offending line".
pub fn parse(input: &str) -> Result<Vec<ScoreRecord>, Error> {
    let mut records = Vec::new();
    for (line_number, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 9 {
            return Err(Error::InvalidArgument(format!(
                "ssap-scores-file line {}: expected 9 fields, got {}: `{line}`",
                line_number + 1,
                fields.len()
            )));
        }
        let parse_usize = |s: &str| {
            s.parse::<usize>().map_err(|_| {
                Error::InvalidArgument(format!("ssap-scores-file line {}: `{s}` is not an integer: `{line}`", line_number + 1))
            })
        };
        let parse_f64 = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                Error::InvalidArgument(format!("ssap-scores-file line {}: `{s}` is not a number: `{line}`", line_number + 1))
            })
        };
        records.push(ScoreRecord {
            name_a: fields[0].to_string(),
            name_b: fields[1].to_string(),
            length_a: parse_usize(fields[2])?,
            length_b: parse_usize(fields[3])?,
            ssap_score: parse_f64(fields[4])?,
            num_aligned: parse_usize(fields[5])?,
            rmsd: parse_f64(fields[6])?,
            seq_id: parse_f64(fields[7])?,
            overlap: parse_f64(fields[8])?,
        });
    }
    Ok(records)
}

/// Write `records` in the same whitespace-separated layout `parse` reads.
pub fn write(records: &[ScoreRecord], mut out: impl Write) -> Result<(), Error> {
    for r in records {
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {}",
            r.name_a, r.name_b, r.length_a, r.length_b, r.ssap_score, r.num_aligned, r.rmsd, r.seq_id, r.overlap
        )
        .map_err(|e| Error::Runtime(format!("writing ssap-scores-file record failed: {e}")))?;
    }
    Ok(())
}

/// Every distinct structure name mentioned across `records`, in first-seen
/// order, and the all-vs-all score edges needed to seed a spanning tree
/// over those names (`(index_a, index_b, ssap_score)`).
#[must_use]
pub fn names_and_edges(records: &[ScoreRecord]) -> (Vec<String>, Vec<(usize, usize, f64)>) {
    let mut names: Vec<String> = Vec::new();
    let mut index_of = |name: &str, names: &mut Vec<String>| -> usize {
        if let Some(i) = names.iter().position(|n| n == name) {
            i
        } else {
            names.push(name.to_string());
            names.len() - 1
        }
    };
    let mut edges = Vec::with_capacity(records.len());
    for record in records {
        let a = index_of(&record.name_a, &mut names);
        let b = index_of(&record.name_b, &mut names);
        let (a, b) = (a.min(b), a.max(b));
        edges.push((a, b, record.ssap_score));
    }
    (names, edges)
}
