//! External I/O adapters: text formats this crate reads and writes, but
//! never touches a filesystem or network for — callers own actual file
//! access and pass `&str`/`impl std::io::Write`.

pub mod cath_legacy;
pub mod fasta;
pub mod ssap_scores_file;

/// A chain/residue-range restriction a host can apply when asking its own
/// parser for a subset of a structure (`spec.md` §6's "optional region
/// filter"). This crate does not parse structures itself — `RegionFilter`
/// exists only as a typed description hosts can build, pass to their own
/// PDB/mmCIF reader, and serialise alongside a run's configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionFilter {
    pub chain_label: char,
    pub start_residue_id: Option<crate::residue::ResidueId>,
    pub stop_residue_id: Option<crate::residue::ResidueId>,
}

impl RegionFilter {
    #[must_use]
    pub const fn whole_chain(chain_label: char) -> Self {
        Self {
            chain_label,
            start_residue_id: None,
            stop_residue_id: None,
        }
    }
}
