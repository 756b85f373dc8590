//! A single protein residue: identity, backbone geometry and the derived
//! quantities (Cβ, local frame, φ/ψ, secondary structure) the rest of the
//! alignment engines read from it.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::{construct_residue_frame, Angle, Coord, Rotation};

/// The typical Cα→Cβ offset expressed in a residue's own local frame, used to
/// predict a Cβ position for residues that don't have one (glycine, or any
/// residue missing the atom in the source structure).
///
/// Grounded on `fake_carbon_beta_coord_of_residue` in the original PDB
/// residue handling: a fixed bond length of 1.527 Å split across the frame's
/// y/z axes at the tetrahedral angle implied by `sqrt(2/3)`/`sqrt(1/3)`.
pub const GLYCINE_CB_IN_FRAME: Coord = Coord::new(0.0, -1.246_981_979_972_86, 0.881_916_137_805_65);
// -sqrt(2/3) * 1.527, sqrt(1/3) * 1.527

/// The 20 standard amino acids, plus a marker for anything else (modified
/// residues, HETATM groups standing in for a polymer position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AminoAcid {
    Ala,
    Arg,
    Asn,
    Asp,
    Cys,
    Gln,
    Glu,
    Gly,
    His,
    Ile,
    Leu,
    Lys,
    Met,
    Phe,
    Pro,
    Ser,
    Thr,
    Trp,
    Tyr,
    Val,
    /// A residue present in the structure that isn't one of the 20 standard
    /// amino acids (a modified residue, or a non-polymer HETATM record kept
    /// to preserve residue numbering).
    NonProper,
}

impl AminoAcid {
    #[must_use]
    pub const fn is_glycine(self) -> bool {
        matches!(self, Self::Gly)
    }

    #[must_use]
    pub const fn is_proper(self) -> bool {
        !matches!(self, Self::NonProper)
    }

    #[must_use]
    pub const fn one_letter_code(self) -> char {
        match self {
            Self::Ala => 'A',
            Self::Arg => 'R',
            Self::Asn => 'N',
            Self::Asp => 'D',
            Self::Cys => 'C',
            Self::Gln => 'Q',
            Self::Glu => 'E',
            Self::Gly => 'G',
            Self::His => 'H',
            Self::Ile => 'I',
            Self::Leu => 'L',
            Self::Lys => 'K',
            Self::Met => 'M',
            Self::Phe => 'F',
            Self::Pro => 'P',
            Self::Ser => 'S',
            Self::Thr => 'T',
            Self::Trp => 'W',
            Self::Tyr => 'Y',
            Self::Val => 'V',
            Self::NonProper => 'X',
        }
    }
}

/// The per-residue secondary structure class, as used to group residues into
/// [`crate::secondary_structure::Segment`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecondaryStructureClass {
    #[default]
    Coil,
    AlphaHelix,
    BetaStrand,
}

/// A residue's position within its chain: the author-assigned sequence
/// number plus any PDB insertion code, kept distinct from the residue's
/// index into [`crate::protein::Protein::residues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidueId {
    pub chain_label: char,
    pub sequence_number: isize,
    pub insertion_code: Option<char>,
}

/// A single protein residue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residue {
    pub id: ResidueId,
    pub amino_acid: AminoAcid,
    pub nitrogen: Coord,
    pub carbon_alpha: Coord,
    pub carbon: Coord,
    pub carbon_beta: Coord,
    /// `true` if `carbon_beta` was read from the structure rather than
    /// predicted via [`GLYCINE_CB_IN_FRAME`].
    pub has_real_carbon_beta: bool,
    pub frame: Rotation,
    pub secondary_structure: SecondaryStructureClass,
    pub phi: Option<Angle>,
    pub psi: Option<Angle>,
    /// Solvent accessibility, 0 (buried) to 100 (fully exposed), when known.
    pub accessibility: Option<u8>,
}

impl Residue {
    /// Build a residue from its backbone atoms and an optional observed Cβ.
    /// When `carbon_beta` is `None` (glycine, or a missing atom), the
    /// position is predicted from the residue's own local frame.
    pub fn new(
        id: ResidueId,
        amino_acid: AminoAcid,
        nitrogen: Coord,
        carbon_alpha: Coord,
        carbon: Coord,
        carbon_beta: Option<Coord>,
    ) -> Result<Self, Error> {
        let frame = construct_residue_frame(nitrogen, carbon_alpha, carbon)?;
        let has_real_carbon_beta = carbon_beta.is_some();
        let carbon_beta = carbon_beta
            .unwrap_or_else(|| carbon_alpha + frame.rotate(GLYCINE_CB_IN_FRAME));
        Ok(Self {
            id,
            amino_acid,
            nitrogen,
            carbon_alpha,
            carbon,
            carbon_beta,
            has_real_carbon_beta,
            frame,
            secondary_structure: SecondaryStructureClass::Coil,
            phi: None,
            psi: None,
            accessibility: None,
        })
    }

    /// Express `point` (given in world coordinates) in this residue's local
    /// frame. This is the "view" operation §3/§4.3 of the spec builds the
    /// per-pair context vectors from.
    #[must_use]
    pub fn view_of(&self, point: Coord) -> Coord {
        self.frame.transpose().rotate(point - self.carbon_alpha)
    }
}

/// The dihedral angle defined by four points, via the standard
/// cross-product/atan2 formulation (sign from the triple product with the
/// central bond direction).
#[must_use]
pub fn dihedral_angle(p0: Coord, p1: Coord, p2: Coord, p3: Coord) -> Angle {
    let b0 = p1 - p0;
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let n1 = b0.cross(b1);
    let n2 = b1.cross(b2);
    let m1 = n1.cross(b1.normalize_or_zero());
    let x = n1.dot(n2);
    let y = m1.dot(n2);
    Angle::from_radians(y.atan2(x))
}

/// The psi angle of `this` and the phi angle of `next`, both shifted into
/// `(0, one revolution]` per `get_psi_of_this_and_phi_of_next`.
pub fn psi_of_this_and_phi_of_next(this: &Residue, next: &Residue) -> (Angle, Angle) {
    let psi = dihedral_angle(this.nitrogen, this.carbon_alpha, this.carbon, next.nitrogen);
    let phi = dihedral_angle(this.carbon, next.nitrogen, next.carbon_alpha, next.carbon);
    (
        psi.shift(Angle::zero(), crate::geometry::EndpointLoc::UseUpper),
        phi.shift(Angle::zero(), crate::geometry::EndpointLoc::UseUpper),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_residue(ca: Coord) -> Residue {
        Residue::new(
            ResidueId {
                chain_label: 'A',
                sequence_number: 1,
                insertion_code: None,
            },
            AminoAcid::Gly,
            ca + Coord::new(-0.5, 1.3, 0.0),
            ca,
            ca + Coord::new(1.5, 0.0, 0.0),
            None,
        )
        .unwrap()
    }

    #[test]
    fn glycine_cb_is_predicted_at_the_typical_bond_length() {
        let residue = sample_residue(Coord::ZERO);
        let bond_length = (residue.carbon_beta - residue.carbon_alpha).length();
        assert!((bond_length - 1.527).abs() < 1e-9);
        assert!(!residue.has_real_carbon_beta);
    }

    #[test]
    fn observed_carbon_beta_is_kept_as_is() {
        let id = ResidueId {
            chain_label: 'A',
            sequence_number: 1,
            insertion_code: None,
        };
        let ca = Coord::ZERO;
        let observed_cb = ca + Coord::new(0.0, -1.0, 1.0);
        let residue = Residue::new(
            id,
            AminoAcid::Ala,
            ca + Coord::new(-0.5, 1.3, 0.0),
            ca,
            ca + Coord::new(1.5, 0.0, 0.0),
            Some(observed_cb),
        )
        .unwrap();
        assert_eq!(residue.carbon_beta, observed_cb);
        assert!(residue.has_real_carbon_beta);
    }

    #[test]
    fn view_of_own_carbon_alpha_is_origin() {
        let residue = sample_residue(Coord::new(3.0, -2.0, 1.0));
        let view = residue.view_of(residue.carbon_alpha);
        assert!(view.length() < 1e-9);
    }
}
