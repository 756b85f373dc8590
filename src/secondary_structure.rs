//! Secondary-structure segments: a contiguous run of same-class residues,
//! reduced to an axis (a start point, a direction and a length) so the
//! pairwise aligner can score how two segments' axes sit relative to each
//! other without re-deriving it from every residue pair.

use crate::error::Error;
use crate::geometry::Coord;
use crate::residue::{Residue, SecondaryStructureClass};

/// A secondary-structure segment: an inclusive range of residue indices
/// within a [`crate::protein::Protein`], reduced to a best-fit axis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    pub class: SecondaryStructureClass,
    pub start: usize,
    pub end: usize,
    /// The "prosec axis point": a blend of the segment's Cα positions
    /// weighted toward the centre, used as the axis's reference point.
    pub axis_point: Coord,
    /// The unit direction of the best-fit line through the segment's Cα
    /// positions, oriented from `start` toward `end`.
    pub axis_direction: Coord,
}

impl Segment {
    /// Build a segment's axis from the Cα positions of `residues[start..=end]`.
    ///
    /// The axis point is a weight-by-closeness-to-the-centre blend of the Cα
    /// positions (residues near the middle of the segment count for more,
    /// matching the "prosec axis point" construction that damps end-of-helix
    /// fraying), and the direction is the first principal axis of the
    /// (mean-centred) Cα positions, found via the power iteration on the
    /// 3x3 covariance matrix rather than pulling in a full SVD dependency.
    pub fn fit(
        class: SecondaryStructureClass,
        residues: &[Residue],
        start: usize,
        end: usize,
    ) -> Result<Self, Error> {
        if start > end || end >= residues.len() {
            return Err(Error::InvalidArgument(format!(
                "segment range {start}..={end} is invalid for {} residues",
                residues.len()
            )));
        }
        let points: Vec<Coord> = residues[start..=end].iter().map(|r| r.carbon_alpha).collect();
        let n = points.len();
        let centre = points.iter().copied().fold(Coord::ZERO, |a, b| a + b) / n as f64;

        let mid = (n - 1) as f64 / 2.0;
        let mut weighted_sum = Coord::ZERO;
        let mut weight_total = 0.0;
        for (i, &p) in points.iter().enumerate() {
            let distance_from_mid = (i as f64 - mid).abs();
            let weight = 1.0 / (1.0 + distance_from_mid);
            weighted_sum += p * weight;
            weight_total += weight;
        }
        let axis_point = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            centre
        };

        let axis_direction = best_fit_direction(&points, centre, points[n - 1] - points[0])?;

        Ok(Self {
            class,
            start,
            end,
            axis_point,
            axis_direction,
        })
    }

    #[must_use]
    pub const fn length(&self) -> usize {
        self.end - self.start + 1
    }

    /// The planar angle between this segment's axis and `other`'s, in
    /// `[0, half a revolution]`.
    #[must_use]
    pub fn angle_to(&self, other: &Self) -> crate::geometry::Angle {
        let cos_theta = self
            .axis_direction
            .dot(other.axis_direction)
            .clamp(-1.0, 1.0);
        crate::geometry::Angle::from_radians(cos_theta.acos())
    }
}

/// Find the dominant direction of `points` around `centre` via power
/// iteration on the covariance matrix, seeded with `initial_guess` so the
/// (otherwise sign-ambiguous) result comes out oriented consistently with
/// the segment's start-to-end direction.
fn best_fit_direction(points: &[Coord], centre: Coord, initial_guess: Coord) -> Result<Coord, Error> {
    let mut cov = glam::DMat3::ZERO;
    for &p in points {
        let d = p - centre;
        cov += glam::DMat3::from_cols(d * d.x, d * d.y, d * d.z);
    }
    let mut v = initial_guess.try_normalize().unwrap_or(Coord::X);
    for _ in 0..32 {
        let next = cov * v;
        let Some(normalised) = next.try_normalize() else {
            break;
        };
        v = normalised;
    }
    if v.dot(initial_guess) < 0.0 {
        v = -v;
    }
    crate::geometry::normalize_checked(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::residue::{AminoAcid, ResidueId};

    fn straight_residue(i: usize) -> Residue {
        let ca = Coord::new(i as f64 * 1.5, 0.0, 0.0);
        Residue::new(
            ResidueId {
                chain_label: 'A',
                sequence_number: i as isize,
                insertion_code: None,
            },
            AminoAcid::Ala,
            ca + Coord::new(-0.5, 1.3, 0.0),
            ca,
            ca + Coord::new(1.5, 0.0, 0.1 * i as f64),
            None,
        )
        .unwrap()
    }

    #[test]
    fn axis_direction_follows_a_straight_run_of_residues() {
        let residues: Vec<_> = (0..6).map(straight_residue).collect();
        let segment = Segment::fit(SecondaryStructureClass::AlphaHelix, &residues, 0, 5).unwrap();
        assert!(segment.axis_direction.x > 0.99);
        assert_eq!(segment.length(), 6);
    }

    #[test]
    fn rejects_an_out_of_range_segment() {
        let residues: Vec<_> = (0..3).map(straight_residue).collect();
        assert!(Segment::fit(SecondaryStructureClass::Coil, &residues, 0, 5).is_err());
    }
}
