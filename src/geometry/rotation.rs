//! Rigid rotation matrices.

use glam::DMat3;

use super::coord::{normalize_checked, Coord};
use crate::error::Error;

const ORTHONORMALITY_TOLERANCE: f64 = 1e-6;

/// A rotation matrix: orthonormal, determinant +1.
///
/// Constructing one from three arbitrary basis vectors (`new`) checks both
/// properties; `from_orthonormal_unchecked` skips the check for call sites
/// that have already built an orthonormal basis by construction (e.g. a
/// Gram-Schmidt frame, or a matrix recovered from a [`super::quat_rot::QuatRot`]).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rotation(DMat3);

impl Rotation {
    /// Build a rotation from its three columns, checking orthonormality and
    /// that the determinant is +1 (not a reflection).
    pub fn new(x_axis: Coord, y_axis: Coord, z_axis: Coord) -> Result<Self, Error> {
        let m = DMat3::from_cols(x_axis, y_axis, z_axis);
        Self::from_orthonormal(m)
    }

    fn from_orthonormal(m: DMat3) -> Result<Self, Error> {
        let should_be_identity = m.transpose() * m;
        let deviation = (should_be_identity - DMat3::IDENTITY)
            .to_cols_array()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if deviation > ORTHONORMALITY_TOLERANCE {
            return Err(Error::InvalidArgument(format!(
                "columns are not orthonormal (max deviation {deviation})"
            )));
        }
        if (m.determinant() - 1.0).abs() > ORTHONORMALITY_TOLERANCE {
            return Err(Error::InvalidArgument(
                "basis has determinant -1 (reflection, not a rotation)".into(),
            ));
        }
        Ok(Self(m))
    }

    /// Wrap an already-orthonormal matrix without re-checking the invariant.
    /// Only call this when the caller has just built `m` from an orthonormal
    /// construction (e.g. [`construct_residue_frame`]).
    #[must_use]
    pub const fn from_orthonormal_unchecked(m: DMat3) -> Self {
        Self(m)
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self(DMat3::IDENTITY)
    }

    #[must_use]
    pub fn matrix(&self) -> DMat3 {
        self.0
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Rotate a point/vector by this rotation.
    #[must_use]
    pub fn rotate(&self, v: Coord) -> Coord {
        self.0 * v
    }

    /// Compose two rotations: `self.compose(other)` applies `other` first.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self(self.0 * other.0)
    }
}

/// Build the local backbone frame of a residue from its N, Cα and C atoms.
///
/// Origin at Cα; x-axis along Cα→C; y-axis completes the N-Cα-C plane (via
/// Gram-Schmidt against the Cα→N direction); z-axis is `x × y`. This mirrors
/// the frame construction used to rotate a residue's neighbours into its own
/// local view (`construct_residue_frame` in the cath-tools geometry layer)
/// and is also the frame the glycine Cβ placement vector in
/// [`crate::residue::GLYCINE_CB_IN_FRAME`] is expressed in.
pub fn construct_residue_frame(n: Coord, ca: Coord, c: Coord) -> Result<Rotation, Error> {
    Ok(rotation_to_x_axis_and_xy_plane(c - ca, n - ca)?.transpose())
}

/// The unique proper rotation that sends `a` onto the `+x` axis and places
/// `b` in the `x`-`y` half-plane with non-negative `y`.
///
/// [`construct_residue_frame`] is this primitive applied to a residue's
/// `C - Cα` and `N - Cα` vectors and transposed back into a local-to-world
/// transform; this function itself returns the world-to-local sense.
pub fn rotation_to_x_axis_and_xy_plane(a: Coord, b: Coord) -> Result<Rotation, Error> {
    let x_axis = normalize_checked(a)?;
    let b_perp = b - x_axis * b.dot(x_axis);
    let y_axis = normalize_checked(b_perp)?;
    let z_axis = x_axis.cross(y_axis);
    let local_to_world = Rotation::from_orthonormal(DMat3::from_cols(x_axis, y_axis, z_axis))?;
    Ok(local_to_world.transpose())
}

/// The unsigned angle between two rotations, in `[0, pi]`, via the trace of
/// their relative rotation: `acos((tr(R1^T R2) - 1) / 2)`.
#[must_use]
pub fn angle_between_rotations(a: &Rotation, b: &Rotation) -> crate::geometry::Angle {
    let relative = a.transpose().compose(b);
    let trace = relative.matrix().to_cols_array()[0]
        + relative.matrix().to_cols_array()[4]
        + relative.matrix().to_cols_array()[8];
    let cos_theta = ((trace - 1.0) / 2.0).clamp(-1.0, 1.0);
    crate::geometry::Angle::from_radians(cos_theta.acos())
}
