//! Unit-quaternion rotations.
//!
//! Grounded on `quat_rot.hpp` in the original C++ implementation: a unit
//! quaternion representing a rotation, round-tripped to/from [`Rotation`]
//! using the same branch-on-largest-component construction (`w`/`x`/`y`/`z`
//! each built from a `sqrt(max(0, 1 ± trace terms))`, signed via the
//! off-diagonal differences) to stay numerically stable near all rotation
//! angles, not just small ones.

use glam::{DMat3, DQuat};
use rand::Rng;

use super::angle::Angle;
use super::rotation::Rotation;

/// A unit quaternion representing a rotation. Always kept normalised: every
/// operation that can introduce drift (composition, interpolation) calls
/// `normalize` before returning.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuatRot(DQuat);

impl QuatRot {
    #[must_use]
    pub const fn identity() -> Self {
        Self(DQuat::IDENTITY)
    }

    /// Build from raw (w, x, y, z) components, normalising them.
    #[must_use]
    pub fn from_wxyz(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self(DQuat::from_xyzw(x, y, z, w).normalize())
    }

    /// The quaternion representing the same rotation as `rotation`.
    ///
    /// Uses Shepperd's method (largest-diagonal-term branch implicit in the
    /// `max(0, ...)` clamps), matching `make_quat_rot_from_rotation`.
    #[must_use]
    pub fn from_rotation(rotation: &Rotation) -> Self {
        let m = rotation.matrix();
        let [[xx, xy, xz], [yx, yy, yz], [zx, zy, zz]] = m.to_cols_array_2d();
        // glam stores columns, so `m.to_cols_array_2d()[col][row]`; read the
        // (row, col) entries the formula expects directly off that.
        let q_xx = xx;
        let q_xy = yx;
        let q_xz = zx;
        let q_yx = xy;
        let q_yy = yy;
        let q_yz = zy;
        let q_zx = xz;
        let q_zy = yz;
        let q_zz = zz;

        let w = 0.5 * (1.0_f64 + q_xx + q_yy + q_zz).max(0.0).sqrt();
        let x = (0.5 * (1.0_f64 + q_xx - q_yy - q_zz).max(0.0).sqrt()).copysign(q_zy - q_yz);
        let y = (0.5 * (1.0_f64 - q_xx + q_yy - q_zz).max(0.0).sqrt()).copysign(q_xz - q_zx);
        let z = (0.5 * (1.0_f64 - q_xx - q_yy + q_zz).max(0.0).sqrt()).copysign(q_yx - q_xy);
        // Canonicalise to a non-negative scalar part: `q` and `-q` represent
        // the same rotation, so picking `w >= 0` gives a unique result.
        if w < 0.0 {
            Self::from_wxyz(-w, -x, -y, -z)
        } else {
            Self::from_wxyz(w, x, y, z)
        }
    }

    /// The rotation matrix this quaternion represents.
    #[must_use]
    pub fn to_rotation(&self) -> Rotation {
        let q = self.0;
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let two = 2.0_f64;
        let m = DMat3::from_cols_array(&[
            1.0 - two * y * y - two * z * z,
            two * (x * y + z * w),
            two * (x * z - y * w),
            two * (x * y - z * w),
            1.0 - two * x * x - two * z * z,
            two * (y * z + x * w),
            two * (x * z + y * w),
            two * (y * z - x * w),
            1.0 - two * x * x - two * y * y,
        ]);
        Rotation::from_orthonormal_unchecked(m)
    }

    /// Compose two rotations: `self.compose(other)` applies `other` first.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self((self.0 * other.0).normalize())
    }

    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self(self.0.conjugate())
    }

    /// Dot product of the underlying 4-vectors.
    #[must_use]
    pub fn inner_product(&self, other: &Self) -> f64 {
        self.0.dot(other.0)
    }

    /// A metric on rotations: `0` for identical rotations (up to the
    /// quaternion double-cover, `q` and `-q` represent the same rotation so
    /// the absolute value of the inner product is used), up to `1` for a
    /// half-turn apart.
    #[must_use]
    pub fn distance_1(&self, other: &Self) -> f64 {
        1.0 - self.inner_product(other).abs()
    }

    /// Spherical linear interpolation toward `other` by `fraction` (`0.0` is
    /// `self`, `1.0` is `other`).
    #[must_use]
    pub fn interpolate(&self, other: &Self, fraction: f64) -> Self {
        Self(self.0.slerp(other.0, fraction).normalize())
    }

    /// The midpoint rotation, half way along the shortest arc between the two.
    #[must_use]
    pub fn mid_point(&self, other: &Self) -> Self {
        self.interpolate(other, 0.5)
    }

    /// The rotation angle between `self` and `other`, in `[0, pi]`.
    #[must_use]
    pub fn angle(&self, other: &Self) -> Angle {
        Angle::from_radians(2.0 * self.inner_product(other).abs().clamp(-1.0, 1.0).acos())
    }

    /// The quaternion reached by rotating `theta` of the way from `self`
    /// toward `other`, along the same geodesic `interpolate` walks.
    ///
    /// Fails with `InvalidArgument` when `theta` exceeds the angle between
    /// the two endpoints; returns `self` unchanged when that angle is zero.
    pub fn from_first_toward_second_at_angle(
        &self,
        other: &Self,
        theta: Angle,
    ) -> Result<Self, crate::error::Error> {
        let max = self.angle(other);
        if theta.radians() > max.radians() + 1e-9 {
            return Err(crate::error::Error::InvalidArgument(format!(
                "requested angle {:.6} exceeds the angle between the endpoints {:.6}",
                theta.degrees(),
                max.degrees()
            )));
        }
        if max.radians() < 1e-12 {
            return Ok(*self);
        }
        Ok(self.interpolate(other, theta.radians() / max.radians()))
    }

    /// A uniformly-random unit quaternion: four reals drawn uniformly from
    /// `[-1, 1]`, renormalised, with the (probability-zero but
    /// floating-point-reachable) all-zero draw rejected by recursing.
    #[must_use]
    pub fn random(rng: &mut impl Rng) -> Self {
        let w = rng.random_range(-1.0..=1.0);
        let x = rng.random_range(-1.0..=1.0);
        let y = rng.random_range(-1.0..=1.0);
        let z = rng.random_range(-1.0..=1.0);
        let norm_sq = w * w + x * x + y * y + z * z;
        if norm_sq < 1e-12 {
            return Self::random(rng);
        }
        Self::from_wxyz(w, x, y, z)
    }
}
