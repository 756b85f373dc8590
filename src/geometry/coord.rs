//! Cartesian coordinates in 3-space.

use glam::DVec3;

use crate::error::Error;

/// A point or free vector in 3-space.
///
/// This is a plain alias over [`glam::DVec3`]: all the arithmetic the rest of
/// this crate needs (`+`, `-`, scalar `*`, `dot`, `cross`, `length`) already
/// comes from `glam`, so there is no reason to wrap it behind a newtype.
pub type Coord = DVec3;

/// The squared distance between two points, avoiding the `sqrt` when only
/// relative ordering or a cutoff comparison is needed.
#[must_use]
pub fn distance_squared(a: Coord, b: Coord) -> f64 {
    (a - b).length_squared()
}

/// The distance between two points.
#[must_use]
pub fn distance(a: Coord, b: Coord) -> f64 {
    (a - b).length()
}

/// Normalise `v`, returning an error rather than `NaN`/zero-vector garbage
/// when `v` is (numerically) the zero vector.
///
/// `glam::DVec3::try_normalize` already reports this case as `None`; this
/// wraps it in the crate's own error type so callers can propagate it with
/// `?` alongside every other fallible geometry operation.
pub fn normalize_checked(v: Coord) -> Result<Coord, Error> {
    v.try_normalize()
        .ok_or_else(|| Error::InvalidArgument("cannot normalize a zero-length vector".into()))
}
