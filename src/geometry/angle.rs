//! Angles with wrap-into-a-revolution semantics.
//!
//! `uom`'s `si::f64::Angle` already gives unit-tagged radian/degree/revolution
//! construction and arithmetic; what it does not give is the "shift into one
//! revolution starting at a reference point" operation the original geometry
//! layer needs for psi/phi and view-vector angles (`shift_copy` plus
//! `angle_endpoint_loc`, grounded on `angle_test.cpp`).

use uom::si::angle::{degree, radian, revolution};
use uom::si::f64::Angle as UomAngle;

/// Where the boundary of a wrapped revolution should fall when the input is
/// already exactly on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointLoc {
    /// Prefer the lower bound of the interval (`reference`).
    UseLower,
    /// Prefer the upper bound of the interval (`reference + one revolution`).
    UseUpper,
    /// Keep whichever bound the value naturally falls on: an input that was
    /// exactly `reference` stays at the lower bound; an input that was
    /// exactly `reference` plus a nonzero whole number of revolutions stays
    /// at the upper bound.
    Either,
}

/// An angle, keeping the same wrap-aware behaviour the geometry layer needs
/// on top of `uom`'s dimensional-analysis guarantees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Angle(#[serde(with = "angle_serde")] UomAngle);

mod angle_serde {
    use super::UomAngle;
    use serde::Deserialize;
    use uom::si::angle::radian;

    pub fn serialize<S: serde::Serializer>(a: &UomAngle, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(a.get::<radian>())
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<UomAngle, D::Error> {
        let radians = f64::deserialize(d)?;
        Ok(UomAngle::new::<radian>(radians))
    }
}

impl Angle {
    #[must_use]
    pub fn from_radians(value: f64) -> Self {
        Self(UomAngle::new::<radian>(value))
    }

    #[must_use]
    pub fn from_degrees(value: f64) -> Self {
        Self(UomAngle::new::<degree>(value))
    }

    #[must_use]
    pub fn from_revolutions(value: f64) -> Self {
        Self(UomAngle::new::<revolution>(value))
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::from_radians(0.0)
    }

    #[must_use]
    pub fn one_revolution() -> Self {
        Self::from_revolutions(1.0)
    }

    #[must_use]
    pub fn radians(&self) -> f64 {
        self.0.get::<radian>()
    }

    #[must_use]
    pub fn degrees(&self) -> f64 {
        self.0.get::<degree>()
    }

    /// Shift `self` into the half-open-ish revolution starting at `reference`,
    /// per `endpoint` when `self` lies exactly on the boundary.
    #[must_use]
    pub fn shift(&self, reference: Self, endpoint: EndpointLoc) -> Self {
        let one_rev = Self::one_revolution().radians();
        let diff = self.radians() - reference.radians();
        let mut wrapped = diff.rem_euclid(one_rev);
        if wrapped == 0.0 && diff != 0.0 {
            wrapped = one_rev;
        }
        let wrapped = match endpoint {
            EndpointLoc::UseLower => {
                if wrapped == one_rev {
                    0.0
                } else {
                    wrapped
                }
            }
            EndpointLoc::UseUpper => {
                if wrapped == 0.0 {
                    one_rev
                } else {
                    wrapped
                }
            }
            EndpointLoc::Either => wrapped,
        };
        Self::from_radians(reference.radians() + wrapped)
    }

    /// Shift into `[0, one revolution)` using [`EndpointLoc::Either`], the
    /// common case for normalising a raw dihedral/view angle.
    #[must_use]
    pub fn shift_into_positive_revolution(&self) -> Self {
        self.shift(Self::zero(), EndpointLoc::Either)
    }

    /// The smaller of the two angular differences between `self` and `other`
    /// going around the circle either way, always in `[0, half a revolution]`.
    #[must_use]
    pub fn wrapped_difference(&self, other: Self) -> Self {
        let one_rev = Self::one_revolution().radians();
        let half_rev = one_rev / 2.0;
        let raw = (self.radians() - other.radians()).rem_euclid(one_rev);
        Self::from_radians(if raw > half_rev { one_rev - raw } else { raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Angle, b: Angle) -> bool {
        (a.radians() - b.radians()).abs() < 1e-9
    }

    #[test]
    fn shift_zero_cases_match_reference_semantics() {
        let zero = Angle::zero();
        assert!(approx(zero.shift(zero, EndpointLoc::UseLower), zero));
        assert!(approx(zero.shift(zero, EndpointLoc::UseUpper), Angle::one_revolution()));
        assert!(approx(zero.shift(zero, EndpointLoc::Either), zero));
    }

    #[test]
    fn shift_one_revolution_cases_match_reference_semantics() {
        let one_rev = Angle::one_revolution();
        let zero = Angle::zero();
        assert!(approx(one_rev.shift(zero, EndpointLoc::UseLower), zero));
        assert!(approx(one_rev.shift(zero, EndpointLoc::UseUpper), one_rev));
        assert!(approx(one_rev.shift(zero, EndpointLoc::Either), one_rev));
    }

    #[test]
    fn shift_handles_values_outside_one_revolution() {
        let zero = Angle::zero();
        let half = Angle::from_revolutions(0.5);
        assert!(approx(
            Angle::from_revolutions(-0.5).shift(zero, EndpointLoc::Either),
            half
        ));
        assert!(approx(
            Angle::from_revolutions(1.5).shift(zero, EndpointLoc::Either),
            half
        ));
    }

    #[test]
    fn wrapped_difference_is_symmetric_and_bounded() {
        let a = Angle::from_degrees(359.0);
        let b = Angle::from_degrees(1.0);
        let d = a.wrapped_difference(b);
        assert!((d.degrees() - 2.0).abs() < 1e-6);
    }
}
