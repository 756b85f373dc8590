//! `MatchCriteria`: the configuration that decides which residue-pair quads
//! the scan index (and the naive reference scan) accept as candidate
//! structural equivalences.

use crate::error::Error;
use crate::geometry::Angle;

/// Filters applied when comparing a residue pair in one structure against a
/// residue pair in another.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchCriteria {
    pub maximum_squared_view_distance: f64,
    pub minimum_sequence_separation: usize,
    pub require_matching_sequence_direction: bool,
    pub maximum_frame_rotation_angle: Angle,
    pub maximum_from_phi_difference: Angle,
    pub maximum_to_phi_difference: Angle,
    pub maximum_from_psi_difference: Angle,
    pub maximum_to_psi_difference: Angle,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            maximum_squared_view_distance: crate::scoring::RESIDUE_MAX_DIST_SQ_CUTOFF,
            minimum_sequence_separation: 5,
            require_matching_sequence_direction: false,
            maximum_frame_rotation_angle: Angle::from_degrees(30.0),
            maximum_from_phi_difference: Angle::from_degrees(60.0),
            maximum_to_phi_difference: Angle::from_degrees(60.0),
            maximum_from_psi_difference: Angle::from_degrees(60.0),
            maximum_to_psi_difference: Angle::from_degrees(60.0),
        }
    }
}

impl MatchCriteria {
    /// Parse a `key_co=value(,key_co=value)*` string into a `MatchCriteria`,
    /// starting from [`MatchCriteria::default`] and overriding whichever
    /// keys are present.
    ///
    /// Keys: `dist` (Å, squared for storage), `dirn` (`0`/`1`), `index_dist`
    /// (a negative integer; `|value|` becomes the minimum sequence
    /// separation), `frame_ang`/`phi_ang`/`psi_ang` (degrees; `phi_ang` and
    /// `psi_ang` set both the "from" and "to" bound). Unknown keys fail with
    /// `InvalidArgument`, matching `spec.md` §6.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut criteria = Self::default();
        let stripped: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if stripped.is_empty() {
            return Ok(criteria);
        }
        for entry in stripped.split(',') {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                Error::InvalidArgument(format!("match-criteria entry `{entry}` is missing `=`"))
            })?;
            let key = key.strip_suffix("_co").unwrap_or(key);
            let parsed_number: f64 = value.parse().map_err(|_| {
                Error::InvalidArgument(format!("match-criteria value `{value}` is not numeric"))
            })?;
            match key {
                "dist" => criteria.maximum_squared_view_distance = parsed_number * parsed_number,
                "dirn" => {
                    criteria.require_matching_sequence_direction = match parsed_number as i64 {
                        0 => false,
                        1 => true,
                        _ => {
                            return Err(Error::InvalidArgument(format!(
                                "dirn must be 0 or 1, got `{value}`"
                            )))
                        }
                    }
                }
                "index_dist" => {
                    if parsed_number > 0.0 {
                        return Err(Error::InvalidArgument(
                            "index_dist must be a negative integer".into(),
                        ));
                    }
                    criteria.minimum_sequence_separation = (-parsed_number) as usize;
                }
                "frame_ang" => {
                    criteria.maximum_frame_rotation_angle = Angle::from_degrees(parsed_number);
                }
                "phi_ang" => {
                    let angle = Angle::from_degrees(parsed_number);
                    criteria.maximum_from_phi_difference = angle;
                    criteria.maximum_to_phi_difference = angle;
                }
                "psi_ang" => {
                    let angle = Angle::from_degrees(parsed_number);
                    criteria.maximum_from_psi_difference = angle;
                    criteria.maximum_to_psi_difference = angle;
                }
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unrecognised match-criteria key `{other}`"
                    )))
                }
            }
        }
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_criteria_string() {
        let criteria =
            MatchCriteria::parse("dist_co=5,dirn_co=1,index_dist_co=-8,frame_ang_co=20,phi_ang_co=45,psi_ang_co=30")
                .unwrap();
        assert!((criteria.maximum_squared_view_distance - 25.0).abs() < 1e-9);
        assert!(criteria.require_matching_sequence_direction);
        assert_eq!(criteria.minimum_sequence_separation, 8);
        assert!((criteria.maximum_frame_rotation_angle.degrees() - 20.0).abs() < 1e-9);
        assert!((criteria.maximum_from_phi_difference.degrees() - 45.0).abs() < 1e-9);
        assert!((criteria.maximum_to_psi_difference.degrees() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(MatchCriteria::parse("bogus=1").is_err());
    }

    #[test]
    fn positive_index_dist_is_rejected() {
        assert!(MatchCriteria::parse("index_dist=8").is_err());
    }

    #[test]
    fn empty_string_yields_defaults() {
        let criteria = MatchCriteria::parse("  ").unwrap();
        assert_eq!(criteria, MatchCriteria::default());
    }
}
