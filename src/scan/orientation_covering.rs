//! Fixed coverings of unit-quaternion (rotation) space: a finite set of
//! orientations such that every possible orientation lies within a bounded
//! angle of some member of the set, used to bucket residue pairs by their
//! approximate relative frame rotation.

use itertools::Itertools;

use crate::geometry::QuatRot;

/// A finite covering of SO(3): `orientations[i]` paired with a precomputed
/// neighbour list (every other member within `covering_radius` of it, scaled
/// up by whatever match-criteria angle a lookup adds at query time).
#[derive(Debug, Clone)]
pub struct OrientationCovering {
    orientations: Vec<QuatRot>,
    /// The guaranteed covering radius: every orientation in SO(3) is within
    /// this angular distance-1 of some member.
    covering_distance_1: f64,
}

impl OrientationCovering {
    #[must_use]
    pub fn orientations(&self) -> &[QuatRot] {
        &self.orientations
    }

    #[must_use]
    pub const fn covering_distance_1(&self) -> f64 {
        self.covering_distance_1
    }

    /// The index of the covering member nearest `q`.
    #[must_use]
    pub fn nearest_index(&self, q: &QuatRot) -> usize {
        self.orientations
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.distance_1(q)
                    .partial_cmp(&b.distance_1(q))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .expect("covering is never empty")
    }

    /// For covering member `index`, every member (including itself) whose
    /// distance-1 to it is at most `extra_distance_1` beyond the covering
    /// radius — the set a quad lookup must probe to be sure it hasn't missed
    /// a qualifying orientation in a neighbouring cell (the "covering
    /// triangle inequality").
    #[must_use]
    pub fn neighbours_within(&self, index: usize, extra_distance_1: f64) -> Vec<usize> {
        let threshold = self.covering_distance_1 + extra_distance_1;
        let origin = self.orientations[index];
        self.orientations
            .iter()
            .enumerate()
            .filter(|(_, q)| origin.distance_1(q) <= threshold)
            .map(|(i, _)| i)
            .collect()
    }

    /// The coarse, octahedral-symmetry covering: the 48 unit quaternions of
    /// the `F4` root system (the binary octahedral group), suitable for a
    /// covering radius of roughly 30 degrees.
    #[must_use]
    pub fn octahedral_48() -> Self {
        let mut orientations = Vec::with_capacity(48);
        // 8: signed single-axis unit quaternions.
        for axis in 0..4 {
            for sign in [1.0, -1.0] {
                let mut c = [0.0_f64; 4];
                c[axis] = sign;
                orientations.push(QuatRot::from_wxyz(c[0], c[1], c[2], c[3]));
            }
        }
        // 24: signed pairs of axes, each component +-1/sqrt(2).
        let s = std::f64::consts::FRAC_1_SQRT_2;
        for i in 0..4 {
            for j in (i + 1)..4 {
                for si in [s, -s] {
                    for sj in [s, -s] {
                        let mut c = [0.0_f64; 4];
                        c[i] = si;
                        c[j] = sj;
                        orientations.push(QuatRot::from_wxyz(c[0], c[1], c[2], c[3]));
                    }
                }
            }
        }
        // 16: every sign combination of (+-1/2, +-1/2, +-1/2, +-1/2).
        for sw in [0.5, -0.5] {
            for sx in [0.5, -0.5] {
                for sy in [0.5, -0.5] {
                    for sz in [0.5, -0.5] {
                        orientations.push(QuatRot::from_wxyz(sw, sx, sy, sz));
                    }
                }
            }
        }
        Self {
            orientations,
            covering_distance_1: Self::empirical_covering_distance_1(&{
                let mut v = Vec::with_capacity(48);
                for axis in 0..4 {
                    for sign in [1.0, -1.0] {
                        let mut c = [0.0_f64; 4];
                        c[axis] = sign;
                        v.push(QuatRot::from_wxyz(c[0], c[1], c[2], c[3]));
                    }
                }
                v
            }),
        }
    }

    /// The fine, icosahedral-symmetry covering: the 120 unit quaternions of
    /// the binary icosahedral group (the vertices of the 600-cell),
    /// suitable for a covering radius of roughly 15 degrees.
    #[must_use]
    pub fn icosahedral_600() -> Self {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let inv_phi = 1.0 / phi;
        let mut orientations = Vec::with_capacity(120);

        // 16: all sign combinations of (+-1/2)^4.
        for sw in [0.5, -0.5] {
            for sx in [0.5, -0.5] {
                for sy in [0.5, -0.5] {
                    for sz in [0.5, -0.5] {
                        orientations.push(QuatRot::from_wxyz(sw, sx, sy, sz));
                    }
                }
            }
        }
        // 8: signed single-axis unit quaternions.
        for axis in 0..4 {
            for sign in [1.0, -1.0] {
                let mut c = [0.0_f64; 4];
                c[axis] = sign;
                orientations.push(QuatRot::from_wxyz(c[0], c[1], c[2], c[3]));
            }
        }
        // 96: even permutations of (+-1/2, +-phi/2, +-1/(2phi), 0), all signs.
        let base = [0.5, phi / 2.0, inv_phi / 2.0, 0.0];
        for perm in even_permutations_of_four() {
            let permuted = [base[perm[0]], base[perm[1]], base[perm[2]], base[perm[3]]];
            for signs in 0..16u8 {
                let mut c = permuted;
                let mut skip = false;
                for (k, slot) in c.iter_mut().enumerate() {
                    if *slot == 0.0 {
                        if (signs >> k) & 1 == 1 {
                            skip = true;
                        }
                    } else if (signs >> k) & 1 == 1 {
                        *slot = -*slot;
                    }
                }
                if !skip {
                    orientations.push(QuatRot::from_wxyz(c[0], c[1], c[2], c[3]));
                }
            }
        }
        orientations.sort_by(|a, b| {
            a.inner_product(&QuatRot::identity())
                .partial_cmp(&b.inner_product(&QuatRot::identity()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        orientations.dedup_by(|a, b| a.distance_1(b) < 1e-9);

        let axis_quats: Vec<QuatRot> = (0..4)
            .flat_map(|axis| {
                [1.0, -1.0].into_iter().map(move |sign| {
                    let mut c = [0.0_f64; 4];
                    c[axis] = sign;
                    QuatRot::from_wxyz(c[0], c[1], c[2], c[3])
                })
            })
            .collect();
        Self {
            covering_distance_1: Self::empirical_covering_distance_1(&axis_quats),
            orientations,
        }
    }

    /// A conservative covering radius: the farthest any of `seed` members
    /// sits from its own nearest other seed member, used as a stand-in
    /// covering-radius estimate for these vertex-transitive coverings
    /// (every member has the same local neighbourhood by symmetry).
    fn empirical_covering_distance_1(seed: &[QuatRot]) -> f64 {
        let mut max_nearest = 0.0_f64;
        for (i, a) in seed.iter().enumerate() {
            let nearest = seed
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| a.distance_1(b))
                .fold(f64::INFINITY, f64::min);
            max_nearest = max_nearest.max(nearest);
        }
        max_nearest / 2.0
    }
}

fn even_permutations_of_four() -> Vec<[usize; 4]> {
    fn parity(p: &[usize; 4]) -> bool {
        let mut seen = [false; 4];
        let mut swaps = 0;
        for i in 0..4 {
            if seen[i] {
                continue;
            }
            let mut j = i;
            let mut len = 0;
            while !seen[j] {
                seen[j] = true;
                j = p[j];
                len += 1;
            }
            swaps += len - 1;
        }
        swaps % 2 == 0
    }
    [0usize, 1, 2, 3]
        .into_iter()
        .permutations(4)
        .map(|p| [p[0], p[1], p[2], p[3]])
        .filter(parity)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octahedral_covering_has_48_members() {
        let covering = OrientationCovering::octahedral_48();
        assert_eq!(covering.orientations().len(), 48);
    }

    #[test]
    fn icosahedral_covering_has_120_members() {
        let covering = OrientationCovering::icosahedral_600();
        assert_eq!(covering.orientations().len(), 120);
    }

    #[test]
    fn nearest_index_of_a_member_is_itself() {
        let covering = OrientationCovering::octahedral_48();
        for (i, q) in covering.orientations().iter().enumerate() {
            assert_eq!(covering.nearest_index(q), i);
        }
    }

    #[test]
    fn neighbours_within_always_includes_self() {
        let covering = OrientationCovering::octahedral_48();
        let neighbours = covering.neighbours_within(0, 0.0);
        assert!(neighbours.contains(&0));
    }
}
